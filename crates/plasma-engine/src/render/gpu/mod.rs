//! wgpu implementation of [`DrawBackend`](super::DrawBackend).
//!
//! [`BatchRenderer`] holds everything that outlives a frame; a
//! [`FrameBackend`] borrows it together with the frame's encoder and view.

mod common;
mod frame;
mod renderer;

pub use frame::FrameBackend;
pub use renderer::{BatchRenderer, GpuTexture};

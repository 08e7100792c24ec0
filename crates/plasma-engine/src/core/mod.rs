//! Contracts between the window runtime and the application layer.
//!
//! The runtime owns the event loop and GPU objects; an [`App`] sees them only
//! through the per-frame [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};

//! Window and event loop.
//!
//! Owns the `winit` event loop and windows, wires each window to its GPU
//! context, and forwards translated input to the app.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};

//! Plasma engine.
//!
//! Hosts an embedded application runtime: messages cross the boundary
//! through the [`bus`], each frame's reply is a render command stream that
//! [`render`] replays on the GPU, and window input flows back as
//! `Display.*` events.

pub mod bus;
pub mod coords;
pub mod core;
pub mod device;
pub mod host;
pub mod input;
pub mod logging;
pub mod render;
pub mod texture;
pub mod time;
pub mod window;

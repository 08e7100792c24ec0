//! Surface geometry.
//!
//! Command streams work in physical pixels with the origin top-left; the
//! projection a stream pushes maps them to clip space.

mod viewport;

pub use viewport::Viewport;

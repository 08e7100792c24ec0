//! Wire layer for the **Plasma** runtime boundary.
//!
//! This crate is intentionally dependency-free so it can be consumed by
//! protocol tooling and tests without pulling in any engine or GPU code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`codec`] | Int32X varint, big-endian fixed-width values, scalar-list strings |
//! | [`message`] | `Message`, `SendDisposition` |
//! | [`frames`] | size-prefixed batch splitting |
//! | [`error`] | `FrameError` |
//!
//! # Quick start
//!
//! ```rust
//! use plasma_wire::Message;
//!
//! let mut m = Message::new("Display.render");
//! m.write_int32x(0).write_int32x(1280).write_int32x(720);
//!
//! let mut inbound = Message::parse(m.into_bytes());
//! assert_eq!(inbound.type_name(), "Display.render");
//! assert_eq!(inbound.read_int32x(), 0);
//! ```

pub mod codec;
pub mod error;
pub mod frames;
pub mod message;

pub use error::FrameError;
pub use frames::{split_frames, write_frame, Frames};
pub use message::{Message, SendDisposition};

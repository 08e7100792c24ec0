//! Input subsystem.
//!
//! Platform events become [`DisplayEvent`]s, which encode into the
//! `Display.on_*` messages the runtime consumes.

mod events;
mod state;
mod types;

pub mod platform {
    pub mod winit;
}

pub use events::{names, render_request};
pub use state::InputState;
pub use types::{DisplayEvent, Key, MouseButton, PointerKind};

//! Host side of the runtime boundary.
//!
//! [`DisplaySession`] is the GPU-free core: input forwarding, the per-frame
//! `Display.render` round trip, command replay, and texture completion.
//! [`PlasmaHost`] plugs a session into the window runtime.

mod app;
mod config;
mod session;

pub use app::PlasmaHost;
pub use config::HostConfig;
pub use session::DisplaySession;

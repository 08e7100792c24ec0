//! Message dispatch between the host and the embedded runtime.
//!
//! The bus owns the listener registry (type name -> callback), the reply
//! correlation table (message id -> one-shot callback), and the synchronous
//! call into the runtime through a [`RuntimeLink`].
//!
//! Convention:
//! - the empty type name is reserved for replies and routed by the bus itself
//! - callbacks run outside the registry lock, so they may dispatch, send, or
//!   (un)register freely

mod config;
mod dispatch;
mod link;

pub use config::BusConfig;
pub use dispatch::{Bus, Callback};
pub use link::RuntimeLink;

//! Frame pacing.
//!
//! [`InFlight`] is the only blocking point between the frame producer and
//! the GPU: one permit per frame slot in the geometry rings.

mod in_flight;

pub use in_flight::InFlight;

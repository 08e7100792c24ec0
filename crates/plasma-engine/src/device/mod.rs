//! GPU device and surface management.
//!
//! Creates the wgpu instance, adapter, device and queue, configures the
//! window surface, and hands out per-frame encoders.

mod context;
mod init;
mod surface;

pub use context::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;

//! Plasma host binary.
//!
//! Opens a window and drives the built-in demo runtime through the engine.
//! An optional first argument names an image for the demo to load.

mod demo;

use anyhow::Result;
use winit::dpi::LogicalSize;

use plasma_engine::device::GpuInit;
use plasma_engine::host::{HostConfig, PlasmaHost};
use plasma_engine::logging::{init_logging, LoggingConfig};
use plasma_engine::window::{Runtime, RuntimeConfig};

use demo::DemoRuntime;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let texture = std::env::args().nth(1);
    if let Some(path) = &texture {
        log::info!("demo texture: {path}");
    }

    let host = PlasmaHost::new(DemoRuntime::new(texture), HostConfig::default())?;

    Runtime::run(
        RuntimeConfig {
            title: "Plasma".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
        },
        GpuInit::default(),
        host,
    )
}

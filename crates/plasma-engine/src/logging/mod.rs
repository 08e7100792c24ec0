//! Logger setup.
//!
//! Library code only uses the `log` facade; this installs `env_logger` once
//! for binaries.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};

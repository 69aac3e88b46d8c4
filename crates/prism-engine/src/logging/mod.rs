//! Logger setup.
//!
//! The engine logs through the `log` facade only; `env_logger` is installed
//! by [`init_logging`] when the host binary asks for it.

mod init;

pub use init::{init_logging, LoggingConfig, DEFAULT_FILTER};

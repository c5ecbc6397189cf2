//! # Runtime Support
//!
//! Shared infrastructure for the offline engine: the logging bootstrap and
//! the engine configuration surface.

pub mod config;
pub mod error;
pub mod logging;

pub use config::EngineConfig;
pub use error::{Result, RuntimeError};
pub use logging::{init_logging, LogFormat, LoggingConfig};

//! # runlet-log
//!
//! Tracing setup for the runner. Events always go to **stderr**; stdout
//! belongs to the output envelope.
//!
//! ```rust
//! let guard = runlet_log::init_with(runlet_log::Config::test()).unwrap();
//! tracing::info!(connection = "github", "resolving");
//! # drop(guard);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod builder;
mod config;
mod error;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DEFAULT_LEVEL, DisplayConfig, Format};
pub use error::{LogError, LogResult};

/// Initialize from `RUNLET_LOG` / `RUST_LOG` / `RUNLET_LOG_FORMAT`.
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::from_env())
}

/// Initialize with custom configuration.
///
/// Calling this again after a subscriber is installed returns a no-op
/// guard instead of failing.
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

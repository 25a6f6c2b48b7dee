//! Subscriber construction.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{Config, Format};
use crate::error::{LogError, LogResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard returned by initialisation.
///
/// A guard from a repeated initialisation is a no-op: the first
/// subscriber stays installed.
#[derive(Debug)]
#[must_use = "dropping the guard immediately hides whether logging was installed"]
pub struct LoggerGuard {
    installed: bool,
}

impl LoggerGuard {
    pub(crate) fn noop() -> Self {
        Self { installed: false }
    }

    /// Whether this call installed the global subscriber.
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

impl LoggerBuilder {
    /// Create builder from config
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Parse the filter without installing anything.
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            filter: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Build and install the global subscriber.
    pub fn build(self) -> LogResult<LoggerGuard> {
        let filter = self.filter()?;

        if tracing::dispatcher::has_been_set() {
            return Ok(LoggerGuard::noop());
        }

        let installed = tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(filter)
            .try_init();

        match installed {
            Ok(()) => {
                tracing::debug!(
                    level = %self.config.level,
                    format = ?self.config.format,
                    "logger installed"
                );
                Ok(LoggerGuard { installed: true })
            }
            // lost a race with another initialiser
            Err(_) if tracing::dispatcher::has_been_set() => Ok(LoggerGuard::noop()),
            Err(e) => Err(LogError::Install(e.to_string())),
        }
    }

    fn fmt_layer(&self) -> BoxedLayer {
        let display = &self.config.display;

        macro_rules! finish {
            ($layer:expr) => {{
                let layer = $layer
                    .with_writer(std::io::stderr)
                    .with_ansi(display.colors)
                    .with_target(display.target)
                    .with_file(display.source)
                    .with_line_number(display.source);
                if display.time {
                    layer.boxed()
                } else {
                    layer.without_time().boxed()
                }
            }};
        }

        match self.config.format {
            Format::Compact => finish!(fmt::layer().compact()),
            Format::Pretty => finish!(fmt::layer().pretty()),
            Format::Json => finish!(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .flatten_event(display.flatten)
            ),
        }
    }
}

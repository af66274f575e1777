use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::{Error, LogFormat};

const DEFAULT_LOG_FILTER: &str = "ci_queue=debug,ci_queued=debug,info";

/// Builds and installs the global `tracing` subscriber for the queue
/// dispatcher and its demo binary.
///
/// Deliberately smaller than a full telemetry stack: no OTLP/GCloud export,
/// just a filtered, formatted subscriber on stdout. Host applications that
/// need trace export can layer their own subscriber in front instead of
/// calling [`TracingBuilder::try_init`].
pub struct TracingBuilder {
    log_format: LogFormat,
    filter: Option<EnvFilter>,
}

impl TracingBuilder {
    pub fn new() -> Self {
        Self { log_format: LogFormat::Full, filter: None }
    }

    pub fn with_format(format: LogFormat) -> Self {
        Self::new().with_log_format(format)
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Use `RUST_LOG` if set, falling back to [`DEFAULT_LOG_FILTER`]
    /// otherwise.
    pub fn with_env_filter_or_default(mut self) -> Result<Self, Error> {
        let default_filter = EnvFilter::try_new(DEFAULT_LOG_FILTER);
        self.filter = Some(EnvFilter::try_from_default_env().or(default_filter)?);
        Ok(self)
    }

    /// Installs the subscriber as the global default. Fails if one is
    /// already installed.
    pub fn try_init(self) -> Result<(), Error> {
        let filter = match self.filter {
            Some(filter) => filter,
            None => EnvFilter::try_new(DEFAULT_LOG_FILTER)
                .expect("default filter should always parse"),
        };

        match self.log_format {
            LogFormat::Full => {
                let fmt = tracing_subscriber::fmt::layer();
                tracing_subscriber::registry().with(filter).with(fmt).try_init()?;
            }
            LogFormat::Json => {
                let fmt = tracing_subscriber::fmt::layer().json();
                tracing_subscriber::registry().with(filter).with(fmt).try_init()?;
            }
        }

        Ok(())
    }
}

impl Default for TracingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

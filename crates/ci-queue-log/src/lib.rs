//! Structured logging for the `ci-queue` dispatcher and its demo binary.
//!
//! A filtered, formatted [`tracing`] subscriber builder: no OTLP/GCloud
//! export layers, since the queue core has nothing to trace beyond its own
//! spans and events.

mod builder;
mod fmt;

pub use builder::TracingBuilder;
pub use fmt::LogFormat;

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::filter;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse log filter: {0}")]
    EnvFilterParse(#[from] filter::ParseError),

    #[error("failed to parse log filter from environment: {0}")]
    EnvFilterFromEnv(#[from] filter::FromEnvError),

    #[error("failed to install global tracing subscriber: {0}")]
    SetGlobalDefault(#[from] TryInitError),
}

/// Installs the global subscriber with `format` and `RUST_LOG` (or the
/// built-in default filter if unset).
pub fn init(format: LogFormat) -> Result<(), Error> {
    TracingBuilder::with_format(format).with_env_filter_or_default()?.try_init()
}

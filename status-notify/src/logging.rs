//! Logging setup.
//!
//! Logs always go to stderr so stdout stays reserved for the run summary and
//! dry-run output. Timestamps use the local timezone.

use chrono::Local;
use clap::ValueEnum;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{Error, Result};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "status_notify=info,warn";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Pick the filter for the given verbosity flags.
///
/// `--quiet` and `--verbose` win over `RUST_LOG`; otherwise `RUST_LOG` is
/// honoured and [`DEFAULT_LOG_FILTER`] applies when it is unset or invalid.
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("status_notify=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

/// Install the global subscriber.
pub fn init_logging(verbose: bool, quiet: bool, format: LogFormat) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(verbose, quiet));

    let result = match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(LocalTimer)
                    .with_target(verbose),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_timer(LocalTimer),
            )
            .try_init(),
    };

    result.map_err(|e| Error::config(format!("failed to initialise logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_env() {
        assert_eq!(build_filter(false, true).to_string(), "error");
        assert!(build_filter(true, false).to_string().contains("status_notify=debug"));
    }

    #[test]
    fn test_log_format_values() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}

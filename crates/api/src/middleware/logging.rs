//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the
//! configured level, so an operator can raise verbosity per-target
//! without touching config files. Format is `json` for deployments
//! behind a log collector, `compact` or `pretty` for a terminal.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Installs the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let format = config.format.parse().unwrap_or(LogFormat::Pretty);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => {
            registry
                .with(fmt::layer().json().with_current_span(true).with_target(true))
                .init();
        }
        LogFormat::Compact => {
            registry
                .with(fmt::layer().compact().with_target(true))
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
    }

    if LogFormat::from_str(&config.format).is_err() {
        tracing::warn!(
            format = %config.format,
            "unknown log format, falling back to pretty"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_formats_parse() {
        assert_eq!("json".parse(), Ok(LogFormat::Json));
        assert_eq!("compact".parse(), Ok(LogFormat::Compact));
        assert_eq!("pretty".parse(), Ok(LogFormat::Pretty));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(LogFormat::from_str("yaml").is_err());
    }
}

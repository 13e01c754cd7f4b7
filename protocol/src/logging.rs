//! # Structured Logging
//!
//! The library only emits `tracing` events, tagged with the negotiation's
//! `tx_id`. Whoever embeds it installs a subscriber once with
//! [`init_logging`]; `RUST_LOG` overrides the default directive.
//!
//! Secrets never reach a log line: the wrappers in [`crate::crypto::secret`]
//! print `<redacted>`.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format of the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, with file and line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Install the global subscriber.
///
/// `directive` applies when `RUST_LOG` is unset, e.g. `"cloak_protocol=debug"`.
/// Returns `false` and leaves things alone if a subscriber is already set.
pub fn init_logging(directive: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(?format, "tracing subscriber installed");
    }
    installed
}

//! Subscriber setup for one trigger run.
//!
//! JSON output carries the current span so every line logged inside
//! `DisruptionTrigger::handle` is tagged with the invocation's `request_id`.

use anyhow::{Context, Result};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "compact" | "text" => Ok(Self::Pretty),
            other => Err(format!(
                "invalid log format '{}' (valid options: json, pretty)",
                other
            )),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `log_level` when set.
///
/// An unknown format falls back to JSON, which is what log collectors expect.
pub fn init(log_format: &str, log_level: &str) -> Result<()> {
    let (format, format_error) = match log_format.parse::<LogFormat>() {
        Ok(format) => (format, None),
        Err(e) => (LogFormat::default(), Some(e)),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("invalid log level '{}'", log_level))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_timer(UtcTime::rfc_3339()),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init(),
    };
    installed.context("global tracing subscriber already installed")?;

    if let Some(e) = format_error {
        tracing::warn!(error = %e, "Falling back to json log format");
    }

    tracing::debug!(
        log_format = ?format,
        log_level = log_level,
        "Logging system initialized"
    );

    Ok(())
}

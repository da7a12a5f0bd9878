//! Logging setup shared by the bot binary and its crates.
//!
//! One global subscriber: `EnvFilter` (from `RUST_LOG` or a fallback) plus a
//! compact fmt layer with RFC3339 UTC timestamps and span-close timings for
//! `#[instrument]`ed task functions.

use std::io::{self, IsTerminal};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line fmt layer.
///
/// ANSI colors only when stdout is a terminal.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(false))
}

/// `EnvFilter` from `RUST_LOG`, or `default` when unset/invalid.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(default: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default))
        .with(layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_filter_accepts_per_crate_directives() {
        let filter = env_filter("info,mr_reviewer=debug,project_code_store=warn");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn init_twice_does_not_panic() {
        init("info");
        init("debug");
    }
}

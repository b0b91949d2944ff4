//! # Structured Logging
//!
//! Initializes the `tracing` subscriber with a configurable format (JSON or
//! pretty-printed) and an `EnvFilter` taken from `--log-level` / `LYC_LOG`.
//!
//! All log output goes to stderr. Stdout carries command results, and the
//! secret prompts share stderr with the logs, so the default filter keeps
//! things quiet unless something goes wrong.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when none is given or the given one doesn't parse.
pub const DEFAULT_LOG_FILTER: &str = "lyc=warn,lyc_ledger=warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable, colored output.
    Pretty,
    /// Machine-parseable JSON lines.
    Json,
}

/// Builds the filter, falling back to [`DEFAULT_LOG_FILTER`] on bad syntax.
fn build_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize the global tracing subscriber.
///
/// Call this exactly once, early in `main()`. Subsequent calls will panic.
///
/// # Arguments
///
/// * `directives` - `EnvFilter` directives, e.g. `"lyc=info,lyc_ledger=debug"`.
/// * `format` - Output format (JSON or pretty-printed).
pub fn init_logging(directives: &str, format: LogFormat) {
    let env_filter = build_filter(directives);

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .init();
        }
    }

    tracing::debug!("logging initialized (format={:?})", format);
}

//! Telemetry initialization.
//!
//! Structured JSON spans/events to stderr via `tracing-subscriber`.
//! `RUST_LOG` controls verbosity (default `info`), following the same
//! `EnvFilter` convention as the storage engine's own logging.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Call once, near the top of `main`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .init();
}

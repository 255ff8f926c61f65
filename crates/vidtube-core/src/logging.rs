//! Tracing subscriber setup.
//!
//! Call one of these once, before [`App::new`](crate::App::new). `RUST_LOG`
//! wins over the fallback level when set:
//!
//! ```bash
//! RUST_LOG=vidtube_core=debug,tower_http=debug vidtube-server
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Human-readable logs at `info` unless `RUST_LOG` says otherwise.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Like [`init_logging`] with a different fallback level.
pub fn init_logging_with_level(level: &str) {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// One JSON object per line, for log shipping in production.
pub fn init_logging_json() {
    tracing_subscriber::registry()
        .with(filter("info"))
        .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
        .init();
}

/// `RUST_LOG`, or `level` with per-query SQL logging held back to `warn`.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx::query=warn", level)))
}

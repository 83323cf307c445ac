//! Logging for hosts that don't install their own subscriber.
//!
//! Without `RUST_LOG` the wallet's own events show at `info` and everything
//! else (reqwest, bdk, hyper) only from `warn`.

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::keys::env;

pub const DEFAULT_FILTER: &str = "warn,beewallet=info";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn json_requested() -> bool {
    std::env::var(env::LOG_JSON).is_ok_and(|v| matches!(v.trim(), "1" | "true"))
}

/// Installs a stderr subscriber, JSON lines when `BEEWALLET_LOG_JSON` is set.
/// Returns false if a global subscriber was already in place.
pub fn init_logging() -> bool {
    let builder = fmt::Subscriber::builder().with_env_filter(filter()).with_writer(std::io::stderr);
    let installed = if json_requested() {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.with_target(false).compact().try_init()
    };
    installed.is_ok()
}

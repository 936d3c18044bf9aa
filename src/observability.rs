//! Observability utilities.

use crate::types::ObservabilityConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing subscriber once for the process.
///
/// Log format defaults to compact text and can be switched to JSON via
/// `TOOLHUB_LOG_FORMAT=json`. Filter defaults to `info` if `RUST_LOG` is unset.
pub fn init_tracing() {
    let json = std::env::var("TOOLHUB_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    init(None, json);
}

/// Like [`init_tracing`], with level and format taken from config.
///
/// `RUST_LOG` still wins over `log_level` when set.
pub fn init_tracing_with(config: &ObservabilityConfig) {
    init(Some(&config.log_level), config.json_logs);
}

fn init(level: Option<&str>, json: bool) {
    TRACING_INIT.get_or_init(|| {
        let fallback = level.unwrap_or("info");
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        // Logs go to stderr; stdout carries response envelopes.
        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing();
        init_tracing_with(&ObservabilityConfig::default());
        init_tracing();
    }
}

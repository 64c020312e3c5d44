//! Tracing setup: `RUST_LOG` wins when set, otherwise a sane default;
//! `--log-format json` switches to structured output for log aggregation.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt().json().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(false).init();
        }
    }
}

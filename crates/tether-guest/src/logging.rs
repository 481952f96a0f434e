//! Log output for guest modules.
//!
//! The host captures the module's stderr and prefixes each line with its
//! own timestamp and invocation context, so the formatter here stays bare.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "TETHER_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Filter from `TETHER_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// Install the stderr subscriber. Safe to call at the start of every
/// invocation; only the first call in an instance has an effect.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .without_time()
                .with_target(false)
                .compact(),
        )
        .with(env_filter())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init();
        init();
        tracing::info!(component = "logging", "still alive");
    }

    #[test]
    fn test_default_filter_is_info() {
        if std::env::var(LOG_ENV).is_err() {
            assert_eq!(env_filter().to_string(), "info");
        }
    }
}

//! Process logging.
//!
//! Diagnostics go through `tracing` to stderr so they never interleave with the
//! conversation transcript on stdout. `RUST_LOG` overrides the default level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive when `RUST_LOG` is unset.
#[must_use]
pub fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Repeated calls are ignored.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(true)
        .with_ansi(debug)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::{default_directive, init_logging};

    #[test]
    fn debug_flag_raises_default_level() {
        assert_eq!(default_directive(false), "warn");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(false);
        init_logging(true);
        tracing::debug!("logging initialized twice");
    }
}

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_DIRECTIVE: &str = "cashbook=info";

/// Install the global fmt subscriber. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        fmt().with_env_filter(filter).with_target(false).init();
    });
}

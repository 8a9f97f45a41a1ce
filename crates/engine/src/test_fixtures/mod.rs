//! Common test helpers.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Route `tracing` output through the test harness so it only shows for
/// failing tests. Honours `RUST_LOG`; defaults to debug for this crate.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "ghostplay_engine=debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing logger.
///
/// Safe to call more than once; later calls are no-ops. The bridge runs
/// inside the host process, so a failed global-default registration (the
/// host may embed other instrumented code) is not an error.
pub fn init_logger(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}

use tracing_subscriber::EnvFilter;

/// Opt-in tracing setup for binaries embedding this crate. Reads
/// `RUST_LOG`, defaulting to `info`; pretty output in debug builds, JSON
/// in release builds. Safe to call more than once.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg!(debug_assertions) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_target(false)
            .try_init();
    }
}

//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable.
///
/// # Example
/// ```
/// voxview::core::logging::init();
/// log::info!("Viewer started");
/// ```
pub fn init() {
    // try_init so a second call (tests, embedding) is harmless
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).try_init();
}

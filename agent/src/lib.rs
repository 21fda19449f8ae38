use env_logger::Env;

pub mod args;
pub mod config;

/// Initializes the global logger.
///
/// Call this first!
/// The default level is `info`, use the `RUST_LOG` environment variable to change it.
///
/// # Example
///
/// ```
/// use hostmetrics_agent::init_logger;
///
/// fn main() {
///     init_logger();
///     log::info!("I can log now!");
/// }
/// ```
pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Print a warning if we are running in debug mode.
    #[cfg(debug_assertions)]
    {
        log::warn!("DEBUG assertions are enabled, this build is fine for debugging, but not for production.");
    }
}

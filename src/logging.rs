//! Diagnostic logging setup
//!
//! Logs always go to stderr: stdout may carry decrypted plaintext or an
//! echoed container.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "ENC_LOG";

/// Install the global tracing subscriber.
///
/// `default_level` is used unless [`LOG_ENV`] holds a valid filter. Calling
/// this more than once leaves the first subscriber in place.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the configured level.
/// Calling this again (tests, embedded use) leaves the first subscriber in place.
pub fn init_logging(logging: &LoggingConfig) {
    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    // Ignore error if a global subscriber is already set.
    if logging.json {
        let _ = tracing::subscriber::set_global_default(builder.json().finish());
    } else {
        let _ = tracing::subscriber::set_global_default(builder.finish());
    }
}

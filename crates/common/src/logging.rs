//! Logging and tracing initialization.
//!
//! Library crates only emit `tracing` events; binaries install a subscriber
//! once at startup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt::Subscriber::builder().with_env_filter(env_filter);
    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish()).ok();
    } else {
        let subscriber = builder
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging, raising the level to `debug` for Clipcam crates when
/// `verbose` is set.
pub fn init_logging_with_verbosity(config: &LoggingConfig, verbose: bool) {
    if verbose {
        let verbose_config = LoggingConfig {
            level: format!("clipcam=debug,{}", config.level),
            ..config.clone()
        };
        init_logging(&verbose_config);
    } else {
        init_logging(config);
    }
}


//! `tracing` subscriber setup.

use anyhow::{anyhow, Context};
use numeron_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Build the log filter: `RUST_LOG` if set, else `config.log_level`.
///
/// # Errors
/// Fails if the configured level is not a valid filter directive.
pub fn env_filter(config: &GeneralConfig) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level)
            .with_context(|| format!("invalid log level {:?}", config.log_level)),
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Fails on an invalid log level or if a subscriber is already installed.
pub fn init(config: &GeneralConfig) -> anyhow::Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = GeneralConfig {
            log_level: "numeron=loud".into(),
            json_logs: false,
        };
        assert!(env_filter(&config).is_err());
    }

    #[test]
    fn default_level_builds() {
        assert!(env_filter(&GeneralConfig::default()).is_ok());
    }

    #[test]
    fn second_init_fails() {
        let config = GeneralConfig::default();
        let _ = init(&config);
        assert!(init(&config).is_err());
    }
}

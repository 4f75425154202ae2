use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Filter directive for the run: `-v` counts win over the configured level.
#[must_use]
pub fn directive(config: &LoggingConfig, verbose: u8) -> &str {
    match verbose {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Logs go to stderr so that stdout only
/// carries command output. `RUST_LOG` overrides everything.
///
/// # Errors
/// Fails on an unparsable level directive or when a subscriber is already set.
pub fn init(config: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive(config, verbose)))
        .with_context(|| format!("invalid log level '{}'", config.level))?;
    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_overrides_configured_level() {
        let config = LoggingConfig {
            level: "error".to_owned(),
            json: false,
        };
        assert_eq!(directive(&config, 0), "error");
        assert_eq!(directive(&config, 1), "info");
        assert_eq!(directive(&config, 2), "debug");
        assert_eq!(directive(&config, 7), "trace");
    }
}

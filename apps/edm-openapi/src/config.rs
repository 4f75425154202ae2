use std::path::Path;

use anyhow::{Context, Result};
use edm_openapi::{ConvertSettings, DocumentInfo};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

/// Environment prefix; `__` separates nested keys
/// (`EDM_OPENAPI__CONVERT__MAX_NAVIGATION_DEPTH=3`).
pub const ENV_PREFIX: &str = "EDM_OPENAPI__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub convert: ConvertSettings,
    #[serde(default)]
    pub document: DocumentInfo,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "warn".to_owned()
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_depth: Option<i32>,
}

impl AppConfig {
    /// Layered load: defaults, then the YAML file (if any), then the
    /// environment.
    ///
    /// # Errors
    /// Fails when the file is missing or when a layer does not match the
    /// configuration shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    pub fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(depth) = overrides.max_depth {
            self.convert.max_navigation_depth = depth;
        }
    }

    /// Effective configuration as pretty JSON.
    ///
    /// # Errors
    /// Fails only if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.convert.max_navigation_depth, 5);
            assert_eq!(config.logging.level, "warn");
            Ok(())
        });
    }

    #[test]
    fn test_yaml_then_env_then_cli() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "edm-openapi.yaml",
                r"
convert:
  max_navigation_depth: 2
  enable_type_cast_paths: false
document:
  title: Library
logging:
  level: debug
",
            )?;
            let path = jail.directory().join("edm-openapi.yaml");

            let config = AppConfig::load(Some(&path)).unwrap();
            assert_eq!(config.convert.max_navigation_depth, 2);
            assert!(!config.convert.enable_type_cast_paths);
            assert!(config.convert.enable_operation_paths);
            assert_eq!(config.document.title, "Library");
            assert_eq!(config.document.version, "1.0.0");
            assert_eq!(config.logging.level, "debug");

            jail.set_env("EDM_OPENAPI__CONVERT__MAX_NAVIGATION_DEPTH", "3");
            jail.set_env("EDM_OPENAPI__LOGGING__JSON", "true");
            let mut config = AppConfig::load(Some(&path)).unwrap();
            assert_eq!(config.convert.max_navigation_depth, 3);
            assert!(config.logging.json);

            config.apply_cli_overrides(&CliOverrides { max_depth: Some(1) });
            assert_eq!(config.convert.max_navigation_depth, 1);
            config.apply_cli_overrides(&CliOverrides::default());
            assert_eq!(config.convert.max_navigation_depth, 1);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_fails() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/edm-openapi.yaml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_unknown_key_fails() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.yaml", "convert:\n  depth: 2\n")?;
            let path = jail.directory().join("bad.yaml");
            assert!(AppConfig::load(Some(&path)).is_err());
            Ok(())
        });
    }
}

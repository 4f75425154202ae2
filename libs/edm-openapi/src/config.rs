use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertSettings {
    /// Maximum number of navigation segments in one path.
    #[serde(default = "default_max_navigation_depth")]
    pub max_navigation_depth: i32,
    /// Emit `/Set/NS.Derived` paths for concrete derived types.
    #[serde(default = "default_true")]
    pub enable_type_cast_paths: bool,
    /// Emit paths for bound actions and functions.
    #[serde(default = "default_true")]
    pub enable_operation_paths: bool,
    #[serde(default = "default_true")]
    pub enable_dollar_count_paths: bool,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            max_navigation_depth: default_max_navigation_depth(),
            enable_type_cast_paths: true,
            enable_operation_paths: true,
            enable_dollar_count_paths: true,
        }
    }
}

impl ConvertSettings {
    /// Check the settings before any work is done.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidNavigationDepth` for a negative depth.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_navigation_depth < 0 {
            return Err(ConfigError::InvalidNavigationDepth(self.max_navigation_depth));
        }
        Ok(())
    }

    /// Navigation depth as a count; negative values (rejected by
    /// [`ConvertSettings::validate`]) read as zero.
    #[must_use]
    pub fn navigation_depth(&self) -> usize {
        usize::try_from(self.max_navigation_depth).unwrap_or(0)
    }
}

fn default_max_navigation_depth() -> i32 {
    5
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConvertSettings::default();
        assert_eq!(settings.max_navigation_depth, 5);
        assert!(settings.enable_type_cast_paths);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_negative_depth_is_rejected() {
        let settings = ConvertSettings {
            max_navigation_depth: -1,
            ..ConvertSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ConfigError::InvalidNavigationDepth(-1))
        );
        assert_eq!(settings.navigation_depth(), 0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ConvertSettings =
            serde_json::from_str(r#"{ "max_navigation_depth": 2 }"#).unwrap();
        assert_eq!(settings.navigation_depth(), 2);
        assert!(settings.enable_dollar_count_paths);
        assert!(serde_json::from_str::<ConvertSettings>(r#"{ "depth": 2 }"#).is_err());
    }
}

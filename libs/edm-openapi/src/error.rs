use thiserror::Error;

/// Invalid conversion settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_navigation_depth must be >= 0, got {0}")]
    InvalidNavigationDepth(i32),
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to serialize OpenAPI document: {0}")]
    Serialize(#[from] serde_json::Error),
}

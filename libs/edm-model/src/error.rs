/// Errors raised while building an [`EdmModel`](crate::EdmModel).
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("duplicate element name '{name}'")]
    DuplicateName { name: String },

    #[error("unknown type '{name}' referenced by '{referenced_by}'")]
    UnknownType { name: String, referenced_by: String },

    #[error("base type cycle detected at '{name}'")]
    BaseTypeCycle { name: String },

    #[error("bound operation '{name}' declares no binding parameter")]
    MissingBindingParameter { name: String },

    #[error("operation import '{import}' refers to unknown operation '{name}'")]
    UnknownOperation { name: String, import: String },

    #[error("navigation binding '{path}' on '{owner}' targets unknown '{target}'")]
    UnknownBindingTarget {
        owner: String,
        path: String,
        target: String,
    },

    #[error("annotation target '{target}' does not resolve to a model element")]
    UnknownTarget { target: String },

    #[error("invalid model document: {0}")]
    Document(#[from] serde_json::Error),
}

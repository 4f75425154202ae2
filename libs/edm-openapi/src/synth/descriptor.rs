//! Synthesized operation descriptors.

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::capabilities::ExampleValue;
use crate::paths::ODataPath;

pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_PLAIN: &str = "text/plain";

/// Parameter specification of a synthesized operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    pub param_type: ParamType,
    /// Exclusions that apply to the values this parameter accepts.
    pub constraints: Vec<Constraint>,
    pub examples: Vec<ExampleValue>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Value type of a parameter
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// Primitive EDM type, e.g. `Edm.Int32`.
    Edm(String),
    Integer,
    Boolean,
    String,
    /// Comma separated list of items, e.g. `$select`.
    StringList,
}

/// Schema of a request or response payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeRef {
    /// One entity of the qualified type.
    Entity { type_name: String },
    /// Collection envelope of entities of the qualified type.
    EntityCollection { type_name: String },
    /// Operation return value.
    Type { type_name: String, collection: bool },
    /// Action parameters, sent as one JSON object.
    Parameters(Vec<BodyParameter>),
    Count,
    /// `{"@odata.id": ...}` reference.
    Reference,
    ReferenceCollection,
    Error,
}

/// One property of an action request body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BodyParameter {
    pub name: String,
    pub type_name: String,
    pub collection: bool,
    pub nullable: bool,
}

/// Request body specification of a synthesized operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBodySpec {
    pub content_type: &'static str,
    pub description: Option<String>,
    pub shape: ShapeRef,
    pub required: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseStatus {
    Code(u16),
    Default,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Response specification of a synthesized operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseSpec {
    pub status: ResponseStatus,
    pub content_type: &'static str,
    pub description: String,
    /// Payload schema, `None` for an empty body.
    pub shape: Option<ShapeRef>,
}

/// Authorization scheme and the scopes any of which grant access
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityRequirement {
    pub scheme: String,
    pub scopes: Vec<String>,
}

/// Restriction surfaced as documentation instead of removing a parameter or
/// an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    RequiresFilter,
    RequiredFilterProperties(Vec<String>),
    NonFilterableProperties(Vec<String>),
    NonSortableProperties(Vec<String>),
    AscendingOnlyProperties(Vec<String>),
    DescendingOnlyProperties(Vec<String>),
    NonExpandableProperties(Vec<String>),
    MaxExpandLevels(u32),
    NonCountableProperties(Vec<String>),
    UnsupportedSearchExpressions(String),
    NonInsertableProperties(Vec<String>),
    NonInsertableNavigationProperties(Vec<String>),
    NonUpdatableNavigationProperties(Vec<String>),
    NonDeletableNavigationProperties(Vec<String>),
    /// Maximum depth of deep insert, update or delete.
    MaxDeepLevels(u32),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, items) = match self {
            Self::RequiresFilter => return f.write_str("a filter expression is required"),
            Self::MaxExpandLevels(levels) => {
                return write!(f, "at most {levels} levels of expansion");
            }
            Self::MaxDeepLevels(levels) => {
                return write!(f, "at most {levels} levels of nested entities");
            }
            Self::UnsupportedSearchExpressions(expr) => {
                return write!(f, "unsupported search expressions: {expr}");
            }
            Self::RequiredFilterProperties(p) => ("properties required in filter", p),
            Self::NonFilterableProperties(p) => ("non-filterable properties", p),
            Self::NonSortableProperties(p) => ("non-sortable properties", p),
            Self::AscendingOnlyProperties(p) => ("ascending-only properties", p),
            Self::DescendingOnlyProperties(p) => ("descending-only properties", p),
            Self::NonExpandableProperties(p) => ("non-expandable properties", p),
            Self::NonCountableProperties(p) => ("non-countable properties", p),
            Self::NonInsertableProperties(p) => ("non-insertable properties", p),
            Self::NonInsertableNavigationProperties(p) => {
                ("non-insertable navigation properties", p)
            }
            Self::NonUpdatableNavigationProperties(p) => {
                ("non-updatable navigation properties", p)
            }
            Self::NonDeletableNavigationProperties(p) => {
                ("non-deletable navigation properties", p)
            }
        };
        write!(f, "{label}: {}", items.join(", "))
    }
}

/// One synthesized HTTP operation on a path.
#[derive(Clone, Debug)]
pub struct OperationDescriptor {
    pub method: Method,
    pub path: Arc<ODataPath>,
    pub operation_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub params: Vec<ParamSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<ResponseSpec>,
    /// Alternatives; satisfying any one grants access.
    pub security: Vec<SecurityRequirement>,
    /// Restrictions on the operation as a whole.
    pub constraints: Vec<Constraint>,
}

impl OperationDescriptor {
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn success_status(&self) -> Option<u16> {
        self.responses.iter().find_map(|r| match r.status {
            ResponseStatus::Code(code) if code < 300 => Some(code),
            _ => None,
        })
    }
}

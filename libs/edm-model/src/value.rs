//! Raw vocabulary annotation values.
//!
//! These mirror the expression kinds of a metadata document without any
//! knowledge of the vocabulary that gives them meaning. Typed decoding
//! happens in the consumer.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One annotation value as it appears in the metadata.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Property, navigation property or annotation path expression.
    Path(String),
    /// Enumeration member, either `Member` or `Namespace.Enum/Member`.
    EnumMember(String),
    Record(RawRecord),
    Collection(Vec<RawValue>),
}

/// Structured annotation value: named fields plus an optional type name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRecord {
    pub type_name: Option<String>,
    pub fields: BTreeMap<String, RawValue>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }
}

impl RawValue {
    /// Human readable shape name, used when reporting a mismatch.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Path(_) => "path",
            Self::EnumMember(_) => "enum member",
            Self::Record(_) => "record",
            Self::Collection(_) => "collection",
        }
    }

    #[must_use]
    pub fn path(p: impl Into<String>) -> Self {
        Self::Path(p.into())
    }

    #[must_use]
    pub fn enum_member(m: impl Into<String>) -> Self {
        Self::EnumMember(m.into())
    }

    /// Collection of path expressions.
    #[must_use]
    pub fn paths<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Collection(items.into_iter().map(|p| Self::Path(p.into())).collect())
    }

    /// Plain JSON form. Paths and enum members become strings and records
    /// lose their type name. `None` if a float anywhere is not finite.
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        use serde_json::Value as J;

        Some(match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Int(i) => J::from(*i),
            Self::Float(f) => J::Number(serde_json::Number::from_f64(*f)?),
            Self::String(s) | Self::Path(s) | Self::EnumMember(s) => J::String(s.clone()),
            Self::Record(record) => J::Object(
                record
                    .fields
                    .iter()
                    .map(|(name, value)| Some((name.clone(), value.to_json()?)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Self::Collection(items) => {
                J::Array(items.iter().map(Self::to_json).collect::<Option<Vec<_>>>()?)
            }
        })
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<RawRecord> for RawValue {
    fn from(v: RawRecord) -> Self {
        Self::Record(v)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(v: Vec<RawValue>) -> Self {
        Self::Collection(v)
    }
}

const PATH_KEYS: [&str; 4] = [
    "$Path",
    "$PropertyPath",
    "$NavigationPropertyPath",
    "$AnnotationPath",
];

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match value {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            J::String(s) => Self::String(s),
            J::Array(items) => Self::Collection(items.into_iter().map(Self::from).collect()),
            J::Object(mut map) => {
                if map.len() == 1 {
                    for key in PATH_KEYS {
                        if let Some(J::String(p)) = map.get(key) {
                            return Self::Path(p.clone());
                        }
                    }
                    if let Some(J::String(m)) = map.get("$EnumMember") {
                        return Self::EnumMember(m.clone());
                    }
                }
                let type_name = match map.remove("@type") {
                    Some(J::String(t)) => Some(t),
                    _ => None,
                };
                let fields = map
                    .into_iter()
                    .filter(|(k, _)| !k.starts_with('@') && !k.starts_with('$'))
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect();
                Self::Record(RawRecord { type_name, fields })
            }
        }
    }
}

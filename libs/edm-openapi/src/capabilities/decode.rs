use edm_model::{RawRecord, RawValue};

use super::{Decode, Term};

/// One annotation field that could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeIssue {
    pub term: Term,
    /// CSDL-style path of the annotated element.
    pub element: String,
    /// Dotted location of the field inside the annotation; empty for the value itself.
    pub field: String,
    pub expected: &'static str,
    pub found: &'static str,
}

/// Collects decode issues for one annotation value.
#[derive(Debug)]
pub struct FieldReport {
    term: Term,
    element: String,
    issues: Vec<DecodeIssue>,
}

impl FieldReport {
    #[must_use]
    pub fn new(term: Term, element: impl Into<String>) -> Self {
        Self {
            term,
            element: element.into(),
            issues: Vec::new(),
        }
    }

    /// Record a shape mismatch; the field is treated as absent.
    pub fn mismatch(&mut self, field: &str, expected: &'static str, found: &RawValue) {
        tracing::warn!(
            term = %self.term,
            element = %self.element,
            field,
            expected,
            found = found.shape(),
            "malformed capability annotation field ignored"
        );
        self.issues.push(DecodeIssue {
            term: self.term,
            element: self.element.clone(),
            field: field.to_owned(),
            expected,
            found: found.shape(),
        });
    }

    #[must_use]
    pub fn issues(&self) -> &[DecodeIssue] {
        &self.issues
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<DecodeIssue> {
        self.issues
    }
}

/// Field accessors over one annotation record.
///
/// Every accessor returns `None` for a missing or `null` field and for a
/// field of the wrong shape; only the latter is reported.
#[derive(Clone, Copy, Debug)]
pub struct Fields<'a> {
    record: &'a RawRecord,
    location: &'a str,
}

impl<'a> Fields<'a> {
    /// View `value` as a record, reporting a mismatch at `location` otherwise.
    pub fn at(value: &'a RawValue, location: &'a str, report: &mut FieldReport) -> Option<Self> {
        if let RawValue::Record(record) = value {
            Some(Self { record, location })
        } else {
            report.mismatch(location, "record", value);
            None
        }
    }

    fn path(&self, name: &str) -> String {
        if self.location.is_empty() {
            name.to_owned()
        } else {
            format!("{}.{name}", self.location)
        }
    }

    fn raw(&self, name: &str) -> Option<&'a RawValue> {
        match self.record.get(name) {
            None | Some(RawValue::Null) => None,
            Some(value) => Some(value),
        }
    }

    #[must_use]
    pub fn bool(&self, name: &str, report: &mut FieldReport) -> Option<bool> {
        match self.raw(name)? {
            RawValue::Bool(b) => Some(*b),
            other => {
                report.mismatch(&self.path(name), "bool", other);
                None
            }
        }
    }

    #[must_use]
    pub fn int(&self, name: &str, report: &mut FieldReport) -> Option<i64> {
        match self.raw(name)? {
            RawValue::Int(i) => Some(*i),
            other => {
                report.mismatch(&self.path(name), "int", other);
                None
            }
        }
    }

    #[must_use]
    pub fn string(&self, name: &str, report: &mut FieldReport) -> Option<String> {
        match self.raw(name)? {
            RawValue::String(s) => Some(s.clone()),
            other => {
                report.mismatch(&self.path(name), "string", other);
                None
            }
        }
    }

    /// Path expression; plain strings are accepted as paths.
    #[must_use]
    pub fn path_value(&self, name: &str, report: &mut FieldReport) -> Option<String> {
        match self.raw(name)? {
            RawValue::Path(p) | RawValue::String(p) => Some(p.clone()),
            other => {
                report.mismatch(&self.path(name), "path", other);
                None
            }
        }
    }

    /// Collection of path expressions. Malformed items are reported and skipped.
    #[must_use]
    pub fn paths(&self, name: &str, report: &mut FieldReport) -> Option<Vec<String>> {
        let RawValue::Collection(items) = self.raw(name)? else {
            let found = self.raw(name)?;
            report.mismatch(&self.path(name), "collection", found);
            return None;
        };
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                RawValue::Path(p) | RawValue::String(p) => out.push(p.clone()),
                other => report.mismatch(&format!("{}[{i}]", self.path(name)), "path", other),
            }
        }
        Some(out)
    }

    /// Enumeration member name without its enum type prefix.
    ///
    /// `Org.OData.Capabilities.V1.NavigationType/None` and `None` both yield
    /// `None`; a plain string is accepted too.
    #[must_use]
    pub fn enum_member(&self, name: &str, report: &mut FieldReport) -> Option<&'a str> {
        match self.raw(name)? {
            RawValue::EnumMember(m) | RawValue::String(m) => {
                Some(m.rsplit_once('/').map_or(m.as_str(), |(_, member)| member))
            }
            other => {
                report.mismatch(&self.path(name), "enum member", other);
                None
            }
        }
    }

    /// Any value in plain JSON form, for example payloads.
    #[must_use]
    pub fn json(&self, name: &str, report: &mut FieldReport) -> Option<serde_json::Value> {
        let value = self.raw(name)?;
        let json = value.to_json();
        if json.is_none() {
            report.mismatch(&self.path(name), "finite value", value);
        }
        json
    }

    /// Nested record decoded with `T`.
    #[must_use]
    pub fn nested<T: Decode>(&self, name: &str, report: &mut FieldReport) -> Option<T> {
        let value = self.raw(name)?;
        T::decode_at(value, &self.path(name), report)
    }

    /// Collection of nested records; items that fail to decode are skipped.
    #[must_use]
    pub fn nested_list<T: Decode>(&self, name: &str, report: &mut FieldReport) -> Option<Vec<T>> {
        let RawValue::Collection(items) = self.raw(name)? else {
            let found = self.raw(name)?;
            report.mismatch(&self.path(name), "collection", found);
            return None;
        };
        let base = self.path(name);
        Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| T::decode_at(item, &format!("{base}[{i}]"), report))
                .collect(),
        )
    }
}

/// Decoding of a boolean tag term. A `null` value stands for a bare
/// annotation and means `true`.
pub(super) fn tag_value(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<bool> {
    match value {
        RawValue::Bool(b) => Some(*b),
        RawValue::Null => Some(true),
        other => {
            report.mismatch(field, "bool", other);
            None
        }
    }
}

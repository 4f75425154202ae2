//! Sub-records shared by several capability terms.

use edm_model::RawValue;

use super::{Decode, FieldReport, Fields};

/// Scope granted by a permission, optionally limited to some properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    pub scope: String,
    /// Comma separated property paths, `*` for all.
    pub restricted_properties: Option<String>,
}

impl Decode for Scope {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            scope: f.string("Scope", report)?,
            restricted_properties: f.string("RestrictedProperties", report),
        })
    }
}

/// Authorization scheme plus the scopes that satisfy it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Permission {
    pub scheme_name: Option<String>,
    pub scopes: Vec<Scope>,
}

impl Decode for Permission {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            scheme_name: f.string("SchemeName", report),
            scopes: f.nested_list("Scopes", report).unwrap_or_default(),
        })
    }
}

impl Permission {
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(|s| s.scope.as_str())
    }
}

/// Custom header or query option a service accepts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomParameter {
    pub name: String,
    pub description: Option<String>,
    pub documentation_url: Option<String>,
    pub required: Option<bool>,
    pub example_values: Vec<ExampleValue>,
}

impl CustomParameter {
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

impl Decode for CustomParameter {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            name: f.string("Name", report)?,
            description: f.string("Description", report),
            documentation_url: f.string("DocumentationURL", report),
            required: f.bool("Required", report),
            example_values: f.nested_list("ExampleValues", report).unwrap_or_default(),
        })
    }
}

/// Sample value of a custom parameter, inline or stored elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExampleValue {
    pub description: Option<String>,
    pub value: Option<serde_json::Value>,
    /// URL of the example when it is not given inline.
    pub external_value: Option<String>,
}

impl Decode for ExampleValue {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            description: f.string("Description", report),
            value: f.json("Value", report),
            external_value: f.string("ExternalValue", report),
        })
    }
}

/// Query options a service supports on a modification request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModificationQueryOptions {
    pub expand_supported: Option<bool>,
    pub select_supported: Option<bool>,
    pub compute_supported: Option<bool>,
    pub filter_supported: Option<bool>,
    pub search_supported: Option<bool>,
    pub sort_supported: Option<bool>,
}

impl ModificationQueryOptions {
    #[must_use]
    pub fn is_select_supported(&self) -> bool {
        self.select_supported.unwrap_or(false)
    }

    #[must_use]
    pub fn is_expand_supported(&self) -> bool {
        self.expand_supported.unwrap_or(false)
    }
}

impl Decode for ModificationQueryOptions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            expand_supported: f.bool("ExpandSupported", report),
            select_supported: f.bool("SelectSupported", report),
            compute_supported: f.bool("ComputeSupported", report),
            filter_supported: f.bool("FilterSupported", report),
            search_supported: f.bool("SearchSupported", report),
            sort_supported: f.bool("SortSupported", report),
        })
    }
}

/// `Permissions` collection, falling back to a single `Permission` record.
pub(super) fn permissions(f: &Fields<'_>, report: &mut FieldReport) -> Option<Vec<Permission>> {
    f.nested_list("Permissions", report)
        .or_else(|| f.nested::<Permission>("Permission", report).map(|p| vec![p]))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::capabilities::Term;
    use edm_model::RawRecord;

    #[test]
    fn test_permission_with_scopes() {
        let value = RawValue::Record(
            RawRecord::new().with("SchemeName", "Delegated").with(
                "Scopes",
                RawValue::Collection(vec![
                    RawRecord::new().with("Scope", "Books.Read").into(),
                    RawRecord::new()
                        .with("Scope", "Books.ReadAll")
                        .with("RestrictedProperties", "*")
                        .into(),
                    RawRecord::new().with("RestrictedProperties", "Title").into(),
                ]),
            ),
        );
        let mut report = FieldReport::new(Term::ReadRestrictions, "NS.Default/Books");
        let permission = Permission::decode_at(&value, "Permission", &mut report).unwrap();
        assert_eq!(permission.scheme_name.as_deref(), Some("Delegated"));
        assert_eq!(
            permission.scope_names().collect::<Vec<_>>(),
            ["Books.Read", "Books.ReadAll"]
        );
        assert_eq!(permission.scopes[1].restricted_properties.as_deref(), Some("*"));
        assert!(report.issues().is_empty());
    }

    #[test]
    fn test_custom_parameter_requires_name() {
        let mut report = FieldReport::new(Term::ReadRestrictions, "NS.Default/Books");
        let named = RawValue::Record(
            RawRecord::new()
                .with("Name", "ConsistencyLevel")
                .with("Required", true),
        );
        let unnamed = RawValue::Record(RawRecord::new().with("Description", "x"));
        let header = CustomParameter::decode_at(&named, "CustomHeaders[0]", &mut report).unwrap();
        assert!(header.is_required());
        assert!(CustomParameter::decode_at(&unnamed, "CustomHeaders[1]", &mut report).is_none());
    }

    #[test]
    fn test_custom_parameter_example_values() {
        let value = RawValue::from(serde_json::json!({
            "Name": "ConsistencyLevel",
            "ExampleValues": [
                { "Description": "Eventual consistency", "Value": "eventual" },
                { "ExternalValue": "https://example.org/levels.json" },
                { "Value": { "Level": 2 } },
                "bare"
            ]
        }));
        let mut report = FieldReport::new(Term::ReadRestrictions, "NS.Default/Books");
        let header = CustomParameter::decode_at(&value, "CustomHeaders[0]", &mut report).unwrap();
        assert_eq!(
            header.example_values,
            [
                ExampleValue {
                    description: Some("Eventual consistency".to_owned()),
                    value: Some(serde_json::json!("eventual")),
                    external_value: None,
                },
                ExampleValue {
                    external_value: Some("https://example.org/levels.json".to_owned()),
                    ..ExampleValue::default()
                },
                ExampleValue {
                    value: Some(serde_json::json!({ "Level": 2 })),
                    ..ExampleValue::default()
                },
            ]
        );
        assert_eq!(report.issues().len(), 1);
        assert_eq!(report.issues()[0].field, "CustomHeaders[0].ExampleValues[3]");
    }

    #[test]
    fn test_modification_options_default_to_unsupported() {
        let options = ModificationQueryOptions::default();
        assert!(!options.is_select_supported());
        assert!(!options.is_expand_supported());
    }
}

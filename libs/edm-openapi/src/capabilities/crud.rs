//! Read, insert, update and delete restrictions.

use edm_model::RawValue;

use super::common::{CustomParameter, ModificationQueryOptions, Permission, permissions};
use super::{Decode, FieldReport, Fields};

pub(super) fn contains(list: Option<&[String]>, name: &str) -> bool {
    list.is_some_and(|l| l.iter().any(|p| p == name))
}

/// Read restriction fields shared by the collection and by-key records.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadRestrictionsBase {
    pub readable: Option<bool>,
    pub permissions: Option<Vec<Permission>>,
    pub custom_headers: Option<Vec<CustomParameter>>,
    pub custom_query_options: Option<Vec<CustomParameter>>,
    pub description: Option<String>,
}

impl ReadRestrictionsBase {
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.readable.unwrap_or(true)
    }
}

impl Decode for ReadRestrictionsBase {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            readable: f.bool("Readable", report),
            permissions: permissions(&f, report),
            custom_headers: f.nested_list("CustomHeaders", report),
            custom_query_options: f.nested_list("CustomQueryOptions", report),
            description: f.string("Description", report),
        })
    }
}

/// `ReadRestrictions`: collection reads plus an optional by-key override.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadRestrictions {
    pub base: ReadRestrictionsBase,
    pub read_by_key: Option<ReadRestrictionsBase>,
}

impl ReadRestrictions {
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.base.is_readable()
    }

    /// Readability of a single entity addressed by key. The by-key record,
    /// when present, decides alone.
    #[must_use]
    pub fn is_readable_by_key(&self) -> bool {
        self.read_by_key
            .as_ref()
            .map_or_else(|| self.is_readable(), ReadRestrictionsBase::is_readable)
    }

    /// Record governing a by-key read: the by-key record or the collection one.
    #[must_use]
    pub fn by_key(&self) -> &ReadRestrictionsBase {
        self.read_by_key.as_ref().unwrap_or(&self.base)
    }
}

impl Decode for ReadRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let base = ReadRestrictionsBase::decode_at(value, field, report)?;
        let f = Fields::at(value, field, report)?;
        Some(Self {
            base,
            read_by_key: f.nested("ReadByKeyRestrictions", report),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InsertRestrictions {
    pub insertable: Option<bool>,
    pub non_insertable_properties: Option<Vec<String>>,
    pub non_insertable_navigation_properties: Option<Vec<String>>,
    pub max_levels: Option<i64>,
    pub permissions: Option<Vec<Permission>>,
    pub query_options: Option<ModificationQueryOptions>,
    pub custom_headers: Option<Vec<CustomParameter>>,
    pub custom_query_options: Option<Vec<CustomParameter>>,
    pub description: Option<String>,
}

impl InsertRestrictions {
    #[must_use]
    pub fn is_insertable(&self) -> bool {
        self.insertable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_non_insertable_navigation_property(&self, path: &str) -> bool {
        contains(self.non_insertable_navigation_properties.as_deref(), path)
    }
}

impl Decode for InsertRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            insertable: f.bool("Insertable", report),
            non_insertable_properties: f.paths("NonInsertableProperties", report),
            non_insertable_navigation_properties: f
                .paths("NonInsertableNavigationProperties", report),
            max_levels: f.int("MaxLevels", report),
            permissions: permissions(&f, report),
            query_options: f.nested("QueryOptions", report),
            custom_headers: f.nested_list("CustomHeaders", report),
            custom_query_options: f.nested_list("CustomQueryOptions", report),
            description: f.string("Description", report),
        })
    }
}

/// HTTP method a service uses for updates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

impl UpdateMethod {
    #[must_use]
    pub const fn method(self) -> http::Method {
        match self {
            Self::Patch => http::Method::PATCH,
            Self::Put => http::Method::PUT,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateRestrictions {
    pub updatable: Option<bool>,
    pub upsertable: Option<bool>,
    pub update_method: Option<UpdateMethod>,
    pub non_updatable_navigation_properties: Option<Vec<String>>,
    pub max_levels: Option<i64>,
    pub permissions: Option<Vec<Permission>>,
    pub query_options: Option<ModificationQueryOptions>,
    pub custom_headers: Option<Vec<CustomParameter>>,
    pub custom_query_options: Option<Vec<CustomParameter>>,
    pub description: Option<String>,
}

impl UpdateRestrictions {
    #[must_use]
    pub fn is_updatable(&self) -> bool {
        self.updatable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_upsertable(&self) -> bool {
        self.upsertable.unwrap_or(false)
    }

    #[must_use]
    pub fn update_method(&self) -> UpdateMethod {
        self.update_method.unwrap_or_default()
    }

    #[must_use]
    pub fn is_non_updatable_navigation_property(&self, path: &str) -> bool {
        contains(self.non_updatable_navigation_properties.as_deref(), path)
    }
}

impl Decode for UpdateRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        let update_method = match f.enum_member("UpdateMethod", report) {
            Some(m) if m.eq_ignore_ascii_case("PUT") => Some(UpdateMethod::Put),
            Some(m) if m.eq_ignore_ascii_case("PATCH") => Some(UpdateMethod::Patch),
            Some(_) => {
                if let Some(raw) = value_of(value, "UpdateMethod") {
                    report.mismatch(&join(field, "UpdateMethod"), "PATCH or PUT", raw);
                }
                None
            }
            None => None,
        };
        Some(Self {
            updatable: f.bool("Updatable", report),
            upsertable: f.bool("Upsertable", report),
            update_method,
            non_updatable_navigation_properties: f
                .paths("NonUpdatableNavigationProperties", report),
            max_levels: f.int("MaxLevels", report),
            permissions: permissions(&f, report),
            query_options: f.nested("QueryOptions", report),
            custom_headers: f.nested_list("CustomHeaders", report),
            custom_query_options: f.nested_list("CustomQueryOptions", report),
            description: f.string("Description", report),
        })
    }
}

fn value_of<'a>(value: &'a RawValue, name: &str) -> Option<&'a RawValue> {
    match value {
        RawValue::Record(r) => r.get(name),
        _ => None,
    }
}

fn join(location: &str, name: &str) -> String {
    if location.is_empty() {
        name.to_owned()
    } else {
        format!("{location}.{name}")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteRestrictions {
    pub deletable: Option<bool>,
    pub non_deletable_navigation_properties: Option<Vec<String>>,
    pub max_levels: Option<i64>,
    pub permissions: Option<Vec<Permission>>,
    pub custom_headers: Option<Vec<CustomParameter>>,
    pub custom_query_options: Option<Vec<CustomParameter>>,
    pub description: Option<String>,
}

impl DeleteRestrictions {
    #[must_use]
    pub fn is_deletable(&self) -> bool {
        self.deletable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_non_deletable_navigation_property(&self, path: &str) -> bool {
        contains(self.non_deletable_navigation_properties.as_deref(), path)
    }
}

impl Decode for DeleteRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            deletable: f.bool("Deletable", report),
            non_deletable_navigation_properties: f
                .paths("NonDeletableNavigationProperties", report),
            max_levels: f.int("MaxLevels", report),
            permissions: permissions(&f, report),
            custom_headers: f.nested_list("CustomHeaders", report),
            custom_query_options: f.nested_list("CustomQueryOptions", report),
            description: f.string("Description", report),
        })
    }
}

//! Query option capabilities: count, filter, search, sort, select, expand
//! and the boolean tag terms.

use edm_model::RawValue;

use super::crud::contains;
use super::decode::tag_value;
use super::{Decode, FieldReport, Fields};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountRestrictions {
    pub countable: Option<bool>,
    pub non_countable_properties: Option<Vec<String>>,
    pub non_countable_navigation_properties: Option<Vec<String>>,
}

impl CountRestrictions {
    #[must_use]
    pub fn is_countable(&self) -> bool {
        self.countable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_non_countable_property(&self, path: &str) -> bool {
        contains(self.non_countable_properties.as_deref(), path)
    }

    #[must_use]
    pub fn is_non_countable_navigation_property(&self, path: &str) -> bool {
        contains(self.non_countable_navigation_properties.as_deref(), path)
    }
}

impl Decode for CountRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            countable: f.bool("Countable", report),
            non_countable_properties: f.paths("NonCountableProperties", report),
            non_countable_navigation_properties: f
                .paths("NonCountableNavigationProperties", report),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterRestrictions {
    pub filterable: Option<bool>,
    pub requires_filter: Option<bool>,
    pub required_properties: Option<Vec<String>>,
    pub non_filterable_properties: Option<Vec<String>>,
    pub max_levels: Option<i64>,
}

impl FilterRestrictions {
    #[must_use]
    pub fn is_filterable(&self) -> bool {
        self.filterable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_requires_filter(&self) -> bool {
        self.requires_filter.unwrap_or(false)
    }

    #[must_use]
    pub fn is_required_property(&self, path: &str) -> bool {
        contains(self.required_properties.as_deref(), path)
    }

    #[must_use]
    pub fn is_non_filterable_property(&self, path: &str) -> bool {
        contains(self.non_filterable_properties.as_deref(), path)
    }
}

impl Decode for FilterRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            filterable: f.bool("Filterable", report),
            requires_filter: f.bool("RequiresFilter", report),
            required_properties: f.paths("RequiredProperties", report),
            non_filterable_properties: f.paths("NonFilterableProperties", report),
            max_levels: f.int("MaxLevels", report),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchRestrictions {
    pub searchable: Option<bool>,
    /// Enum flags member list, e.g. `AND,phrase`.
    pub unsupported_expressions: Option<String>,
}

impl SearchRestrictions {
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        self.searchable.unwrap_or(true)
    }
}

impl Decode for SearchRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            searchable: f.bool("Searchable", report),
            unsupported_expressions: f
                .enum_member("UnsupportedExpressions", report)
                .map(str::to_owned),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortRestrictions {
    pub sortable: Option<bool>,
    pub ascending_only_properties: Option<Vec<String>>,
    pub descending_only_properties: Option<Vec<String>>,
    pub non_sortable_properties: Option<Vec<String>>,
}

impl SortRestrictions {
    #[must_use]
    pub fn is_sortable(&self) -> bool {
        self.sortable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_ascending_only_property(&self, path: &str) -> bool {
        contains(self.ascending_only_properties.as_deref(), path)
    }

    #[must_use]
    pub fn is_descending_only_property(&self, path: &str) -> bool {
        contains(self.descending_only_properties.as_deref(), path)
    }

    #[must_use]
    pub fn is_non_sortable_property(&self, path: &str) -> bool {
        contains(self.non_sortable_properties.as_deref(), path)
    }
}

impl Decode for SortRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            sortable: f.bool("Sortable", report),
            ascending_only_properties: f.paths("AscendingOnlyProperties", report),
            descending_only_properties: f.paths("DescendingOnlyProperties", report),
            non_sortable_properties: f.paths("NonSortableProperties", report),
        })
    }
}

/// `$select` support and the query options allowed inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectSupport {
    pub supported: Option<bool>,
    pub expandable: Option<bool>,
    pub filterable: Option<bool>,
    pub searchable: Option<bool>,
    pub top_supported: Option<bool>,
    pub skip_supported: Option<bool>,
    pub compute_supported: Option<bool>,
    pub countable: Option<bool>,
    pub sortable: Option<bool>,
}

impl SelectSupport {
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.supported.unwrap_or(true)
    }
}

impl Decode for SelectSupport {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            supported: f.bool("Supported", report),
            expandable: f.bool("Expandable", report),
            filterable: f.bool("Filterable", report),
            searchable: f.bool("Searchable", report),
            top_supported: f.bool("TopSupported", report),
            skip_supported: f.bool("SkipSupported", report),
            compute_supported: f.bool("ComputeSupported", report),
            countable: f.bool("Countable", report),
            sortable: f.bool("Sortable", report),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandRestrictions {
    pub expandable: Option<bool>,
    pub non_expandable_properties: Option<Vec<String>>,
    /// `-1` means unbounded.
    pub max_levels: Option<i64>,
}

impl ExpandRestrictions {
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        self.expandable.unwrap_or(true)
    }

    #[must_use]
    pub fn is_non_expandable_property(&self, path: &str) -> bool {
        contains(self.non_expandable_properties.as_deref(), path)
    }

    /// Maximum number of `$expand` levels, `None` when unbounded.
    #[must_use]
    pub fn max_levels_bound(&self) -> Option<u32> {
        self.max_levels
            .filter(|levels| *levels >= 0)
            .and_then(|levels| u32::try_from(levels).ok())
    }
}

impl Decode for ExpandRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            expandable: f.bool("Expandable", report),
            non_expandable_properties: f.paths("NonExpandableProperties", report),
            max_levels: f.int("MaxLevels", report),
        })
    }
}

macro_rules! tag_term {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name(pub Option<bool>);

        impl $name {
            /// Tag value; an unannotated element supports the feature.
            #[must_use]
            pub fn is_supported(self) -> bool {
                self.0.unwrap_or(true)
            }
        }

        impl Decode for $name {
            fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
                tag_value(value, field, report).map(|b| Self(Some(b)))
            }
        }
    };
}

tag_term!(
    /// Whether entities of a collection can be addressed by key.
    IndexableByKey
);
tag_term!(
    /// Whether `$top` is supported.
    TopSupported
);
tag_term!(
    /// Whether `$skip` is supported.
    SkipSupported
);

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::capabilities::{Capability, Term};
    use edm_model::RawRecord;

    #[test]
    fn test_absent_records_exclude_nothing() {
        assert!(CountRestrictions::default().is_countable());
        assert!(!CountRestrictions::default().is_non_countable_property("Title"));
        assert!(FilterRestrictions::default().is_filterable());
        assert!(!FilterRestrictions::default().is_non_filterable_property("Title"));
        assert!(!FilterRestrictions::default().is_requires_filter());
        assert!(SortRestrictions::default().is_sortable());
        assert!(!SortRestrictions::default().is_non_sortable_property("Title"));
        assert!(SearchRestrictions::default().is_searchable());
        assert!(SelectSupport::default().is_supported());
        assert!(ExpandRestrictions::default().is_expandable());
        assert!(!ExpandRestrictions::default().is_non_expandable_property("Author"));
        assert!(TopSupported::default().is_supported());
    }

    #[test]
    fn test_filter_restrictions_decode() {
        let value = RawValue::Record(
            RawRecord::new()
                .with("Filterable", true)
                .with("RequiresFilter", true)
                .with("RequiredProperties", RawValue::paths(["Id"]))
                .with("NonFilterableProperties", RawValue::paths(["Title", "Isbn"])),
        );
        let mut report = FieldReport::new(Term::FilterRestrictions, "NS.Default/Books");
        let filter = FilterRestrictions::decode(&value, &mut report).unwrap();
        assert!(filter.is_requires_filter());
        assert!(filter.is_required_property("Id"));
        assert!(filter.is_non_filterable_property("Isbn"));
        assert!(!filter.is_non_filterable_property("Id"));
    }

    #[test]
    fn test_expand_max_levels() {
        let bounded = ExpandRestrictions {
            max_levels: Some(2),
            ..ExpandRestrictions::default()
        };
        let unbounded = ExpandRestrictions {
            max_levels: Some(-1),
            ..ExpandRestrictions::default()
        };
        assert_eq!(bounded.max_levels_bound(), Some(2));
        assert_eq!(unbounded.max_levels_bound(), None);
        assert_eq!(ExpandRestrictions::default().max_levels_bound(), None);
    }

    #[test]
    fn test_tag_terms() {
        let mut report = FieldReport::new(Term::IndexableByKey, "NS.Default/Books");
        let tag = IndexableByKey::decode(&RawValue::Bool(false), &mut report).unwrap();
        assert!(!tag.is_supported());
        let bare = TopSupported::decode(&RawValue::Null, &mut report).unwrap();
        assert!(bare.is_supported());
        assert!(SkipSupported::decode(&RawValue::String("x".to_owned()), &mut report).is_none());
    }
}

//! Navigation restrictions.

use edm_model::RawValue;

use super::crud::{DeleteRestrictions, InsertRestrictions, ReadRestrictions, UpdateRestrictions};
use super::query::{CountRestrictions, FilterRestrictions, SearchRestrictions, SortRestrictions};
use super::{Decode, FieldReport, Fields};

/// How far navigation properties may be followed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigability {
    /// Navigation properties can be followed recursively.
    Recursive,
    /// Only one level of navigation.
    Single,
    /// Not navigable.
    None,
}

impl Navigability {
    fn parse(member: &str) -> Option<Self> {
        match member {
            "Recursive" => Some(Self::Recursive),
            "Single" => Some(Self::Single),
            "None" => Some(Self::None),
            _ => None,
        }
    }

    /// Whether a navigation chain of `depth` segments is allowed.
    #[must_use]
    pub const fn allows_depth(self, depth: usize) -> bool {
        match self {
            Self::Recursive => true,
            Self::Single => depth <= 1,
            Self::None => false,
        }
    }
}

fn navigability(f: &Fields<'_>, report: &mut FieldReport, location: &str) -> Option<Navigability> {
    let member = f.enum_member("Navigability", report)?;
    let parsed = Navigability::parse(member);
    if parsed.is_none() {
        report.mismatch(
            &if location.is_empty() {
                "Navigability".to_owned()
            } else {
                format!("{location}.Navigability")
            },
            "Recursive, Single or None",
            &RawValue::EnumMember(member.to_owned()),
        );
    }
    parsed
}

/// Restrictions for one navigation property path, overriding the
/// restrictions of the navigation target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationPropertyRestriction {
    pub navigation_property: String,
    pub navigability: Option<Navigability>,
    pub read_restrictions: Option<ReadRestrictions>,
    pub insert_restrictions: Option<InsertRestrictions>,
    pub update_restrictions: Option<UpdateRestrictions>,
    pub delete_restrictions: Option<DeleteRestrictions>,
    pub count_restrictions: Option<CountRestrictions>,
    pub filter_restrictions: Option<FilterRestrictions>,
    pub search_restrictions: Option<SearchRestrictions>,
    pub sort_restrictions: Option<SortRestrictions>,
    pub top_supported: Option<bool>,
    pub skip_supported: Option<bool>,
    pub indexable_by_key: Option<bool>,
}

impl Decode for NavigationPropertyRestriction {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            navigation_property: f.path_value("NavigationProperty", report)?,
            navigability: navigability(&f, report, field),
            read_restrictions: f.nested("ReadRestrictions", report),
            insert_restrictions: f.nested("InsertRestrictions", report),
            update_restrictions: f.nested("UpdateRestrictions", report),
            delete_restrictions: f.nested("DeleteRestrictions", report),
            count_restrictions: f.nested("CountRestrictions", report),
            filter_restrictions: f.nested("FilterRestrictions", report),
            search_restrictions: f.nested("SearchRestrictions", report),
            sort_restrictions: f.nested("SortRestrictions", report),
            top_supported: f.bool("TopSupported", report),
            skip_supported: f.bool("SkipSupported", report),
            indexable_by_key: f.bool("IndexableByKey", report),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationRestrictions {
    pub navigability: Option<Navigability>,
    pub restricted_properties: Option<Vec<NavigationPropertyRestriction>>,
}

impl NavigationRestrictions {
    /// Default navigability; unannotated elements navigate recursively.
    #[must_use]
    pub fn navigability(&self) -> Navigability {
        self.navigability.unwrap_or(Navigability::Recursive)
    }

    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.navigability() != Navigability::None
    }

    /// Entry for the navigation property path `path`, e.g. `Author` or
    /// `Author/Books`.
    #[must_use]
    pub fn restriction_for(&self, path: &str) -> Option<&NavigationPropertyRestriction> {
        self.restricted_properties
            .as_deref()?
            .iter()
            .find(|r| r.navigation_property == path)
    }

    /// Whether `path` has an entry that makes it non-navigable.
    #[must_use]
    pub fn is_restricted_property(&self, path: &str) -> bool {
        self.restriction_for(path)
            .is_some_and(|r| r.navigability == Some(Navigability::None))
    }

    /// Whether the navigation chain `path` of `depth` segments may be
    /// followed. An entry for the full path wins, then the entry for its
    /// first segment, then the element-wide navigability.
    #[must_use]
    pub fn allows_path(&self, path: &str, depth: usize) -> bool {
        let head = path.split('/').next().unwrap_or(path);
        let entry = self
            .restriction_for(path)
            .and_then(|r| r.navigability)
            .or_else(|| self.restriction_for(head).and_then(|r| r.navigability));
        entry.unwrap_or_else(|| self.navigability()).allows_depth(depth)
    }
}

impl Decode for NavigationRestrictions {
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self> {
        let f = Fields::at(value, field, report)?;
        Some(Self {
            navigability: navigability(&f, report, field),
            restricted_properties: f.nested_list("RestrictedProperties", report),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::capabilities::{Capability, Term};
    use edm_model::RawRecord;

    fn decode(value: &RawValue) -> (Option<NavigationRestrictions>, FieldReport) {
        let mut report = FieldReport::new(Term::NavigationRestrictions, "NS.Default/Books");
        (NavigationRestrictions::decode(value, &mut report), report)
    }

    #[test]
    fn test_unannotated_is_recursive() {
        let nav = NavigationRestrictions::default();
        assert!(nav.is_navigable());
        assert!(nav.allows_path("Author/Books/Author", 3));
        assert!(!nav.is_restricted_property("Author"));
    }

    #[test]
    fn test_restricted_properties() {
        let value = RawValue::Record(
            RawRecord::new()
                .with(
                    "Navigability",
                    RawValue::enum_member("Org.OData.Capabilities.V1.NavigationType/Single"),
                )
                .with(
                    "RestrictedProperties",
                    RawValue::Collection(vec![
                        RawRecord::new()
                            .with("NavigationProperty", RawValue::path("Author"))
                            .with(
                                "Navigability",
                                RawValue::enum_member(
                                    "Org.OData.Capabilities.V1.NavigationType/None",
                                ),
                            )
                            .into(),
                        RawRecord::new()
                            .with("NavigationProperty", RawValue::path("Chapters"))
                            .with(
                                "Navigability",
                                RawValue::enum_member(
                                    "Org.OData.Capabilities.V1.NavigationType/Recursive",
                                ),
                            )
                            .with("DeleteRestrictions", RawRecord::new().with("Deletable", false))
                            .into(),
                    ]),
                ),
        );
        let (nav, report) = decode(&value);
        let nav = nav.unwrap();
        assert!(report.issues().is_empty());
        assert_eq!(nav.navigability(), Navigability::Single);
        assert!(nav.is_restricted_property("Author"));
        assert!(!nav.allows_path("Author", 1));
        assert!(nav.allows_path("Publisher", 1));
        assert!(!nav.allows_path("Publisher/Books", 2));
        assert!(nav.allows_path("Chapters/Pages", 2));

        let chapters = nav.restriction_for("Chapters").unwrap();
        assert!(!chapters.delete_restrictions.as_ref().unwrap().is_deletable());
    }

    #[test]
    fn test_unknown_navigability_is_reported() {
        let value = RawValue::Record(
            RawRecord::new().with("Navigability", RawValue::enum_member("Sometimes")),
        );
        let (nav, report) = decode(&value);
        assert_eq!(nav.unwrap().navigability, None);
        assert_eq!(report.issues()[0].field, "Navigability");
    }
}

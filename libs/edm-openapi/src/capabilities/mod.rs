//! Typed records of the `Org.OData.Capabilities.V1` vocabulary.
//!
//! Every supported term has exactly one record type. Records keep the raw
//! annotation fields as `Option`s so "not annotated" stays distinguishable
//! from an explicit value; behavioral accessors such as
//! [`DeleteRestrictions::is_deletable`] apply the documented defaults.
//!
//! Decoding is lenient: a field of the wrong shape is reported through
//! [`FieldReport`] and treated as absent, the rest of the record survives.

pub mod common;
pub mod crud;
mod decode;
pub mod navigation;
pub mod query;

use std::fmt;

use edm_model::RawValue;

pub use common::{CustomParameter, ExampleValue, ModificationQueryOptions, Permission, Scope};
pub use crud::{
    DeleteRestrictions, InsertRestrictions, ReadRestrictions, ReadRestrictionsBase,
    UpdateMethod, UpdateRestrictions,
};
pub use decode::{DecodeIssue, FieldReport, Fields};
pub use navigation::{Navigability, NavigationPropertyRestriction, NavigationRestrictions};
pub use query::{
    CountRestrictions, ExpandRestrictions, FilterRestrictions, IndexableByKey, SearchRestrictions,
    SelectSupport, SkipSupported, SortRestrictions, TopSupported,
};

/// Namespace of the capabilities vocabulary.
pub const VOCABULARY_NAMESPACE: &str = "Org.OData.Capabilities.V1";

macro_rules! terms {
    ($($variant:ident),+ $(,)?) => {
        /// Supported capability terms.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Term {
            $($variant),+
        }

        impl Term {
            pub const ALL: &'static [Term] = &[$(Term::$variant),+];

            /// Unqualified term name, e.g. `ReadRestrictions`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }

            /// Qualified term name as used by annotations.
            #[must_use]
            pub const fn qualified_name(self) -> &'static str {
                match self {
                    $(Self::$variant => concat!("Org.OData.Capabilities.V1.", stringify!($variant))),+
                }
            }
        }
    };
}

terms!(
    ReadRestrictions,
    InsertRestrictions,
    UpdateRestrictions,
    DeleteRestrictions,
    CountRestrictions,
    FilterRestrictions,
    SearchRestrictions,
    SortRestrictions,
    SelectSupport,
    ExpandRestrictions,
    NavigationRestrictions,
    IndexableByKey,
    TopSupported,
    SkipSupported,
);

impl Term {
    #[must_use]
    pub fn from_qualified_name(name: &str) -> Option<Self> {
        let simple = name
            .strip_prefix(VOCABULARY_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))?;
        Self::ALL.iter().copied().find(|t| t.name() == simple)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}

/// Structural decoding of one value, located at `field` inside the annotation.
pub trait Decode: Sized {
    /// Returns `None` when `value` does not have the expected top-level shape.
    fn decode_at(value: &RawValue, field: &str, report: &mut FieldReport) -> Option<Self>;
}

/// A capability record bound to its vocabulary term.
pub trait Capability: Decode + Default + Clone + fmt::Debug + Send + Sync + 'static {
    const TERM: Term;

    /// Decode a whole annotation value for [`Self::TERM`].
    fn decode(value: &RawValue, report: &mut FieldReport) -> Option<Self> {
        Self::decode_at(value, "", report)
    }

    fn from_record(record: &CapabilityRecord) -> Option<&Self>;

    fn into_record(self) -> CapabilityRecord;
}

/// Type-erased decoder stored in the registry.
pub type Decoder = fn(&RawValue, &mut FieldReport) -> Option<CapabilityRecord>;

fn decode_erased<T: Capability>(
    value: &RawValue,
    report: &mut FieldReport,
) -> Option<CapabilityRecord> {
    T::decode(value, report).map(T::into_record)
}

macro_rules! capability_records {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        /// Decoded record of any supported term.
        #[derive(Clone, Debug, PartialEq)]
        pub enum CapabilityRecord {
            $($variant($ty)),+
        }

        impl CapabilityRecord {
            #[must_use]
            pub const fn term(&self) -> Term {
                match self {
                    $(Self::$variant(_) => Term::$variant),+
                }
            }
        }

        /// Decoder registered for `term`.
        #[must_use]
        pub fn decoder(term: Term) -> Decoder {
            match term {
                $(Term::$variant => decode_erased::<$ty> as Decoder),+
            }
        }

        $(
            impl Capability for $ty {
                const TERM: Term = Term::$variant;

                fn from_record(record: &CapabilityRecord) -> Option<&Self> {
                    match record {
                        CapabilityRecord::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_record(self) -> CapabilityRecord {
                    CapabilityRecord::$variant(self)
                }
            }
        )+
    };
}

capability_records!(
    ReadRestrictions => ReadRestrictions,
    InsertRestrictions => InsertRestrictions,
    UpdateRestrictions => UpdateRestrictions,
    DeleteRestrictions => DeleteRestrictions,
    CountRestrictions => CountRestrictions,
    FilterRestrictions => FilterRestrictions,
    SearchRestrictions => SearchRestrictions,
    SortRestrictions => SortRestrictions,
    SelectSupport => SelectSupport,
    ExpandRestrictions => ExpandRestrictions,
    NavigationRestrictions => NavigationRestrictions,
    IndexableByKey => IndexableByKey,
    TopSupported => TopSupported,
    SkipSupported => SkipSupported,
);

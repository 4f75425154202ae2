//! Typed handles into the model arenas.
//!
//! Every element of an [`EdmModel`](crate::EdmModel) lives in a `Vec` owned by
//! the model and is addressed by a small copyable id. Ids are only meaningful
//! for the model that issued them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(
    /// Entity type handle.
    EntityTypeId
);
arena_id!(
    /// Entity set handle.
    EntitySetId
);
arena_id!(
    /// Singleton handle.
    SingletonId
);
arena_id!(
    /// Action or function handle.
    OperationId
);
arena_id!(
    /// Entity container handle.
    ContainerId
);

/// Navigation property handle: the declaring entity type plus the position
/// in its declared navigation list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NavRef {
    pub declaring: EntityTypeId,
    pub index: u32,
}

/// Operation import handle: owning container plus position in its import list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportRef {
    pub container: ContainerId,
    pub index: u32,
}

/// Opaque reference to an annotatable model element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementRef {
    Container(ContainerId),
    EntitySet(EntitySetId),
    Singleton(SingletonId),
    EntityType(EntityTypeId),
    NavigationProperty(NavRef),
    Operation(OperationId),
    OperationImport(ImportRef),
}

impl ElementRef {
    /// Short kind label, used in log fields and diagnostics.
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::EntitySet(_) => "entity_set",
            Self::Singleton(_) => "singleton",
            Self::EntityType(_) => "entity_type",
            Self::NavigationProperty(_) => "navigation_property",
            Self::Operation(_) => "operation",
            Self::OperationImport(_) => "operation_import",
        }
    }
}

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one built model.
///
/// Two models never share an id, even when they were built from the same
/// document; caches keyed on a model compare these ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids_are_unique() {
        let a = ModelId::next();
        let b = ModelId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn test_element_kind_labels() {
        assert_eq!(ElementRef::EntitySet(EntitySetId(0)).kind(), "entity_set");
        assert_eq!(
            ElementRef::NavigationProperty(NavRef {
                declaring: EntityTypeId(1),
                index: 0
            })
            .kind(),
            "navigation_property"
        );
    }
}

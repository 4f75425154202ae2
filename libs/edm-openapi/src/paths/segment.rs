use edm_model::{EntitySetId, EntityTypeId, ImportRef, NavRef, OperationId, SingletonId};

/// One step of an addressable resource path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    EntitySet(EntitySetId),
    Singleton(SingletonId),
    /// Key lookup; carries the path parameter names bound to the key
    /// properties, in key order.
    Key {
        entity_type: EntityTypeId,
        parameters: Vec<String>,
    },
    Navigation(NavRef),
    TypeCast(EntityTypeId),
    Operation(OperationId),
    OperationImport(ImportRef),
    Count,
    Ref,
}

impl PathSegment {
    /// Whether no further segment may follow.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Operation(_) | Self::OperationImport(_) | Self::Count | Self::Ref
        )
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::EntitySet(_) => "entity_set",
            Self::Singleton(_) => "singleton",
            Self::Key { .. } => "key",
            Self::Navigation(_) => "navigation",
            Self::TypeCast(_) => "type_cast",
            Self::Operation(_) => "operation",
            Self::OperationImport(_) => "operation_import",
            Self::Count => "$count",
            Self::Ref => "$ref",
        }
    }
}

//! Fluent, programmatic construction of models.
//!
//! The builder accumulates a [`ModelDocument`] and resolves it on
//! [`EdmModelBuilder::build`], so programmatic and JSON-loaded models go
//! through exactly the same validation.
//!
//! ```rust
//! use edm_model::{ContainerDef, EdmModelBuilder, EntityTypeDef};
//!
//! let model = EdmModelBuilder::new("NS")
//!     .entity_type(EntityTypeDef::new("Book").key(["Id"]).property("Id", "Edm.Int32"))
//!     .container(ContainerDef::new("Default").entity_set("Books", "Book"))
//!     .build()
//!     .unwrap();
//! assert!(model.find_entity_set("Books").is_some());
//! ```

use std::collections::BTreeMap;

use crate::document::{
    AnnotationDef, ContainerDef, EntitySetDef, EntityTypeDef, ModelDocument,
    NavigationPropertyDef, OperationDef, OperationImportDef, ParameterDef, PropertyDef,
    ReturnTypeDef,
};
use crate::error::ModelError;
use crate::model::{EdmModel, OperationKind};
use crate::value::RawValue;

#[derive(Clone, Debug, Default)]
#[must_use]
pub struct EdmModelBuilder {
    doc: ModelDocument,
}

impl EdmModelBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            doc: ModelDocument {
                namespace: namespace.into(),
                ..ModelDocument::default()
            },
        }
    }

    pub fn entity_type(mut self, def: EntityTypeDef) -> Self {
        self.doc.entity_types.push(def);
        self
    }

    pub fn operation(mut self, def: OperationDef) -> Self {
        self.doc.operations.push(def);
        self
    }

    pub fn container(mut self, def: ContainerDef) -> Self {
        self.doc.containers.push(def);
        self
    }

    /// Attach a raw annotation to a CSDL-style target path.
    pub fn annotate(
        mut self,
        target: impl Into<String>,
        term: impl Into<String>,
        value: impl Into<RawValue>,
    ) -> Self {
        self.doc.annotations.push(AnnotationDef {
            target: target.into(),
            term: term.into(),
            value: value.into(),
        });
        self
    }

    /// # Errors
    /// Returns the first validation failure, see [`ModelDocument::into_model`].
    pub fn build(self) -> Result<EdmModel, ModelError> {
        self.doc.into_model()
    }
}

impl EntityTypeDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base_type = Some(base.into());
        self
    }

    #[must_use]
    pub const fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    #[must_use]
    pub fn key<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(PropertyDef {
            name: name.into(),
            type_name: type_name.into(),
            nullable: true,
        });
        self
    }

    /// Reference (non-containment) navigation property.
    #[must_use]
    pub fn navigation(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        collection: bool,
    ) -> Self {
        self.navigation_properties.push(NavigationPropertyDef {
            name: name.into(),
            target: target.into(),
            collection,
            contains_target: false,
            partner: None,
        });
        self
    }

    #[must_use]
    pub fn containment(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        collection: bool,
    ) -> Self {
        self.navigation_properties.push(NavigationPropertyDef {
            name: name.into(),
            target: target.into(),
            collection,
            contains_target: true,
            partner: None,
        });
        self
    }
}

impl OperationDef {
    #[must_use]
    pub fn action(name: impl Into<String>) -> Self {
        Self::with_kind(name, OperationKind::Action)
    }

    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::with_kind(name, OperationKind::Function)
    }

    fn with_kind(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bound: false,
            parameters: Vec::new(),
            return_type: None,
            composable: false,
        }
    }

    /// Make the operation bound; the binding parameter becomes the first parameter.
    #[must_use]
    pub fn bound_to(mut self, entity_type: impl Into<String>, collection: bool) -> Self {
        self.bound = true;
        self.parameters.insert(
            0,
            ParameterDef {
                name: "bindingParameter".to_owned(),
                type_name: entity_type.into(),
                collection,
                nullable: false,
            },
        );
        self
    }

    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameters.push(ParameterDef {
            name: name.into(),
            type_name: type_name.into(),
            collection: false,
            nullable: true,
        });
        self
    }

    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>, collection: bool) -> Self {
        self.return_type = Some(ReturnTypeDef {
            type_name: type_name.into(),
            collection,
        });
        self
    }
}

impl ContainerDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn entity_set(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.entity_sets.push(EntitySetDef {
            name: name.into(),
            entity_type: entity_type.into(),
            navigation_bindings: BTreeMap::new(),
        });
        self
    }

    #[must_use]
    pub fn singleton(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.singletons.push(EntitySetDef {
            name: name.into(),
            entity_type: entity_type.into(),
            navigation_bindings: BTreeMap::new(),
        });
        self
    }

    /// Bind a navigation path of the most recently added entity set.
    #[must_use]
    pub fn binding(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        if let Some(set) = self.entity_sets.last_mut() {
            set.navigation_bindings.insert(path.into(), target.into());
        }
        self
    }

    #[must_use]
    pub fn operation_import(
        mut self,
        name: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        self.operation_imports.push(OperationImportDef {
            name: name.into(),
            operation: operation.into(),
            entity_set: None,
        });
        self
    }
}

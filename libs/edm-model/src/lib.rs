#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity Data Model graph used as the input of the `OpenAPI` conversion.
//!
//! The model is built once (from a [`ModelDocument`] or through
//! [`EdmModelBuilder`]) and is immutable afterwards. Elements are addressed by
//! small arena ids; vocabulary annotations are kept as [`RawValue`] trees and
//! interpreted by consumers.
pub mod builder;
pub mod document;
pub mod error;
pub mod ids;
pub mod model;
pub mod value;

pub use builder::EdmModelBuilder;
pub use document::{
    AnnotationDef, ContainerDef, EntitySetDef, EntityTypeDef, ModelDocument,
    NavigationPropertyDef, OperationDef, OperationImportDef, ParameterDef, PropertyDef,
    ReturnTypeDef,
};
pub use error::ModelError;
pub use ids::{
    ContainerId, ElementRef, EntitySetId, EntityTypeId, ImportRef, ModelId, NavRef, OperationId,
    SingletonId,
};
pub use model::{
    BindingParameter, EdmModel, EntityContainer, EntitySet, EntityType, NavigationBinding,
    NavigationProperty, Operation, OperationImport, OperationKind, Parameter, Property,
    ReturnType, Singleton,
};
pub use value::{RawRecord, RawValue};

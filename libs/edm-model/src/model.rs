//! The immutable metadata graph.

use std::collections::{HashMap, VecDeque};
use std::iter;

use serde::Deserialize;

use crate::ids::{
    ContainerId, ElementRef, EntitySetId, EntityTypeId, ImportRef, ModelId, NavRef, OperationId,
    SingletonId,
};
use crate::value::RawValue;

/// Structural property of an entity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    /// EDM type name, e.g. `Edm.Int32` or `NS.Address`.
    pub type_name: String,
    pub nullable: bool,
}

/// Typed relationship from one entity type to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationProperty {
    pub name: String,
    pub target: EntityTypeId,
    pub collection: bool,
    /// Contained entities are only addressable through this property.
    pub contains_target: bool,
    pub partner: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EntityType {
    pub namespace: String,
    pub name: String,
    pub base: Option<EntityTypeId>,
    pub is_abstract: bool,
    /// Declared key property names; empty when the key is inherited or absent.
    pub key: Vec<String>,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
}

impl EntityType {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Target of a navigation property binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationBinding {
    pub path: String,
    pub target: ElementRef,
}

#[derive(Clone, Debug)]
pub struct EntitySet {
    pub name: String,
    pub container: ContainerId,
    pub entity_type: EntityTypeId,
    pub navigation_bindings: Vec<NavigationBinding>,
}

#[derive(Clone, Debug)]
pub struct Singleton {
    pub name: String,
    pub container: ContainerId,
    pub entity_type: EntityTypeId,
    pub navigation_bindings: Vec<NavigationBinding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Action,
    Function,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub collection: bool,
    pub nullable: bool,
}

/// First parameter of a bound operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingParameter {
    pub name: String,
    pub entity_type: EntityTypeId,
    pub collection: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnType {
    pub type_name: String,
    pub collection: bool,
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub namespace: String,
    pub name: String,
    pub kind: OperationKind,
    pub binding: Option<BindingParameter>,
    /// Non-binding parameters in declaration order.
    pub parameters: Vec<Parameter>,
    pub return_type: Option<ReturnType>,
    pub is_composable: bool,
}

impl Operation {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct OperationImport {
    pub name: String,
    pub operation: OperationId,
    pub entity_set: Option<EntitySetId>,
}

#[derive(Clone, Debug)]
pub struct EntityContainer {
    pub namespace: String,
    pub name: String,
    pub entity_sets: Vec<EntitySetId>,
    pub singletons: Vec<SingletonId>,
    pub operation_imports: Vec<OperationImport>,
}

impl EntityContainer {
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// Fully loaded, immutable metadata model.
///
/// Built through [`EdmModelBuilder`](crate::EdmModelBuilder) or a
/// [`ModelDocument`](crate::ModelDocument). All ids handed out by a model are
/// valid indices into that model only.
#[derive(Debug)]
pub struct EdmModel {
    pub(crate) id: ModelId,
    pub(crate) entity_types: Vec<EntityType>,
    pub(crate) entity_sets: Vec<EntitySet>,
    pub(crate) singletons: Vec<Singleton>,
    pub(crate) operations: Vec<Operation>,
    pub(crate) containers: Vec<EntityContainer>,
    /// Direct subtypes per entity type, declaration order.
    pub(crate) subtypes: Vec<Vec<EntityTypeId>>,
    pub(crate) annotations: HashMap<ElementRef, HashMap<String, RawValue>>,
}

impl EdmModel {
    #[must_use]
    pub const fn id(&self) -> ModelId {
        self.id
    }

    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &EntityContainer)> {
        self.containers
            .iter()
            .enumerate()
            .map(|(i, c)| (ContainerId(to_u32(i)), c))
    }

    pub fn entity_types(&self) -> impl Iterator<Item = (EntityTypeId, &EntityType)> {
        self.entity_types
            .iter()
            .enumerate()
            .map(|(i, t)| (EntityTypeId(to_u32(i)), t))
    }

    pub fn operations(&self) -> impl Iterator<Item = (OperationId, &Operation)> {
        self.operations
            .iter()
            .enumerate()
            .map(|(i, o)| (OperationId(to_u32(i)), o))
    }

    #[must_use]
    pub fn container(&self, id: ContainerId) -> &EntityContainer {
        &self.containers[id.index()]
    }

    #[must_use]
    pub fn entity_type(&self, id: EntityTypeId) -> &EntityType {
        &self.entity_types[id.index()]
    }

    #[must_use]
    pub fn entity_set(&self, id: EntitySetId) -> &EntitySet {
        &self.entity_sets[id.index()]
    }

    #[must_use]
    pub fn singleton(&self, id: SingletonId) -> &Singleton {
        &self.singletons[id.index()]
    }

    #[must_use]
    pub fn operation(&self, id: OperationId) -> &Operation {
        &self.operations[id.index()]
    }

    #[must_use]
    pub fn operation_import(&self, id: ImportRef) -> &OperationImport {
        &self.container(id.container).operation_imports[id.index as usize]
    }

    #[must_use]
    pub fn navigation(&self, nav: NavRef) -> &NavigationProperty {
        &self.entity_type(nav.declaring).navigation_properties[nav.index as usize]
    }

    #[must_use]
    pub fn find_entity_type(&self, qualified_name: &str) -> Option<EntityTypeId> {
        self.entity_types()
            .find(|(_, t)| t.qualified_name() == qualified_name)
            .map(|(id, _)| id)
    }

    #[must_use]
    pub fn find_entity_set(&self, name: &str) -> Option<EntitySetId> {
        self.entity_sets
            .iter()
            .position(|s| s.name == name)
            .map(|i| EntitySetId(to_u32(i)))
    }

    #[must_use]
    pub fn find_singleton(&self, name: &str) -> Option<SingletonId> {
        self.singletons
            .iter()
            .position(|s| s.name == name)
            .map(|i| SingletonId(to_u32(i)))
    }

    /// Navigation property declared on `ty` or inherited by it, by name.
    #[must_use]
    pub fn find_navigation(&self, ty: EntityTypeId, name: &str) -> Option<NavRef> {
        self.navigation_properties(ty)
            .into_iter()
            .find(|nav| self.navigation(*nav).name == name)
    }

    /// Base types of `ty`, most-derived first, excluding `ty` itself.
    pub fn base_types(&self, ty: EntityTypeId) -> impl Iterator<Item = EntityTypeId> + '_ {
        iter::successors(self.entity_type(ty).base, |b| self.entity_type(*b).base)
    }

    /// `ty` followed by its base types.
    pub fn type_chain(&self, ty: EntityTypeId) -> impl Iterator<Item = EntityTypeId> + '_ {
        iter::once(ty).chain(self.base_types(ty))
    }

    #[must_use]
    pub fn is_subtype_of(&self, ty: EntityTypeId, ancestor: EntityTypeId) -> bool {
        self.type_chain(ty).any(|t| t == ancestor)
    }

    /// Effective key of `ty`: the first non-empty declared key along the
    /// base-type chain.
    #[must_use]
    pub fn key(&self, ty: EntityTypeId) -> &[String] {
        self.type_chain(ty)
            .map(|t| self.entity_type(t).key.as_slice())
            .find(|k| !k.is_empty())
            .unwrap_or(&[])
    }

    /// Structural property declared on `ty` or inherited by it.
    #[must_use]
    pub fn property(&self, ty: EntityTypeId, name: &str) -> Option<&Property> {
        self.type_chain(ty)
            .find_map(|t| self.entity_type(t).properties.iter().find(|p| p.name == name))
    }

    /// All navigation properties available on `ty`: inherited ones first
    /// (root of the hierarchy first), then declared ones, each in declaration
    /// order.
    #[must_use]
    pub fn navigation_properties(&self, ty: EntityTypeId) -> Vec<NavRef> {
        let mut chain: Vec<EntityTypeId> = self.type_chain(ty).collect();
        chain.reverse();
        chain
            .into_iter()
            .flat_map(|declaring| {
                (0..self.entity_type(declaring).navigation_properties.len())
                    .map(move |i| NavRef {
                        declaring,
                        index: to_u32(i),
                    })
            })
            .collect()
    }

    /// Transitive subtypes of `ty` in breadth-first declaration order.
    #[must_use]
    pub fn derived_types(&self, ty: EntityTypeId) -> Vec<EntityTypeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<EntityTypeId> = self.subtypes[ty.index()].iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next);
            queue.extend(self.subtypes[next.index()].iter().copied());
        }
        out
    }

    /// Operations bound to `ty` (or one of its base types) with a binding
    /// parameter whose collection flag equals `collection`.
    #[must_use]
    pub fn bound_operations(&self, ty: EntityTypeId, collection: bool) -> Vec<OperationId> {
        self.operations()
            .filter(|(_, op)| {
                op.binding.as_ref().is_some_and(|b| {
                    b.collection == collection && self.is_subtype_of(ty, b.entity_type)
                })
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Entity type an element is typed as, if any.
    #[must_use]
    pub fn element_type(&self, element: ElementRef) -> Option<EntityTypeId> {
        match element {
            ElementRef::EntitySet(id) => Some(self.entity_set(id).entity_type),
            ElementRef::Singleton(id) => Some(self.singleton(id).entity_type),
            ElementRef::EntityType(id) => Some(id),
            ElementRef::NavigationProperty(nav) => Some(self.navigation(nav).target),
            ElementRef::OperationImport(import) => self
                .operation_import(import)
                .entity_set
                .map(|set| self.entity_set(set).entity_type),
            ElementRef::Container(_) | ElementRef::Operation(_) => None,
        }
    }

    /// Container owning an element, if the element lives inside one.
    #[must_use]
    pub fn container_of(&self, element: ElementRef) -> Option<ContainerId> {
        match element {
            ElementRef::Container(id) => Some(id),
            ElementRef::EntitySet(id) => Some(self.entity_set(id).container),
            ElementRef::Singleton(id) => Some(self.singleton(id).container),
            ElementRef::OperationImport(import) => Some(import.container),
            ElementRef::EntityType(_)
            | ElementRef::NavigationProperty(_)
            | ElementRef::Operation(_) => None,
        }
    }

    /// Navigation binding target declared on a set or singleton for `path`.
    #[must_use]
    pub fn navigation_binding(&self, owner: ElementRef, path: &str) -> Option<ElementRef> {
        let bindings = match owner {
            ElementRef::EntitySet(id) => &self.entity_set(id).navigation_bindings,
            ElementRef::Singleton(id) => &self.singleton(id).navigation_bindings,
            _ => return None,
        };
        bindings.iter().find(|b| b.path == path).map(|b| b.target)
    }

    /// Raw annotation for `term` (qualified name) declared directly on `element`.
    #[must_use]
    pub fn annotation(&self, element: ElementRef, term: &str) -> Option<&RawValue> {
        self.annotations.get(&element)?.get(term)
    }

    /// CSDL-style path of an element, e.g. `NS.Default/Books` or `NS.Book/Author`.
    #[must_use]
    pub fn element_name(&self, element: ElementRef) -> String {
        match element {
            ElementRef::Container(id) => self.container(id).qualified_name(),
            ElementRef::EntitySet(id) => {
                let set = self.entity_set(id);
                format!("{}/{}", self.container(set.container).qualified_name(), set.name)
            }
            ElementRef::Singleton(id) => {
                let single = self.singleton(id);
                format!(
                    "{}/{}",
                    self.container(single.container).qualified_name(),
                    single.name
                )
            }
            ElementRef::EntityType(id) => self.entity_type(id).qualified_name(),
            ElementRef::NavigationProperty(nav) => format!(
                "{}/{}",
                self.entity_type(nav.declaring).qualified_name(),
                self.navigation(nav).name
            ),
            ElementRef::Operation(id) => self.operation(id).qualified_name(),
            ElementRef::OperationImport(import) => format!(
                "{}/{}",
                self.container(import.container).qualified_name(),
                self.operation_import(import).name
            ),
        }
    }
}

pub(crate) fn to_u32(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

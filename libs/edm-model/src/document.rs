//! JSON model document and its resolution into an [`EdmModel`].
//!
//! The document is a compact, name-based description of a service model.
//! Names may be given qualified (`NS.Book`) or relative to the document
//! namespace (`Book`). Resolution validates every reference and assigns the
//! arena ids used by the rest of the crate.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::error::ModelError;
use crate::ids::{
    ContainerId, ElementRef, EntitySetId, EntityTypeId, ImportRef, ModelId, NavRef, OperationId,
    SingletonId,
};
use crate::model::{
    BindingParameter, EdmModel, EntityContainer, EntitySet, EntityType, NavigationBinding,
    NavigationProperty, Operation, OperationImport, OperationKind, Parameter, Property,
    ReturnType, Singleton, to_u32,
};
use crate::value::RawValue;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelDocument {
    pub namespace: String,
    #[serde(default)]
    pub entity_types: Vec<EntityTypeDef>,
    #[serde(default)]
    pub operations: Vec<OperationDef>,
    #[serde(default)]
    pub containers: Vec<ContainerDef>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityTypeDef {
    pub name: String,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub navigation_properties: Vec<NavigationPropertyDef>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavigationPropertyDef {
    pub name: String,
    #[serde(rename = "type")]
    pub target: String,
    #[serde(default)]
    pub collection: bool,
    #[serde(default)]
    pub contains_target: bool,
    #[serde(default)]
    pub partner: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationDef {
    pub name: String,
    pub kind: OperationKind,
    /// When set, the first parameter is the binding parameter.
    #[serde(default)]
    pub bound: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub return_type: Option<ReturnTypeDef>,
    #[serde(default)]
    pub composable: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReturnTypeDef {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub collection: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerDef {
    pub name: String,
    #[serde(default)]
    pub entity_sets: Vec<EntitySetDef>,
    #[serde(default)]
    pub singletons: Vec<EntitySetDef>,
    #[serde(default)]
    pub operation_imports: Vec<OperationImportDef>,
}

/// Entity set or singleton declaration.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntitySetDef {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Navigation property path -> set or singleton name in the same container.
    #[serde(default)]
    pub navigation_bindings: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationImportDef {
    pub name: String,
    pub operation: String,
    #[serde(default)]
    pub entity_set: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnnotationDef {
    /// CSDL-style target path.
    pub target: String,
    /// Qualified vocabulary term name.
    pub term: String,
    pub value: RawValue,
}

const fn default_true() -> bool {
    true
}

fn simple_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, simple)| simple)
}

impl ModelDocument {
    /// Parse a JSON document.
    ///
    /// # Errors
    /// Returns `ModelError::Document` when the JSON does not match the document shape.
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve every name reference and build the immutable model.
    ///
    /// # Errors
    /// Returns the first validation failure: duplicate names, unknown type,
    /// operation or binding references, base-type cycles, or annotation
    /// targets that do not name an element.
    pub fn into_model(self) -> Result<EdmModel, ModelError> {
        Resolver::new(self.namespace.clone()).resolve(self)
    }
}

impl EdmModel {
    /// Parse and resolve a JSON model document.
    ///
    /// # Errors
    /// See [`ModelDocument::from_json_str`] and [`ModelDocument::into_model`].
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        ModelDocument::from_json_str(json)?.into_model()
    }
}

struct Resolver {
    namespace: String,
    types_by_name: HashMap<String, EntityTypeId>,
}

impl Resolver {
    fn new(namespace: String) -> Self {
        Self {
            namespace,
            types_by_name: HashMap::new(),
        }
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_owned()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }

    fn type_ref(&self, name: &str, referenced_by: &str) -> Result<EntityTypeId, ModelError> {
        self.types_by_name
            .get(&self.qualify(name))
            .copied()
            .ok_or_else(|| ModelError::UnknownType {
                name: name.to_owned(),
                referenced_by: referenced_by.to_owned(),
            })
    }

    fn resolve(mut self, doc: ModelDocument) -> Result<EdmModel, ModelError> {
        for (i, def) in doc.entity_types.iter().enumerate() {
            let qualified = self.qualify(&def.name);
            if self
                .types_by_name
                .insert(qualified.clone(), EntityTypeId(to_u32(i)))
                .is_some()
            {
                return Err(ModelError::DuplicateName { name: qualified });
            }
        }

        let entity_types = self.entity_types(&doc.entity_types)?;
        check_base_cycles(&entity_types)?;

        let mut subtypes = vec![Vec::new(); entity_types.len()];
        for (i, ty) in entity_types.iter().enumerate() {
            if let Some(base) = ty.base {
                subtypes[base.index()].push(EntityTypeId(to_u32(i)));
            }
        }

        let operations = self.operations(&doc.operations)?;

        let mut model = EdmModel {
            id: ModelId::next(),
            entity_types,
            entity_sets: Vec::new(),
            singletons: Vec::new(),
            operations,
            containers: Vec::new(),
            subtypes,
            annotations: HashMap::new(),
        };

        for (i, def) in doc.containers.iter().enumerate() {
            self.container(&mut model, ContainerId(to_u32(i)), def)?;
        }

        for def in doc.annotations {
            let targets = resolve_targets(&model, &self, &def.target);
            if targets.is_empty() {
                return Err(ModelError::UnknownTarget { target: def.target });
            }
            for element in targets {
                let slot = model.annotations.entry(element).or_default();
                if slot.contains_key(&def.term) {
                    tracing::debug!(
                        target = %def.target,
                        term = %def.term,
                        "duplicate annotation ignored, first declaration wins"
                    );
                    continue;
                }
                slot.insert(def.term.clone(), def.value.clone());
            }
        }

        tracing::debug!(
            model = %model.id,
            entity_types = model.entity_types.len(),
            entity_sets = model.entity_sets.len(),
            singletons = model.singletons.len(),
            operations = model.operations.len(),
            "model resolved"
        );
        Ok(model)
    }

    fn entity_types(&self, defs: &[EntityTypeDef]) -> Result<Vec<EntityType>, ModelError> {
        defs.iter()
            .map(|def| -> Result<EntityType, ModelError> {
                let owner = self.qualify(&def.name);
                let base = def
                    .base_type
                    .as_deref()
                    .map(|b| self.type_ref(b, &owner))
                    .transpose()?;
                let navigation_properties = def
                    .navigation_properties
                    .iter()
                    .map(|nav| -> Result<NavigationProperty, ModelError> {
                        Ok(NavigationProperty {
                            name: nav.name.clone(),
                            target: self.type_ref(&nav.target, &format!("{owner}/{}", nav.name))?,
                            collection: nav.collection,
                            contains_target: nav.contains_target,
                            partner: nav.partner.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, ModelError>>()?;
                Ok(EntityType {
                    namespace: self.namespace.clone(),
                    name: simple_name(&def.name).to_owned(),
                    base,
                    is_abstract: def.is_abstract,
                    key: def.key.clone(),
                    properties: def
                        .properties
                        .iter()
                        .map(|p| Property {
                            name: p.name.clone(),
                            type_name: p.type_name.clone(),
                            nullable: p.nullable,
                        })
                        .collect(),
                    navigation_properties,
                })
            })
            .collect()
    }

    fn operations(&self, defs: &[OperationDef]) -> Result<Vec<Operation>, ModelError> {
        defs.iter()
            .map(|def| -> Result<Operation, ModelError> {
                let owner = self.qualify(&def.name);
                let mut params = def.parameters.iter();
                let binding = if def.bound {
                    let first = params
                        .next()
                        .ok_or_else(|| ModelError::MissingBindingParameter {
                            name: owner.clone(),
                        })?;
                    Some(BindingParameter {
                        name: first.name.clone(),
                        entity_type: self.type_ref(&first.type_name, &owner)?,
                        collection: first.collection,
                    })
                } else {
                    None
                };
                Ok(Operation {
                    namespace: self.namespace.clone(),
                    name: simple_name(&def.name).to_owned(),
                    kind: def.kind,
                    binding,
                    parameters: params
                        .map(|p| Parameter {
                            name: p.name.clone(),
                            type_name: p.type_name.clone(),
                            collection: p.collection,
                            nullable: p.nullable,
                        })
                        .collect(),
                    return_type: def.return_type.as_ref().map(|r| ReturnType {
                        type_name: r.type_name.clone(),
                        collection: r.collection,
                    }),
                    is_composable: def.composable,
                })
            })
            .collect()
    }

    fn container(
        &self,
        model: &mut EdmModel,
        id: ContainerId,
        def: &ContainerDef,
    ) -> Result<(), ModelError> {
        let owner = self.qualify(&def.name);
        let mut container = EntityContainer {
            namespace: self.namespace.clone(),
            name: def.name.clone(),
            entity_sets: Vec::new(),
            singletons: Vec::new(),
            operation_imports: Vec::new(),
        };
        let mut names: HashMap<&str, ElementRef> = HashMap::new();

        for set in &def.entity_sets {
            let set_id = EntitySetId(to_u32(model.entity_sets.len()));
            model.entity_sets.push(EntitySet {
                name: set.name.clone(),
                container: id,
                entity_type: self.type_ref(&set.entity_type, &format!("{owner}/{}", set.name))?,
                navigation_bindings: Vec::new(),
            });
            container.entity_sets.push(set_id);
            if names.insert(&set.name, ElementRef::EntitySet(set_id)).is_some() {
                return Err(ModelError::DuplicateName {
                    name: format!("{owner}/{}", set.name),
                });
            }
        }
        for single in &def.singletons {
            let single_id = SingletonId(to_u32(model.singletons.len()));
            model.singletons.push(Singleton {
                name: single.name.clone(),
                container: id,
                entity_type: self
                    .type_ref(&single.entity_type, &format!("{owner}/{}", single.name))?,
                navigation_bindings: Vec::new(),
            });
            container.singletons.push(single_id);
            if names
                .insert(&single.name, ElementRef::Singleton(single_id))
                .is_some()
            {
                return Err(ModelError::DuplicateName {
                    name: format!("{owner}/{}", single.name),
                });
            }
        }

        let bindings = |element_name: &str, defs: &BTreeMap<String, String>| {
            defs.iter()
                .map(|(path, target)| -> Result<NavigationBinding, ModelError> {
                    let resolved = names.get(target.as_str()).copied().ok_or_else(|| {
                        ModelError::UnknownBindingTarget {
                            owner: format!("{owner}/{element_name}"),
                            path: path.clone(),
                            target: target.clone(),
                        }
                    })?;
                    Ok(NavigationBinding {
                        path: path.clone(),
                        target: resolved,
                    })
                })
                .collect::<Result<Vec<_>, ModelError>>()
        };
        for (set_id, set) in container.entity_sets.iter().zip(&def.entity_sets) {
            model.entity_sets[set_id.index()].navigation_bindings =
                bindings(&set.name, &set.navigation_bindings)?;
        }
        for (single_id, single) in container.singletons.iter().zip(&def.singletons) {
            model.singletons[single_id.index()].navigation_bindings =
                bindings(&single.name, &single.navigation_bindings)?;
        }

        for import in &def.operation_imports {
            let qualified = self.qualify(&import.operation);
            let operation = model
                .operations()
                .find(|(_, op)| !op.is_bound() && op.qualified_name() == qualified)
                .map(|(op_id, _)| op_id)
                .ok_or_else(|| ModelError::UnknownOperation {
                    name: import.operation.clone(),
                    import: import.name.clone(),
                })?;
            let entity_set = match import.entity_set.as_deref() {
                Some(name) => match names.get(name) {
                    Some(ElementRef::EntitySet(set)) => Some(*set),
                    _ => {
                        return Err(ModelError::UnknownBindingTarget {
                            owner: format!("{owner}/{}", import.name),
                            path: import.name.clone(),
                            target: name.to_owned(),
                        });
                    }
                },
                None => None,
            };
            container.operation_imports.push(OperationImport {
                name: import.name.clone(),
                operation,
                entity_set,
            });
        }

        model.containers.push(container);
        Ok(())
    }
}

fn check_base_cycles(types: &[EntityType]) -> Result<(), ModelError> {
    for (i, ty) in types.iter().enumerate() {
        let mut steps = 0usize;
        let mut current = ty.base;
        while let Some(base) = current {
            steps += 1;
            if base.index() == i || steps > types.len() {
                return Err(ModelError::BaseTypeCycle {
                    name: ty.qualified_name(),
                });
            }
            current = types[base.index()].base;
        }
    }
    Ok(())
}

/// Resolve a CSDL-style annotation target to model elements.
///
/// Operation targets resolve to every overload sharing the qualified name.
fn resolve_targets(model: &EdmModel, names: &Resolver, target: &str) -> Vec<ElementRef> {
    if let Some((head, tail)) = target.split_once('/') {
        let qualified = names.qualify(head);
        if let Some((cid, container)) = model
            .containers()
            .find(|(_, c)| c.qualified_name() == qualified)
        {
            let set = container
                .entity_sets
                .iter()
                .find(|s| model.entity_set(**s).name == tail)
                .map(|s| ElementRef::EntitySet(*s));
            let single = container
                .singletons
                .iter()
                .find(|s| model.singleton(**s).name == tail)
                .map(|s| ElementRef::Singleton(*s));
            let import = container
                .operation_imports
                .iter()
                .position(|i| i.name == tail)
                .map(|index| {
                    ElementRef::OperationImport(ImportRef {
                        container: cid,
                        index: to_u32(index),
                    })
                });
            return set.or(single).or(import).into_iter().collect();
        }
        if let Some(&ty) = names.types_by_name.get(&qualified) {
            return model
                .entity_type(ty)
                .navigation_properties
                .iter()
                .position(|n| n.name == tail)
                .map(|index| {
                    ElementRef::NavigationProperty(NavRef {
                        declaring: ty,
                        index: to_u32(index),
                    })
                })
                .into_iter()
                .collect();
        }
        return Vec::new();
    }

    let qualified = names.qualify(target);
    if let Some(&ty) = names.types_by_name.get(&qualified) {
        return vec![ElementRef::EntityType(ty)];
    }
    if let Some((cid, _)) = model
        .containers()
        .find(|(_, c)| c.qualified_name() == qualified)
    {
        return vec![ElementRef::Container(cid)];
    }
    model
        .operations()
        .filter(|(_, op)| op.qualified_name() == qualified)
        .map(|(id, _): (OperationId, _)| ElementRef::Operation(id))
        .collect()
}

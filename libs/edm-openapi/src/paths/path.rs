use std::fmt;
use std::hash::{Hash, Hasher};

use edm_model::{
    EdmModel, ElementRef, EntitySetId, EntityTypeId, ImportRef, NavRef, Operation,
    OperationId, OperationKind, SingletonId,
};

use super::segment::PathSegment;

/// Kind of resource a path addresses, determined by its last segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    EntitySet,
    /// Single entity addressed by key, below a set or a collection-valued
    /// navigation property.
    Entity,
    Singleton,
    NavigationProperty,
    TypeCast,
    Operation,
    OperationImport,
    Count,
    Ref,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterSource {
    Key,
    Function,
}

/// Template parameter of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathParameter {
    /// Name used in the template, unique within the path.
    pub name: String,
    /// Key property or function parameter the value binds to.
    pub binds: String,
    /// EDM type name.
    pub type_name: String,
    pub source: ParameterSource,
}

/// An addressable resource path.
///
/// Paths compare and hash by their segment sequence only; everything else is
/// derived from the segments when the path is built.
#[derive(Clone, Debug)]
pub struct ODataPath {
    segments: Vec<PathSegment>,
    template: String,
    kind: PathKind,
    root: ElementRef,
    target: ElementRef,
    binding: Option<ElementRef>,
    entity_type: Option<EntityTypeId>,
    cast_from: Option<EntityTypeId>,
    collection: bool,
    navigation: Option<NavRef>,
    containment: bool,
    navigation_depth: usize,
    parameters: Vec<PathParameter>,
}

impl ODataPath {
    pub(crate) fn entity_set(model: &EdmModel, id: EntitySetId) -> Self {
        let set = model.entity_set(id);
        let element = ElementRef::EntitySet(id);
        Self::root_path(
            PathSegment::EntitySet(id),
            &set.name,
            PathKind::EntitySet,
            element,
            Some(set.entity_type),
            true,
        )
    }

    pub(crate) fn singleton(model: &EdmModel, id: SingletonId) -> Self {
        let single = model.singleton(id);
        Self::root_path(
            PathSegment::Singleton(id),
            &single.name,
            PathKind::Singleton,
            ElementRef::Singleton(id),
            Some(single.entity_type),
            false,
        )
    }

    pub(crate) fn operation_import(model: &EdmModel, id: ImportRef) -> Self {
        let import = model.operation_import(id);
        let operation = model.operation(import.operation);
        let element = ElementRef::OperationImport(id);
        let mut path = Self::root_path(
            PathSegment::OperationImport(id),
            "",
            PathKind::OperationImport,
            element,
            model.element_type(element).or_else(|| {
                operation
                    .return_type
                    .as_ref()
                    .and_then(|r| model.find_entity_type(&r.type_name))
            }),
            operation.return_type.as_ref().is_some_and(|r| r.collection),
        );
        path.template = format!("/{}", path.operation_template(operation, &import.name));
        path
    }

    fn root_path(
        segment: PathSegment,
        name: &str,
        kind: PathKind,
        element: ElementRef,
        entity_type: Option<EntityTypeId>,
        collection: bool,
    ) -> Self {
        Self {
            segments: vec![segment],
            template: format!("/{name}"),
            kind,
            root: element,
            target: element,
            binding: None,
            entity_type,
            cast_from: None,
            collection,
            navigation: None,
            containment: false,
            navigation_depth: 0,
            parameters: Vec::new(),
        }
    }

    fn child(&self, segment: PathSegment, kind: PathKind) -> Self {
        let mut next = self.clone();
        next.segments.push(segment);
        next.kind = kind;
        next
    }

    /// Entity addressed by key. `None` when the entity type has no key.
    pub(crate) fn with_key(&self, model: &EdmModel) -> Option<Self> {
        let entity_type = self.entity_type?;
        let key = model.key(entity_type);
        if key.is_empty() {
            return None;
        }
        let type_name = &model.entity_type(entity_type).name;

        let mut next = self.child(
            PathSegment::Key {
                entity_type,
                parameters: Vec::new(),
            },
            PathKind::Entity,
        );
        let mut names = Vec::with_capacity(key.len());
        for property in key {
            let name = next.unique_parameter(type_name, property);
            next.parameters.push(PathParameter {
                name: name.clone(),
                binds: property.clone(),
                type_name: model
                    .property(entity_type, property)
                    .map_or_else(|| "Edm.String".to_owned(), |p| p.type_name.clone()),
                source: ParameterSource::Key,
            });
            names.push(name);
        }

        let suffix = if let [single] = names.as_slice() {
            format!("/{{{single}}}")
        } else {
            let pairs: Vec<String> = key
                .iter()
                .zip(&names)
                .map(|(property, name)| format!("{property}={{{name}}}"))
                .collect();
            format!("({})", pairs.join(","))
        };
        next.template.push_str(&suffix);
        if let Some(PathSegment::Key { parameters, .. }) = next.segments.last_mut() {
            *parameters = names;
        }
        next.collection = false;
        Some(next)
    }

    pub(crate) fn with_navigation(&self, model: &EdmModel, nav: NavRef) -> Self {
        let property = model.navigation(nav);
        let mut next = self.child(PathSegment::Navigation(nav), PathKind::NavigationProperty);
        next.template.push('/');
        next.template.push_str(&property.name);
        next.target = ElementRef::NavigationProperty(nav);
        next.binding = if self.navigation_depth == 0 {
            model.navigation_binding(self.root, &property.name)
        } else {
            None
        };
        next.entity_type = Some(property.target);
        next.cast_from = None;
        next.collection = property.collection;
        next.navigation = Some(nav);
        next.containment = property.contains_target;
        next.navigation_depth += 1;
        next
    }

    pub(crate) fn with_cast(&self, model: &EdmModel, entity_type: EntityTypeId) -> Self {
        let mut next = self.child(PathSegment::TypeCast(entity_type), PathKind::TypeCast);
        next.template.push('/');
        next.template
            .push_str(&model.entity_type(entity_type).qualified_name());
        next.cast_from = self.entity_type;
        next.entity_type = Some(entity_type);
        next
    }

    pub(crate) fn with_operation(&self, model: &EdmModel, id: OperationId) -> Self {
        let operation = model.operation(id);
        let mut next = self.child(PathSegment::Operation(id), PathKind::Operation);
        let segment = next.operation_template(operation, &operation.qualified_name());
        next.template.push('/');
        next.template.push_str(&segment);
        next.target = ElementRef::Operation(id);
        next.binding = None;
        next.entity_type = operation
            .return_type
            .as_ref()
            .and_then(|r| model.find_entity_type(&r.type_name));
        next.cast_from = None;
        next.collection = operation.return_type.as_ref().is_some_and(|r| r.collection);
        next
    }

    pub(crate) fn with_count(&self) -> Self {
        let mut next = self.child(PathSegment::Count, PathKind::Count);
        next.template.push_str("/$count");
        next
    }

    pub(crate) fn with_ref(&self) -> Self {
        let mut next = self.child(PathSegment::Ref, PathKind::Ref);
        next.template.push_str("/$ref");
        next
    }

    /// `name(p1={p1},...)` for functions, `name` for actions. Registers the
    /// function parameters on `self`.
    fn operation_template(&mut self, operation: &Operation, name: &str) -> String {
        if operation.kind == OperationKind::Action {
            return name.to_owned();
        }
        let mut pairs = Vec::with_capacity(operation.parameters.len());
        for parameter in &operation.parameters {
            let unique = self.unique_parameter(&operation.name, &parameter.name);
            pairs.push(format!("{}={{{unique}}}", parameter.name));
            self.parameters.push(PathParameter {
                name: unique,
                binds: parameter.name.clone(),
                type_name: parameter.type_name.clone(),
                source: ParameterSource::Function,
            });
        }
        format!("{name}({})", pairs.join(","))
    }

    /// `base`, or `{prefix}-{base}` (then a numeric suffix) when the name is
    /// already taken by an earlier segment.
    fn unique_parameter(&self, prefix: &str, base: &str) -> String {
        let taken = |name: &str| self.parameters.iter().any(|p| p.name == name);
        if !taken(base) {
            return base.to_owned();
        }
        let prefixed = format!("{prefix}-{base}");
        if !taken(&prefixed) {
            return prefixed;
        }
        (2..)
            .map(|n| format!("{prefixed}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or(prefixed)
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// URL template, e.g. `/Books/{Id}/Author`.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub const fn kind(&self) -> PathKind {
        self.kind
    }

    /// Entity set, singleton or operation import the path starts at.
    #[must_use]
    pub const fn root(&self) -> ElementRef {
        self.root
    }

    /// Element whose restrictions govern the addressed resource.
    #[must_use]
    pub const fn target(&self) -> ElementRef {
        self.target
    }

    /// Entity set or singleton a first-level navigation property is bound to.
    #[must_use]
    pub const fn binding_target(&self) -> Option<ElementRef> {
        self.binding
    }

    /// Entity type of the addressed resource after casts.
    #[must_use]
    pub const fn entity_type(&self) -> Option<EntityTypeId> {
        self.entity_type
    }

    /// Type the last cast narrowed from.
    #[must_use]
    pub const fn cast_from(&self) -> Option<EntityTypeId> {
        self.cast_from
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        self.collection
    }

    /// Last navigation property followed.
    #[must_use]
    pub const fn navigation(&self) -> Option<NavRef> {
        self.navigation
    }

    /// Whether the last navigation property is a containment.
    #[must_use]
    pub const fn is_containment(&self) -> bool {
        self.containment
    }

    #[must_use]
    pub const fn navigation_depth(&self) -> usize {
        self.navigation_depth
    }

    #[must_use]
    pub fn parameters(&self) -> &[PathParameter] {
        &self.parameters
    }

    /// Navigation property path relative to the root, as written in
    /// capability annotations: navigation and cast segments joined by `/`,
    /// keys omitted. Empty for paths without navigation.
    #[must_use]
    pub fn navigation_path(&self, model: &EdmModel) -> String {
        if self.navigation_depth == 0 {
            return String::new();
        }
        let mut parts: Vec<String> = Vec::new();
        for segment in &self.segments[1..] {
            match segment {
                PathSegment::Navigation(nav) => parts.push(model.navigation(*nav).name.clone()),
                PathSegment::TypeCast(ty) => parts.push(model.entity_type(*ty).qualified_name()),
                _ => {}
            }
        }
        // Casts after the last navigation narrow the target, not the path.
        while parts.last().is_some_and(|p| p.contains('.')) {
            parts.pop();
        }
        parts.join("/")
    }
}

impl PartialEq for ODataPath {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for ODataPath {}

impl Hash for ODataPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl fmt::Display for ODataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

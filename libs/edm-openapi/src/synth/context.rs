//! Effective restrictions of one path.

use std::sync::Arc;

use edm_model::{EdmModel, ElementRef};

use crate::capabilities::{
    Capability, CountRestrictions, DeleteRestrictions, ExpandRestrictions, FilterRestrictions,
    IndexableByKey, InsertRestrictions, NavigationPropertyRestriction, NavigationRestrictions,
    ReadRestrictions, SearchRestrictions, SelectSupport, SkipSupported, SortRestrictions,
    TopSupported, UpdateRestrictions,
};
use crate::paths::{ODataPath, PathKind, PathSegment};
use crate::resolver::{Resolved, RestrictionResolver};

/// Restrictions governing the terminal resource of a path.
pub struct PathRestrictions {
    pub read: Resolved<ReadRestrictions>,
    pub insert: Resolved<InsertRestrictions>,
    pub update: Resolved<UpdateRestrictions>,
    pub delete: Resolved<DeleteRestrictions>,
    pub count: Resolved<CountRestrictions>,
    pub filter: Resolved<FilterRestrictions>,
    pub search: Resolved<SearchRestrictions>,
    pub sort: Resolved<SortRestrictions>,
    pub select: Resolved<SelectSupport>,
    pub expand: Resolved<ExpandRestrictions>,
    pub top: Resolved<TopSupported>,
    pub skip: Resolved<SkipSupported>,
    pub indexable: Resolved<IndexableByKey>,
}

impl PathRestrictions {
    fn resolve(
        resolver: RestrictionResolver<'_>,
        path: &ODataPath,
        entry: Option<&NavigationPropertyRestriction>,
    ) -> Self {
        let root = path.root();
        Self {
            read: either(resolver, path, entry.and_then(|e| e.read_restrictions.clone()), root),
            insert: either(resolver, path, entry.and_then(|e| e.insert_restrictions.clone()), root),
            update: either(resolver, path, entry.and_then(|e| e.update_restrictions.clone()), root),
            delete: either(resolver, path, entry.and_then(|e| e.delete_restrictions.clone()), root),
            count: either(resolver, path, entry.and_then(|e| e.count_restrictions.clone()), root),
            filter: either(resolver, path, entry.and_then(|e| e.filter_restrictions.clone()), root),
            search: either(resolver, path, entry.and_then(|e| e.search_restrictions.clone()), root),
            sort: either(resolver, path, entry.and_then(|e| e.sort_restrictions.clone()), root),
            select: resolver.for_path(path),
            expand: resolver.for_path(path),
            top: either(
                resolver,
                path,
                entry.and_then(|e| e.top_supported).map(|b| TopSupported(Some(b))),
                root,
            ),
            skip: either(
                resolver,
                path,
                entry.and_then(|e| e.skip_supported).map(|b| SkipSupported(Some(b))),
                root,
            ),
            indexable: either(
                resolver,
                path,
                entry.and_then(|e| e.indexable_by_key).map(|b| IndexableByKey(Some(b))),
                root,
            ),
        }
    }
}

fn either<T: Capability>(
    resolver: RestrictionResolver<'_>,
    path: &ODataPath,
    entry: Option<T>,
    root: ElementRef,
) -> Resolved<T> {
    match entry {
        Some(value) => Resolved::overridden(value, root),
        None => resolver.for_path(path),
    }
}

/// Restrictions the root set or singleton declares about the navigation
/// property path of a navigation path.
pub struct RootRestrictions {
    pub insert: Resolved<InsertRestrictions>,
    pub update: Resolved<UpdateRestrictions>,
    pub delete: Resolved<DeleteRestrictions>,
    pub count: Resolved<CountRestrictions>,
}

/// Everything the synthesizer needs to know about one path.
pub struct PathContext<'p> {
    pub path: &'p Arc<ODataPath>,
    pub restrictions: PathRestrictions,
    /// Present for paths that follow at least one navigation property.
    pub root: Option<RootRestrictions>,
    pub navigation_path: String,
    /// Qualified name of the addressed entity type.
    pub type_name: Option<String>,
    /// Unqualified name of the addressed entity type.
    pub type_label: String,
    /// Operation id prefix, e.g. `Books.Author`.
    pub prefix: String,
}

impl<'p> PathContext<'p> {
    /// `None` when the root's navigation restrictions forbid the path.
    pub fn new(resolver: RestrictionResolver<'_>, path: &'p Arc<ODataPath>) -> Option<Self> {
        let model = resolver.model();
        let navigation_path = path.navigation_path(model);
        let mut entry = None;
        let mut root = None;

        if path.navigation_depth() > 0 {
            let navigation = resolver.get::<NavigationRestrictions>(path.root());
            if !navigation.allows_path(&navigation_path, path.navigation_depth()) {
                tracing::debug!(
                    path = %path,
                    navigation_path = %navigation_path,
                    "navigation restricted, no operations"
                );
                return None;
            }
            entry = navigation.restriction_for(&navigation_path).cloned();
            root = Some(RootRestrictions {
                insert: resolver.get(path.root()),
                update: resolver.get(path.root()),
                delete: resolver.get(path.root()),
                count: resolver.get(path.root()),
            });
        }

        let restrictions = PathRestrictions::resolve(resolver, path, entry.as_ref());
        let entity_type = path.entity_type();
        Some(Self {
            path,
            restrictions,
            root,
            navigation_path,
            type_name: entity_type.map(|t| model.entity_type(t).qualified_name()),
            type_label: entity_type.map_or_else(String::new, |t| model.entity_type(t).name.clone()),
            prefix: prefix(model, path),
        })
    }

    #[must_use]
    pub fn kind(&self) -> PathKind {
        self.path.kind()
    }

    /// Tag grouping the operations of this path.
    #[must_use]
    pub fn tag(&self) -> String {
        self.prefix.clone()
    }
}

/// Root name followed by navigation property and cast names; keys, counts,
/// refs and operations are not part of it.
fn prefix(model: &EdmModel, path: &ODataPath) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.segments() {
        match segment {
            PathSegment::EntitySet(id) => parts.push(&model.entity_set(*id).name),
            PathSegment::Singleton(id) => parts.push(&model.singleton(*id).name),
            PathSegment::OperationImport(id) => parts.push(&model.operation_import(*id).name),
            PathSegment::Navigation(nav) => parts.push(&model.navigation(*nav).name),
            PathSegment::TypeCast(ty) => parts.push(&model.entity_type(*ty).name),
            PathSegment::Key { .. }
            | PathSegment::Operation(_)
            | PathSegment::Count
            | PathSegment::Ref => {}
        }
    }
    parts.join(".")
}

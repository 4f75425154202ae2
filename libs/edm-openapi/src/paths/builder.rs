//! Breadth-first enumeration of the addressable path space.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use edm_model::{ContainerId, EdmModel, EntityTypeId, ImportRef, NavRef, OperationId};

use super::path::{ODataPath, PathKind};
use super::segment::PathSegment;
use crate::config::ConvertSettings;
use crate::error::ConfigError;

/// Builds the deduplicated, depth-bounded path set of a model.
///
/// Output order is deterministic: containers in declaration order; within a
/// container entity sets, then singletons, then operation imports as seeds,
/// each seed's subtree enumerated breadth-first with children in the order
/// key, navigation properties, type casts, bound operations, `$count`,
/// `$ref`.
pub struct PathTreeBuilder<'a> {
    model: &'a EdmModel,
    settings: &'a ConvertSettings,
    max_depth: usize,
}

impl<'a> PathTreeBuilder<'a> {
    #[must_use]
    pub fn new(model: &'a EdmModel, settings: &'a ConvertSettings) -> Self {
        Self {
            model,
            settings,
            max_depth: settings.navigation_depth(),
        }
    }

    /// Enumerates every path of the model.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidNavigationDepth` for a negative depth;
    /// nothing is enumerated in that case.
    pub fn build(&self) -> Result<Vec<Arc<ODataPath>>, ConfigError> {
        self.settings.validate()?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (id, container) in self.model.containers() {
            let before = out.len();
            let mut queue: VecDeque<ODataPath> = self.seeds(id).into();
            while let Some(path) = queue.pop_front() {
                if !seen.insert(path.segments().to_vec()) {
                    tracing::trace!(path = %path, "duplicate path skipped");
                    continue;
                }
                queue.extend(self.children(&path));
                out.push(Arc::new(path));
            }
            tracing::debug!(
                container = %container.qualified_name(),
                paths = out.len() - before,
                "container paths built"
            );
        }
        Ok(out)
    }

    fn seeds(&self, id: ContainerId) -> Vec<ODataPath> {
        let container = self.model.container(id);
        let sets = container
            .entity_sets
            .iter()
            .map(|set| ODataPath::entity_set(self.model, *set));
        let singletons = container
            .singletons
            .iter()
            .map(|single| ODataPath::singleton(self.model, *single));
        let imports = (0..container.operation_imports.len()).map(|index| {
            ODataPath::operation_import(
                self.model,
                ImportRef {
                    container: id,
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                },
            )
        });
        sets.chain(singletons).chain(imports).collect()
    }

    /// Direct children of `path`, in canonical order.
    fn children(&self, path: &ODataPath) -> Vec<ODataPath> {
        if path.last_segment().is_some_and(PathSegment::is_terminal) {
            return Vec::new();
        }
        let Some(entity_type) = path.entity_type() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let is_cast = path.kind() == PathKind::TypeCast;
        let collection = path.is_collection();

        if collection
            && !is_cast
            && let Some(keyed) = path.with_key(self.model)
        {
            out.push(keyed);
        }

        if !collection {
            if path.navigation_depth() < self.max_depth {
                for nav in self.navigations(path, entity_type) {
                    out.push(path.with_navigation(self.model, nav));
                }
            } else {
                tracing::trace!(path = %path, depth = self.max_depth, "navigation depth reached");
            }
        }

        if self.settings.enable_type_cast_paths && !is_cast {
            for derived in self.model.derived_types(entity_type) {
                if !self.model.entity_type(derived).is_abstract {
                    out.push(path.with_cast(self.model, derived));
                }
            }
        }

        if self.settings.enable_operation_paths {
            for op in self.operations(path, entity_type, collection) {
                out.push(path.with_operation(self.model, op));
            }
        }

        if self.settings.enable_dollar_count_paths && collection {
            out.push(path.with_count());
        }

        if path.kind() == PathKind::NavigationProperty && !path.is_containment() {
            out.push(path.with_ref());
        }
        out
    }

    /// Navigation properties of `entity_type`; below a cast only those the
    /// pre-cast type does not already offer.
    fn navigations(&self, path: &ODataPath, entity_type: EntityTypeId) -> Vec<NavRef> {
        let all = self.model.navigation_properties(entity_type);
        match path.cast_from().filter(|_| path.kind() == PathKind::TypeCast) {
            Some(base) => {
                let inherited = self.model.navigation_properties(base);
                all.into_iter().filter(|nav| !inherited.contains(nav)).collect()
            }
            None => all,
        }
    }

    fn operations(
        &self,
        path: &ODataPath,
        entity_type: EntityTypeId,
        collection: bool,
    ) -> Vec<OperationId> {
        let all = self.model.bound_operations(entity_type, collection);
        match path.cast_from().filter(|_| path.kind() == PathKind::TypeCast) {
            Some(base) => {
                let inherited = self.model.bound_operations(base, collection);
                all.into_iter().filter(|op| !inherited.contains(op)).collect()
            }
            None => all,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use edm_model::{ContainerDef, EdmModelBuilder, EntityTypeDef, OperationDef};

    fn templates(paths: &[Arc<ODataPath>]) -> Vec<&str> {
        paths.iter().map(|p| p.template()).collect()
    }

    #[test]
    fn test_books_without_annotations() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(EntityTypeDef::new("Book").key(["Id"]).property("Id", "Edm.Int32"))
            .container(ContainerDef::new("Default").entity_set("Books", "Book"))
            .build()
            .unwrap();
        let settings = ConvertSettings::default();
        let paths = PathTreeBuilder::new(&model, &settings).build().unwrap();
        assert_eq!(templates(&paths), ["/Books", "/Books/{Id}", "/Books/$count"]);
    }

    #[test]
    fn test_keyless_type_has_no_keyed_path() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(EntityTypeDef::new("LogEntry").property("Message", "Edm.String"))
            .container(ContainerDef::new("Default").entity_set("Logs", "LogEntry"))
            .build()
            .unwrap();
        let settings = ConvertSettings::default();
        let paths = PathTreeBuilder::new(&model, &settings).build().unwrap();
        assert_eq!(templates(&paths), ["/Logs", "/Logs/$count"]);
    }

    #[test]
    fn test_seed_order_and_children() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(
                EntityTypeDef::new("Person")
                    .key(["Id"])
                    .navigation("BestFriend", "Person", false),
            )
            .entity_type(EntityTypeDef::new("Employee").base("Person"))
            .operation(OperationDef::action("Promote").bound_to("Employee", false))
            .operation(OperationDef::function("Top").returns("NS.Person", true))
            .container(
                ContainerDef::new("Default")
                    .entity_set("People", "Person")
                    .singleton("Me", "Person")
                    .operation_import("Top", "Top"),
            )
            .build()
            .unwrap();
        let settings = ConvertSettings {
            max_navigation_depth: 1,
            ..ConvertSettings::default()
        };
        let paths = PathTreeBuilder::new(&model, &settings).build().unwrap();
        assert_eq!(
            templates(&paths),
            [
                "/People",
                "/Me",
                "/Top()",
                "/People/{Id}",
                "/People/NS.Employee",
                "/People/$count",
                "/Me/BestFriend",
                "/Me/NS.Employee",
                "/People/{Id}/BestFriend",
                "/People/{Id}/NS.Employee",
                "/People/NS.Employee/$count",
                "/Me/BestFriend/NS.Employee",
                "/Me/BestFriend/$ref",
                "/Me/NS.Employee/NS.Promote",
                "/People/{Id}/BestFriend/NS.Employee",
                "/People/{Id}/BestFriend/$ref",
                "/People/{Id}/NS.Employee/NS.Promote",
                "/Me/BestFriend/NS.Employee/NS.Promote",
                "/People/{Id}/BestFriend/NS.Employee/NS.Promote",
            ]
        );
    }

    #[test]
    fn test_toggles_disable_optional_paths() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(EntityTypeDef::new("Person").key(["Id"]))
            .entity_type(EntityTypeDef::new("Employee").base("Person"))
            .container(ContainerDef::new("Default").entity_set("People", "Person"))
            .build()
            .unwrap();
        let settings = ConvertSettings {
            enable_type_cast_paths: false,
            enable_dollar_count_paths: false,
            ..ConvertSettings::default()
        };
        let paths = PathTreeBuilder::new(&model, &settings).build().unwrap();
        assert_eq!(templates(&paths), ["/People", "/People/{Id}"]);
    }

    #[test]
    fn test_negative_depth_is_rejected() {
        let model = EdmModelBuilder::new("NS")
            .entity_type(
                EntityTypeDef::new("Person")
                    .key(["Id"])
                    .navigation("BestFriend", "Person", false),
            )
            .container(ContainerDef::new("Default").entity_set("People", "Person"))
            .build()
            .unwrap();
        let settings = ConvertSettings {
            max_navigation_depth: -1,
            ..ConvertSettings::default()
        };
        let err = PathTreeBuilder::new(&model, &settings).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidNavigationDepth(-1));
    }
}

//! Typed restriction lookup with fallback.
//!
//! A term is looked up on the element itself, then on the entity type the
//! element is typed as (walking base types, most-derived first), then on the
//! owning entity container. The first annotation found wins; when none is
//! found the zero-value record is returned, whose accessors apply the
//! vocabulary defaults.

use std::ops::Deref;
use std::sync::Arc;

use edm_model::{ContainerId, EdmModel, ElementRef, EntityTypeId};

use crate::cache::AnnotationCache;
use crate::capabilities::{Capability, CapabilityRecord, decoder};
use crate::paths::ODataPath;

/// Outcome of resolving one term for one element.
#[derive(Clone, Debug)]
pub struct Resolved<T> {
    record: Option<Arc<CapabilityRecord>>,
    fallback: T,
    origin: Option<ElementRef>,
}

impl<T: Capability> Resolved<T> {
    fn absent() -> Self {
        Self {
            record: None,
            fallback: T::default(),
            origin: None,
        }
    }

    /// A record supplied by the caller instead of the annotation cache, e.g.
    /// a per-navigation-property override.
    pub fn overridden(value: T, origin: ElementRef) -> Self {
        Self {
            record: None,
            fallback: value,
            origin: Some(origin),
        }
    }

    #[must_use]
    pub fn value(&self) -> &T {
        self.record
            .as_deref()
            .and_then(T::from_record)
            .unwrap_or(&self.fallback)
    }

    /// Element the record was declared on, `None` for the zero value.
    #[must_use]
    pub const fn origin(&self) -> Option<ElementRef> {
        self.origin
    }

    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.origin.is_some()
    }
}

impl<T: Capability> Deref for Resolved<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value()
    }
}

/// Restriction lookups against one model, backed by a shared cache.
#[derive(Clone, Copy)]
pub struct RestrictionResolver<'a> {
    model: &'a EdmModel,
    cache: &'a AnnotationCache,
}

impl<'a> RestrictionResolver<'a> {
    #[must_use]
    pub const fn new(model: &'a EdmModel, cache: &'a AnnotationCache) -> Self {
        Self { model, cache }
    }

    #[must_use]
    pub const fn model(&self) -> &'a EdmModel {
        self.model
    }

    /// Restriction `T` for `element`.
    #[must_use]
    pub fn get<T: Capability>(&self, element: ElementRef) -> Resolved<T> {
        self.get_for(element, None)
    }

    /// Restriction `T` for `element`, falling back to `entity_type` instead of
    /// the element's declared type. Used for type-cast paths.
    #[must_use]
    pub fn get_for<T: Capability>(
        &self,
        element: ElementRef,
        entity_type: Option<EntityTypeId>,
    ) -> Resolved<T> {
        let direct = match element {
            ElementRef::EntityType(_) | ElementRef::Container(_) => None,
            other => Some(other),
        };
        self.lookup(
            direct.as_slice(),
            entity_type.or_else(|| self.model.element_type(element)),
            self.model.container_of(element),
        )
    }

    /// Restriction `T` governing the terminal resource of `path`.
    ///
    /// Direct lookups cover the terminal element and, for navigation paths,
    /// the entity set the navigation property is bound to.
    #[must_use]
    pub fn for_path<T: Capability>(&self, path: &ODataPath) -> Resolved<T> {
        let mut direct = vec![path.target()];
        direct.extend(path.binding_target());
        direct.retain(|e| !matches!(e, ElementRef::EntityType(_) | ElementRef::Container(_)));
        self.lookup(
            &direct,
            path.entity_type(),
            self.model.container_of(path.root()),
        )
    }

    fn lookup<T: Capability>(
        &self,
        direct: &[ElementRef],
        entity_type: Option<EntityTypeId>,
        container: Option<ContainerId>,
    ) -> Resolved<T> {
        let types = entity_type
            .into_iter()
            .flat_map(|ty| self.model.type_chain(ty))
            .map(ElementRef::EntityType);
        let containers = container.map(ElementRef::Container);

        direct
            .iter()
            .copied()
            .chain(types)
            .chain(containers)
            .find_map(|element| {
                let record = self.cache.resolve(self.model, element, T::TERM, decoder(T::TERM))?;
                T::from_record(&record)?;
                Some(Resolved {
                    record: Some(record),
                    fallback: T::default(),
                    origin: Some(element),
                })
            })
            .unwrap_or_else(|| {
                tracing::trace!(term = %T::TERM, "no annotation found, using defaults");
                Resolved::absent()
            })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::capabilities::{DeleteRestrictions, ReadRestrictions, Term, UpdateRestrictions};
    use edm_model::{ContainerDef, EdmModelBuilder, EntityTypeDef, RawRecord};

    fn delete(deletable: bool) -> RawRecord {
        RawRecord::new().with("Deletable", deletable)
    }

    fn model() -> EdmModel {
        EdmModelBuilder::new("NS")
            .entity_type(EntityTypeDef::new("Entity").abstract_type().key(["Id"]))
            .entity_type(EntityTypeDef::new("Book").base("Entity"))
            .entity_type(EntityTypeDef::new("Author").base("Entity"))
            .container(
                ContainerDef::new("Default")
                    .entity_set("Books", "Book")
                    .entity_set("Authors", "Author"),
            )
            .annotate("NS.Default/Books", Term::DeleteRestrictions.qualified_name(), delete(true))
            .annotate("NS.Book", Term::DeleteRestrictions.qualified_name(), delete(false))
            .annotate(
                "NS.Entity",
                Term::UpdateRestrictions.qualified_name(),
                RawRecord::new().with("Updatable", false),
            )
            .annotate(
                "NS.Default",
                Term::ReadRestrictions.qualified_name(),
                RawRecord::new().with("Readable", false),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_set_annotation_shadows_type_annotation() {
        let model = model();
        let cache = AnnotationCache::new();
        let resolver = RestrictionResolver::new(&model, &cache);
        let books = ElementRef::EntitySet(model.find_entity_set("Books").unwrap());

        let on_set = resolver.get::<DeleteRestrictions>(books);
        assert!(on_set.is_deletable());
        assert_eq!(on_set.origin(), Some(books));

        let book = model.find_entity_type("NS.Book").unwrap();
        let on_type = resolver.get::<DeleteRestrictions>(ElementRef::EntityType(book));
        assert!(!on_type.is_deletable());
    }

    #[test]
    fn test_base_type_fallback() {
        let model = model();
        let cache = AnnotationCache::new();
        let resolver = RestrictionResolver::new(&model, &cache);
        let authors = ElementRef::EntitySet(model.find_entity_set("Authors").unwrap());

        let update = resolver.get::<UpdateRestrictions>(authors);
        assert!(!update.is_updatable());
        assert_eq!(
            update.origin(),
            Some(ElementRef::EntityType(model.find_entity_type("NS.Entity").unwrap()))
        );
    }

    #[test]
    fn test_container_default() {
        let model = model();
        let cache = AnnotationCache::new();
        let resolver = RestrictionResolver::new(&model, &cache);
        let authors = ElementRef::EntitySet(model.find_entity_set("Authors").unwrap());

        let read = resolver.get::<ReadRestrictions>(authors);
        assert!(!read.is_readable());
        assert!(matches!(read.origin(), Some(ElementRef::Container(_))));
    }

    #[test]
    fn test_absent_everywhere_is_permissive() {
        let model = model();
        let cache = AnnotationCache::new();
        let resolver = RestrictionResolver::new(&model, &cache);
        let authors = ElementRef::EntitySet(model.find_entity_set("Authors").unwrap());

        let delete = resolver.get::<DeleteRestrictions>(authors);
        assert!(!delete.is_present());
        assert!(delete.is_deletable());
        assert!(!delete.is_non_deletable_navigation_property("Books"));
    }

    #[test]
    fn test_type_override_for_casts() {
        let model = model();
        let cache = AnnotationCache::new();
        let resolver = RestrictionResolver::new(&model, &cache);
        let authors = ElementRef::EntitySet(model.find_entity_set("Authors").unwrap());
        let book = model.find_entity_type("NS.Book").unwrap();

        assert!(resolver.get::<DeleteRestrictions>(authors).is_deletable());
        assert!(!resolver.get_for::<DeleteRestrictions>(authors, Some(book)).is_deletable());
    }

    #[test]
    fn test_overridden_record() {
        let model = model();
        let books = ElementRef::EntitySet(model.find_entity_set("Books").unwrap());
        let record = DeleteRestrictions {
            deletable: Some(false),
            ..DeleteRestrictions::default()
        };
        let resolved = Resolved::overridden(record, books);
        assert!(resolved.is_present());
        assert!(!resolved.is_deletable());
    }
}

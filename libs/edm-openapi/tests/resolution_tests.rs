#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Restriction lookup precedence, inheritance and defaults.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use common::term;
use edm_model::{ContainerDef, EdmModel, EdmModelBuilder, ElementRef, EntityTypeDef};
use edm_openapi::capabilities::{
    Capability, CountRestrictions, DeleteRestrictions, FilterRestrictions, InsertRestrictions,
    ReadRestrictions, SortRestrictions, Term, UpdateRestrictions,
};
use edm_openapi::{AnnotationCache, RestrictionResolver};
use serde_json::json;

fn hierarchy() -> EdmModel {
    EdmModelBuilder::new("NS")
        .entity_type(EntityTypeDef::new("Item").abstract_type().key(["Id"]))
        .entity_type(EntityTypeDef::new("Book").base("Item"))
        .entity_type(EntityTypeDef::new("EBook").base("Book"))
        .container(
            ContainerDef::new("Default")
                .entity_set("Books", "Book")
                .entity_set("EBooks", "EBook"),
        )
        .annotate("NS.Item", term("DeleteRestrictions"), json!({ "Deletable": false }))
        .annotate("NS.Book", term("InsertRestrictions"), json!({ "Insertable": false }))
        .annotate(
            "NS.Default/Books",
            term("InsertRestrictions"),
            json!({ "Insertable": true }),
        )
        .annotate("NS.Default", term("CountRestrictions"), json!({ "Countable": false }))
        .build()
        .unwrap()
}

fn set(model: &EdmModel, name: &str) -> ElementRef {
    ElementRef::EntitySet(model.find_entity_set(name).unwrap())
}

#[test]
fn test_set_annotation_shadows_type_annotation() {
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let resolver = RestrictionResolver::new(&model, &cache);

    let books = resolver.get::<InsertRestrictions>(set(&model, "Books"));
    assert!(books.is_insertable());
    assert_eq!(books.origin(), Some(set(&model, "Books")));

    let ebooks = resolver.get::<InsertRestrictions>(set(&model, "EBooks"));
    assert!(!ebooks.is_insertable());
    let book = model.find_entity_type("NS.Book").unwrap();
    assert_eq!(ebooks.origin(), Some(ElementRef::EntityType(book)));
}

#[test]
fn test_base_type_chain_fallback() {
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let resolver = RestrictionResolver::new(&model, &cache);
    let item = model.find_entity_type("NS.Item").unwrap();

    for name in ["Books", "EBooks"] {
        let delete = resolver.get::<DeleteRestrictions>(set(&model, name));
        assert!(!delete.is_deletable(), "{name}");
        assert_eq!(delete.origin(), Some(ElementRef::EntityType(item)));
    }
}

#[test]
fn test_container_default_applies_last() {
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let resolver = RestrictionResolver::new(&model, &cache);
    let count = resolver.get::<CountRestrictions>(set(&model, "EBooks"));
    assert!(!count.is_countable());
    assert!(matches!(count.origin(), Some(ElementRef::Container(_))));
}

#[test]
fn test_absent_annotations_are_permissive() {
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let resolver = RestrictionResolver::new(&model, &cache);
    let books = set(&model, "Books");

    let read = resolver.get::<ReadRestrictions>(books);
    assert!(!read.is_present());
    assert!(read.is_readable());
    assert!(read.is_readable_by_key());
    assert!(read.value().base.readable.is_none());

    let update = resolver.get::<UpdateRestrictions>(books);
    assert!(update.is_updatable());
    assert!(!update.is_non_updatable_navigation_property("Author"));

    let filter = resolver.get::<FilterRestrictions>(books);
    assert!(filter.is_filterable());
    assert!(!filter.is_requires_filter());
    assert!(!filter.is_non_filterable_property("Title"));

    let sort = resolver.get::<SortRestrictions>(books);
    assert!(sort.is_sortable());
    assert!(!sort.is_non_sortable_property("Title"));
    assert!(!sort.is_ascending_only_property("Title"));
}

#[test]
fn test_entity_type_override() {
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let resolver = RestrictionResolver::new(&model, &cache);
    let item = model.find_entity_type("NS.Item").unwrap();
    let ebook = model.find_entity_type("NS.EBook").unwrap();

    let as_item = resolver.get_for::<InsertRestrictions>(set(&model, "EBooks"), Some(item));
    assert!(as_item.is_insertable());
    let as_ebook = resolver.get_for::<InsertRestrictions>(set(&model, "EBooks"), Some(ebook));
    assert!(!as_ebook.is_insertable());
}

#[test]
fn test_concurrent_resolution_decodes_once() {
    const THREADS: usize = 8;
    let model = hierarchy();
    let cache = AnnotationCache::new();
    let element = ElementRef::EntityType(model.find_entity_type("NS.Item").unwrap());
    let decodes = AtomicUsize::new(0);
    let barrier = Barrier::new(THREADS);

    let records: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    cache.resolve(&model, element, Term::DeleteRestrictions, |raw, report| {
                        decodes.fetch_add(1, Ordering::SeqCst);
                        thread::yield_now();
                        DeleteRestrictions::decode(raw, report).map(Capability::into_record)
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(decodes.load(Ordering::SeqCst), 1);
    let first = records[0].clone().unwrap();
    for record in &records {
        assert!(Arc::ptr_eq(&first, record.as_ref().unwrap()));
    }
    let delete = DeleteRestrictions::from_record(&first).unwrap();
    assert_eq!(delete.deletable, Some(false));
}

#[test]
fn test_model_switch_discards_entries() {
    let first = hierarchy();
    let second = hierarchy();
    let cache = AnnotationCache::new();

    let before =
        RestrictionResolver::new(&first, &cache).get::<DeleteRestrictions>(set(&first, "Books"));
    assert!(!before.is_deletable());
    assert!(!cache.is_empty());
    assert_eq!(cache.model(), Some(first.id()));

    let delete =
        RestrictionResolver::new(&second, &cache).get::<DeleteRestrictions>(set(&second, "Books"));
    assert!(!delete.is_deletable());
    assert_eq!(cache.model(), Some(second.id()));
}

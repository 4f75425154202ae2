#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Model loading and graph queries over a small bookstore document.

use edm_model::{
    ContainerDef, EdmModel, EdmModelBuilder, ElementRef, EntityTypeDef, OperationDef,
    OperationKind, RawValue,
};

const BOOKSTORE: &str = r#"{
    "namespace": "NS",
    "entityTypes": [
        {
            "name": "Entity",
            "abstract": true,
            "key": ["Id"],
            "properties": [{ "name": "Id", "type": "Edm.Int32", "nullable": false }]
        },
        {
            "name": "Book",
            "baseType": "Entity",
            "properties": [{ "name": "Title", "type": "Edm.String" }],
            "navigationProperties": [
                { "name": "Author", "type": "Author" },
                { "name": "Chapters", "type": "Chapter", "collection": true, "containsTarget": true }
            ]
        },
        {
            "name": "EBook",
            "baseType": "Book",
            "navigationProperties": [{ "name": "Formats", "type": "Format", "collection": true }]
        },
        { "name": "Author", "baseType": "Entity" },
        { "name": "Chapter", "key": ["Number"], "properties": [{ "name": "Number", "type": "Edm.Int32" }] },
        { "name": "Format", "key": ["Code"], "properties": [{ "name": "Code", "type": "Edm.String" }] }
    ],
    "operations": [
        {
            "name": "Publish",
            "kind": "action",
            "bound": true,
            "parameters": [{ "name": "book", "type": "Book" }, { "name": "when", "type": "Edm.DateTimeOffset" }]
        },
        { "name": "Bestsellers", "kind": "function", "returnType": { "type": "NS.Book", "collection": true } }
    ],
    "containers": [{
        "name": "Default",
        "entitySets": [
            { "name": "Books", "type": "Book", "navigationBindings": { "Author": "Authors" } },
            { "name": "Authors", "type": "NS.Author" }
        ],
        "singletons": [{ "name": "Featured", "type": "Book" }],
        "operationImports": [{ "name": "Bestsellers", "operation": "Bestsellers", "entitySet": "Books" }]
    }],
    "annotations": [
        {
            "target": "NS.Default/Books",
            "term": "Org.OData.Capabilities.V1.DeleteRestrictions",
            "value": { "Deletable": false }
        },
        {
            "target": "NS.Book/Author",
            "term": "Org.OData.Capabilities.V1.NavigationRestrictions",
            "value": { "Navigability": { "$EnumMember": "Org.OData.Capabilities.V1.NavigationType/None" } }
        },
        {
            "target": "NS.Default/Books",
            "term": "Org.OData.Capabilities.V1.DeleteRestrictions",
            "value": { "Deletable": true }
        }
    ]
}"#;

fn bookstore() -> EdmModel {
    EdmModel::from_json_str(BOOKSTORE).expect("bookstore document is valid")
}

#[test]
fn test_key_is_inherited_from_base_type() {
    let model = bookstore();
    let book = model.find_entity_type("NS.Book").unwrap();
    let ebook = model.find_entity_type("NS.EBook").unwrap();
    assert_eq!(model.key(book), ["Id".to_owned()]);
    assert_eq!(model.key(ebook), ["Id".to_owned()]);
    assert!(model.property(ebook, "Title").is_some());
    assert!(model.property(book, "Missing").is_none());
}

#[test]
fn test_navigation_properties_list_inherited_first() {
    let model = bookstore();
    let ebook = model.find_entity_type("NS.EBook").unwrap();
    let names: Vec<&str> = model
        .navigation_properties(ebook)
        .into_iter()
        .map(|nav| model.navigation(nav).name.as_str())
        .collect();
    assert_eq!(names, ["Author", "Chapters", "Formats"]);
    let chapters = model.find_navigation(ebook, "Chapters").unwrap();
    assert!(model.navigation(chapters).contains_target);
    assert_eq!(chapters.declaring, model.find_entity_type("NS.Book").unwrap());
}

#[test]
fn test_derived_types_and_subtyping() {
    let model = bookstore();
    let entity = model.find_entity_type("NS.Entity").unwrap();
    let book = model.find_entity_type("NS.Book").unwrap();
    let ebook = model.find_entity_type("NS.EBook").unwrap();
    let author = model.find_entity_type("NS.Author").unwrap();

    assert_eq!(model.derived_types(entity), vec![book, author, ebook]);
    assert!(model.is_subtype_of(ebook, entity));
    assert!(!model.is_subtype_of(entity, ebook));
    assert_eq!(model.base_types(ebook).collect::<Vec<_>>(), vec![book, entity]);
}

#[test]
fn test_bound_operations_follow_the_binding_type() {
    let model = bookstore();
    let book = model.find_entity_type("NS.Book").unwrap();
    let ebook = model.find_entity_type("NS.EBook").unwrap();
    let author = model.find_entity_type("NS.Author").unwrap();

    let publish = model.bound_operations(book, false);
    assert_eq!(publish.len(), 1);
    let op = model.operation(publish[0]);
    assert_eq!(op.kind, OperationKind::Action);
    assert_eq!(op.parameters.len(), 1);
    assert_eq!(op.parameters[0].name, "when");

    assert_eq!(model.bound_operations(ebook, false), publish);
    assert!(model.bound_operations(book, true).is_empty());
    assert!(model.bound_operations(author, false).is_empty());
}

#[test]
fn test_bindings_and_imports_resolve_within_container() {
    let model = bookstore();
    let books = model.find_entity_set("Books").unwrap();
    let authors = model.find_entity_set("Authors").unwrap();
    assert_eq!(
        model.navigation_binding(ElementRef::EntitySet(books), "Author"),
        Some(ElementRef::EntitySet(authors))
    );
    assert_eq!(model.navigation_binding(ElementRef::EntitySet(authors), "Author"), None);

    let (cid, container) = model.containers().next().unwrap();
    assert_eq!(container.qualified_name(), "NS.Default");
    assert_eq!(container.operation_imports[0].entity_set, Some(books));
    assert_eq!(model.container_of(ElementRef::EntitySet(books)), Some(cid));
}

#[test]
fn test_first_annotation_declaration_wins() {
    let model = bookstore();
    let books = ElementRef::EntitySet(model.find_entity_set("Books").unwrap());
    let RawValue::Record(record) = model
        .annotation(books, "Org.OData.Capabilities.V1.DeleteRestrictions")
        .unwrap()
    else {
        panic!("expected a record");
    };
    assert_eq!(record.get("Deletable"), Some(&RawValue::Bool(false)));
}

#[test]
fn test_navigation_property_annotation_target() {
    let model = bookstore();
    let book = model.find_entity_type("NS.Book").unwrap();
    let author = model.find_navigation(book, "Author").unwrap();
    let element = ElementRef::NavigationProperty(author);
    assert_eq!(model.element_name(element), "NS.Book/Author");
    assert!(model
        .annotation(element, "Org.OData.Capabilities.V1.NavigationRestrictions")
        .is_some());
}

#[test]
fn test_each_build_gets_a_fresh_model_id() {
    let a = bookstore();
    let b = bookstore();
    assert_ne!(a.id(), b.id());
}

#[test]
fn test_builder_matches_document_semantics() {
    let model = EdmModelBuilder::new("NS")
        .entity_type(
            EntityTypeDef::new("Book")
                .key(["Id"])
                .property("Id", "Edm.Int32")
                .navigation("Author", "Author", false),
        )
        .entity_type(EntityTypeDef::new("Author").key(["Id"]))
        .operation(
            OperationDef::function("Similar")
                .bound_to("Book", false)
                .parameter("limit", "Edm.Int32")
                .returns("NS.Book", true),
        )
        .container(
            ContainerDef::new("Default")
                .entity_set("Books", "Book")
                .binding("Author", "Authors")
                .entity_set("Authors", "Author"),
        )
        .annotate(
            "NS.Default/Books",
            "Org.OData.Capabilities.V1.TopSupported",
            false,
        )
        .build()
        .unwrap();

    let books = ElementRef::EntitySet(model.find_entity_set("Books").unwrap());
    assert_eq!(
        model.annotation(books, "Org.OData.Capabilities.V1.TopSupported"),
        Some(&RawValue::Bool(false))
    );
    let book = model.find_entity_type("NS.Book").unwrap();
    let similar = model.bound_operations(book, false);
    assert_eq!(model.operation(similar[0]).qualified_name(), "NS.Similar");
    assert!(model.navigation_binding(books, "Author").is_some());
}

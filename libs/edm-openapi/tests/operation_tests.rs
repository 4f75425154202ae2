#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Bound and imported actions and functions.

mod common;

use common::{methods, operation, param_names, run, run_with, templates};
use edm_model::{ContainerDef, EdmModel, EdmModelBuilder, EntityTypeDef, OperationDef};
use edm_openapi::ConvertSettings;
use edm_openapi::synth::{BodyParameter, ParamLocation, ShapeRef};
use http::Method;

fn library() -> EdmModel {
    EdmModelBuilder::new("NS")
        .entity_type(EntityTypeDef::new("Book").key(["Id"]).property("Id", "Edm.Int32"))
        .operation(
            OperationDef::function("Recommend")
                .bound_to("Book", false)
                .parameter("count", "Edm.Int32")
                .returns("NS.Book", true),
        )
        .operation(
            OperationDef::action("Publish")
                .bound_to("Book", false)
                .parameter("when", "Edm.DateTimeOffset"),
        )
        .operation(OperationDef::action("Archive").bound_to("Book", true))
        .operation(
            OperationDef::function("Top")
                .parameter("n", "Edm.Int32")
                .returns("NS.Book", true),
        )
        .container(
            ContainerDef::new("Default")
                .entity_set("Books", "Book")
                .operation_import("Top", "Top"),
        )
        .build()
        .unwrap()
}

#[test]
fn test_operation_paths() {
    let conversion = run(&library());
    assert_eq!(
        templates(&conversion),
        [
            "/Books",
            "/Top(n={n})",
            "/Books/{Id}",
            "/Books/NS.Archive",
            "/Books/$count",
            "/Books/{Id}/NS.Recommend(count={count})",
            "/Books/{Id}/NS.Publish",
        ]
    );
}

#[test]
fn test_bound_function_is_get_with_path_parameters() {
    let conversion = run(&library());
    let template = "/Books/{Id}/NS.Recommend(count={count})";
    assert_eq!(methods(&conversion, template), [Method::GET]);

    let op = operation(&conversion, template, &Method::GET);
    assert_eq!(op.operation_id, "Books.Recommend");
    let names = param_names(op);
    assert_eq!(&names[..2], ["Id", "count"]);
    assert!(names.contains(&"$filter"));
    assert!(op.params[..2].iter().all(|p| p.location == ParamLocation::Path));
    assert_eq!(
        op.responses[0].shape,
        Some(ShapeRef::Type {
            type_name: "NS.Book".to_owned(),
            collection: true
        })
    );
}

#[test]
fn test_bound_action_is_post_with_body() {
    let conversion = run(&library());
    assert_eq!(methods(&conversion, "/Books/{Id}/NS.Publish"), [Method::POST]);
    let op = operation(&conversion, "/Books/{Id}/NS.Publish", &Method::POST);
    assert_eq!(op.operation_id, "Books.Publish");
    assert_eq!(param_names(op), ["Id"]);
    assert_eq!(
        op.request_body.as_ref().unwrap().shape,
        ShapeRef::Parameters(vec![BodyParameter {
            name: "when".to_owned(),
            type_name: "Edm.DateTimeOffset".to_owned(),
            collection: false,
            nullable: true,
        }])
    );
    assert_eq!(op.success_status(), Some(204));

    let archive = operation(&conversion, "/Books/NS.Archive", &Method::POST);
    assert!(archive.request_body.is_none());
}

#[test]
fn test_function_import() {
    let conversion = run(&library());
    assert_eq!(methods(&conversion, "/Top(n={n})"), [Method::GET]);
    let op = operation(&conversion, "/Top(n={n})", &Method::GET);
    assert_eq!(op.operation_id, "Top");
    assert_eq!(op.params[0].name, "n");
    assert_eq!(op.params[0].location, ParamLocation::Path);
}

#[test]
fn test_operation_paths_can_be_disabled() {
    let settings = ConvertSettings {
        enable_operation_paths: false,
        ..ConvertSettings::default()
    };
    let conversion = run_with(&library(), &settings);
    assert_eq!(
        templates(&conversion),
        ["/Books", "/Top(n={n})", "/Books/{Id}", "/Books/$count"]
    );
}

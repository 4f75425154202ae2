#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! Shared fixtures: a small bookstore model and lookup helpers.

use edm_model::{ContainerDef, EdmModel, EdmModelBuilder, EntityTypeDef};
use edm_openapi::synth::Constraint;
use edm_openapi::{Conversion, ConvertSettings, OperationDescriptor, convert};
use http::Method;

/// Qualified name of a capabilities term.
pub fn term(name: &str) -> String {
    format!("Org.OData.Capabilities.V1.{name}")
}

/// Book (key `Id`, single `Author`, contained `Reviews`), Author (key `Id`,
/// collection `Books`) and Review (key `Id`) with `Books` and `Authors`
/// bound to each other.
pub fn bookstore() -> EdmModelBuilder {
    EdmModelBuilder::new("NS")
        .entity_type(
            EntityTypeDef::new("Book")
                .key(["Id"])
                .property("Id", "Edm.Int32")
                .property("Title", "Edm.String")
                .navigation("Author", "Author", false)
                .containment("Reviews", "Review", true),
        )
        .entity_type(
            EntityTypeDef::new("Author")
                .key(["Id"])
                .property("Id", "Edm.Int32")
                .navigation("Books", "Book", true),
        )
        .entity_type(
            EntityTypeDef::new("Review")
                .key(["Id"])
                .property("Id", "Edm.Int32"),
        )
        .container(
            ContainerDef::new("Default")
                .entity_set("Books", "Book")
                .binding("Author", "Authors")
                .entity_set("Authors", "Author")
                .binding("Books", "Books"),
        )
}

/// Only `Books` over a keyed `Book`.
pub fn books() -> EdmModelBuilder {
    EdmModelBuilder::new("NS")
        .entity_type(
            EntityTypeDef::new("Book")
                .key(["Id"])
                .property("Id", "Edm.Int32")
                .property("Title", "Edm.String"),
        )
        .container(ContainerDef::new("Default").entity_set("Books", "Book"))
}

pub fn run(model: &EdmModel) -> Conversion {
    convert(model, &ConvertSettings::default()).unwrap()
}

pub fn run_with(model: &EdmModel, settings: &ConvertSettings) -> Conversion {
    convert(model, settings).unwrap()
}

pub fn templates(conversion: &Conversion) -> Vec<&str> {
    conversion.paths.iter().map(|p| p.template()).collect()
}

pub fn methods(conversion: &Conversion, template: &str) -> Vec<Method> {
    let path = conversion
        .path(template)
        .unwrap_or_else(|| panic!("no path {template}"));
    conversion
        .operations_for(path)
        .iter()
        .map(|op| op.method.clone())
        .collect()
}

pub fn operation<'a>(
    conversion: &'a Conversion,
    template: &str,
    method: &Method,
) -> &'a OperationDescriptor {
    let path = conversion
        .path(template)
        .unwrap_or_else(|| panic!("no path {template}"));
    conversion
        .operations_for(path)
        .iter()
        .find(|op| op.method == *method)
        .unwrap_or_else(|| panic!("no {method} on {template}"))
}

pub fn param_names(op: &OperationDescriptor) -> Vec<&str> {
    op.params.iter().map(|p| p.name.as_str()).collect()
}

pub fn has_constraint(op: &OperationDescriptor, constraint: &Constraint) -> bool {
    op.constraints.contains(constraint)
}

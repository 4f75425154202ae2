//! Assembly of the `OpenAPI` document from a finished conversion.

use std::collections::{BTreeSet, HashMap};

use edm_model::{EdmModel, EntityTypeId};
use http::Method;
use serde::{Deserialize, Serialize};
use utoipa::openapi::{
    OpenApi, OpenApiBuilder, Ref, RefOr, Required,
    content::{Content, ContentBuilder},
    example::ExampleBuilder,
    extensions::Extensions,
    info::InfoBuilder,
    path::{
        HttpMethod, Operation, OperationBuilder, Parameter, ParameterBuilder, ParameterIn,
        PathItemBuilder, PathsBuilder,
    },
    request_body::RequestBodyBuilder,
    response::{Response, ResponseBuilder, ResponsesBuilder},
    schema::{
        Array, Components, ComponentsBuilder, KnownFormat, ObjectBuilder, Schema, SchemaFormat,
        SchemaType, Type,
    },
    security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme},
    server::ServerBuilder,
};

use crate::capabilities::ExampleValue;
use crate::convert::Conversion;
use crate::error::ConvertError;
use crate::synth::{
    ERROR_SCHEMA, OperationDescriptor, ParamLocation, ParamSpec, ParamType, RequestBodySpec,
    ResponseSpec, ShapeRef,
};

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentInfo {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Base URL of the service, emitted as the only server entry.
    #[serde(default)]
    pub server_url: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            description: None,
            server_url: None,
        }
    }
}

fn default_title() -> String {
    "OData Service".to_owned()
}

fn default_version() -> String {
    "1.0.0".to_owned()
}

/// Schemas for EDM type names.
pub trait SchemaProvider {
    /// Schema of a primitive or otherwise unknown type name.
    fn primitive(&self, type_name: &str) -> Schema;

    /// Component schema of an entity type.
    fn entity(&self, model: &EdmModel, entity_type: EntityTypeId) -> Schema;
}

/// Maps EDM primitive types onto JSON schema types; entity schemas list the
/// structural properties of the whole type chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct EdmSchemaProvider;

impl SchemaProvider for EdmSchemaProvider {
    fn primitive(&self, type_name: &str) -> Schema {
        let (ty, format) = match type_name {
            "Edm.Boolean" => (Type::Boolean, None),
            "Edm.Byte" | "Edm.SByte" | "Edm.Int16" | "Edm.Int32" => {
                (Type::Integer, Some(KnownFormat::Int32))
            }
            "Edm.Int64" => (Type::Integer, Some(KnownFormat::Int64)),
            "Edm.Single" => (Type::Number, Some(KnownFormat::Float)),
            "Edm.Double" | "Edm.Decimal" => (Type::Number, Some(KnownFormat::Double)),
            "Edm.Guid" => (Type::String, Some(KnownFormat::Uuid)),
            "Edm.Date" => (Type::String, Some(KnownFormat::Date)),
            "Edm.DateTimeOffset" => (Type::String, Some(KnownFormat::DateTime)),
            "Edm.Binary" => (Type::String, Some(KnownFormat::Byte)),
            _ => (Type::String, None),
        };
        Schema::Object(
            ObjectBuilder::new()
                .schema_type(SchemaType::Type(ty))
                .format(format.map(SchemaFormat::KnownFormat))
                .build(),
        )
    }

    fn entity(&self, model: &EdmModel, entity_type: EntityTypeId) -> Schema {
        let ty = model.entity_type(entity_type);
        let mut object = ObjectBuilder::new()
            .schema_type(SchemaType::Type(Type::Object))
            .title(Some(ty.qualified_name()));
        let mut chain: Vec<EntityTypeId> = model.type_chain(entity_type).collect();
        chain.reverse();
        for id in chain {
            for property in &model.entity_type(id).properties {
                object = object.property(
                    property.name.clone(),
                    type_schema(self, model, &property.type_name, false),
                );
            }
        }
        for nav in model.navigation_properties(entity_type) {
            let nav = model.navigation(nav);
            let target = model.entity_type(nav.target).qualified_name();
            object = object.property(nav.name.clone(), schema_ref(&target, nav.collection));
        }
        for key in model.key(entity_type) {
            object = object.required(key.clone());
        }
        Schema::Object(object.build())
    }
}

fn component_ref(name: &str) -> RefOr<Schema> {
    RefOr::Ref(Ref::new(format!("#/components/schemas/{name}")))
}

fn schema_ref(name: &str, collection: bool) -> RefOr<Schema> {
    if collection {
        RefOr::T(Schema::Array(Array::new(component_ref(name))))
    } else {
        component_ref(name)
    }
}

/// Entity types become references, everything else is mapped inline.
fn type_schema<P: SchemaProvider + ?Sized>(
    provider: &P,
    model: &EdmModel,
    type_name: &str,
    collection: bool,
) -> RefOr<Schema> {
    if model.find_entity_type(type_name).is_some() {
        return schema_ref(type_name, collection);
    }
    let schema = provider.primitive(type_name);
    if collection {
        RefOr::T(Schema::Array(Array::new(schema)))
    } else {
        RefOr::T(schema)
    }
}

/// `{ "value": [...] }` wrapper of collection payloads.
fn value_wrapper(items: RefOr<Schema>) -> RefOr<Schema> {
    RefOr::T(Schema::Object(
        ObjectBuilder::new()
            .schema_type(SchemaType::Type(Type::Object))
            .property("value", Schema::Array(Array::new(items)))
            .build(),
    ))
}

fn typed(ty: Type) -> Schema {
    Schema::Object(ObjectBuilder::new().schema_type(SchemaType::Type(ty)).build())
}

fn reference_schema() -> Schema {
    Schema::Object(
        ObjectBuilder::new()
            .schema_type(SchemaType::Type(Type::Object))
            .property("@odata.id", typed(Type::String))
            .required("@odata.id")
            .build(),
    )
}

fn error_schema() -> Schema {
    let detail = ObjectBuilder::new()
        .schema_type(SchemaType::Type(Type::Object))
        .property("code", typed(Type::String))
        .property("message", typed(Type::String))
        .property("target", typed(Type::String))
        .required("code")
        .required("message")
        .build();
    Schema::Object(
        ObjectBuilder::new()
            .schema_type(SchemaType::Type(Type::Object))
            .property("error", Schema::Object(detail))
            .required("error")
            .build(),
    )
}

/// Shapes and their components, built against one model.
struct Assembler<'a, P: ?Sized> {
    model: &'a EdmModel,
    provider: &'a P,
    operation_ids: HashMap<String, usize>,
    schemes: BTreeSet<String>,
}

impl<'a, P: SchemaProvider + ?Sized> Assembler<'a, P> {
    fn new(model: &'a EdmModel, provider: &'a P) -> Self {
        Self {
            model,
            provider,
            operation_ids: HashMap::new(),
            schemes: BTreeSet::new(),
        }
    }

    fn shape(&self, shape: &ShapeRef) -> RefOr<Schema> {
        match shape {
            ShapeRef::Entity { type_name } => component_ref(type_name),
            ShapeRef::EntityCollection { type_name } => value_wrapper(component_ref(type_name)),
            ShapeRef::Type {
                type_name,
                collection: true,
            } => value_wrapper(type_schema(self.provider, self.model, type_name, false)),
            ShapeRef::Type {
                type_name,
                collection: false,
            } => type_schema(self.provider, self.model, type_name, false),
            ShapeRef::Parameters(parameters) => {
                let mut object = ObjectBuilder::new().schema_type(SchemaType::Type(Type::Object));
                for p in parameters {
                    object = object.property(
                        p.name.clone(),
                        type_schema(self.provider, self.model, &p.type_name, p.collection),
                    );
                    if !p.nullable {
                        object = object.required(p.name.clone());
                    }
                }
                RefOr::T(Schema::Object(object.build()))
            }
            ShapeRef::Count => RefOr::T(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(SchemaType::Type(Type::Integer))
                    .format(Some(SchemaFormat::KnownFormat(KnownFormat::Int64)))
                    .build(),
            )),
            ShapeRef::Reference => RefOr::T(reference_schema()),
            ShapeRef::ReferenceCollection => value_wrapper(RefOr::T(reference_schema())),
            ShapeRef::Error => component_ref(ERROR_SCHEMA),
        }
    }

    fn content(&self, shape: &ShapeRef) -> Content {
        ContentBuilder::new().schema(Some(self.shape(shape))).build()
    }

    /// First use keeps the id; later uses get a numeric suffix.
    fn unique_id(&mut self, id: &str) -> String {
        let seen = self.operation_ids.entry(id.to_owned()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            id.to_owned()
        } else {
            format!("{id}-{seen}")
        }
    }

    fn parameter(&self, p: &ParamSpec) -> Parameter {
        let parameter_in = match p.location {
            ParamLocation::Path => ParameterIn::Path,
            ParamLocation::Query => ParameterIn::Query,
            ParamLocation::Header => ParameterIn::Header,
            ParamLocation::Cookie => ParameterIn::Cookie,
        };
        let schema = match &p.param_type {
            ParamType::Edm(type_name) => self.provider.primitive(type_name),
            ParamType::Integer => typed(Type::Integer),
            ParamType::Boolean => typed(Type::Boolean),
            ParamType::String => typed(Type::String),
            ParamType::StringList => Schema::Array(Array::new(typed(Type::String))),
        };
        let mut description = p.description.clone().unwrap_or_default();
        for constraint in &p.constraints {
            if !description.is_empty() {
                description.push_str("; ");
            }
            description.push_str(&constraint.to_string());
        }
        ParameterBuilder::new()
            .name(&p.name)
            .parameter_in(parameter_in)
            .required(if p.required { Required::True } else { Required::False })
            .description((!description.is_empty()).then_some(description))
            .schema(Some(schema))
            .extensions(parameter_examples(&p.examples))
            .build()
    }

    fn response(&self, r: &ResponseSpec) -> Response {
        let mut response = ResponseBuilder::new().description(&r.description);
        if let Some(shape) = &r.shape {
            response = response.content(r.content_type, self.content(shape));
        }
        response.build()
    }

    fn request_body(&self, body: &RequestBodySpec) -> utoipa::openapi::request_body::RequestBody {
        RequestBodyBuilder::new()
            .description(body.description.clone())
            .content(body.content_type, self.content(&body.shape))
            .required(Some(if body.required { Required::True } else { Required::False }))
            .build()
    }

    fn operation(&mut self, descriptor: &OperationDescriptor) -> Operation {
        let mut op = OperationBuilder::new()
            .operation_id(Some(self.unique_id(&descriptor.operation_id)))
            .summary(Some(descriptor.summary.clone()))
            .description(descriptor.description.clone());
        for tag in &descriptor.tags {
            op = op.tag(tag.clone());
        }
        for p in &descriptor.params {
            op = op.parameter(self.parameter(p));
        }
        if let Some(body) = &descriptor.request_body {
            op = op.request_body(Some(self.request_body(body)));
        }
        let mut responses = ResponsesBuilder::new();
        for r in &descriptor.responses {
            responses = responses.response(r.status.to_string(), self.response(r));
        }
        op = op.responses(responses.build());
        for requirement in &descriptor.security {
            self.schemes.insert(requirement.scheme.clone());
            op = op.security(SecurityRequirement::new(
                requirement.scheme.clone(),
                requirement.scopes.clone(),
            ));
        }
        if !descriptor.constraints.is_empty() {
            let mut ext = Extensions::default();
            ext.insert(
                "x-constraints".to_owned(),
                serde_json::Value::from(
                    descriptor
                        .constraints
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                ),
            );
            op = op.extensions(Some(ext));
        }
        op.build()
    }

    fn components(&self, conversion: &Conversion) -> Components {
        let mut referenced = BTreeSet::new();
        for path in &conversion.paths {
            if let Some(ty) = path.entity_type() {
                referenced.insert(ty);
                for nav in self.model.navigation_properties(ty) {
                    referenced.insert(self.model.navigation(nav).target);
                }
            }
        }
        let mut components = ComponentsBuilder::new().schema(ERROR_SCHEMA, error_schema());
        for ty in referenced {
            components = components.schema(
                self.model.entity_type(ty).qualified_name(),
                self.provider.entity(self.model, ty),
            );
        }
        for scheme in &self.schemes {
            components = components.security_scheme(
                scheme,
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
        components.build()
    }
}

/// `examples` map of a parameter, keyed `example-1`, `example-2` and on.
/// `Parameter` has no such field; its flattened extensions carry it.
fn parameter_examples(examples: &[ExampleValue]) -> Option<Extensions> {
    if examples.is_empty() {
        return None;
    }
    let map: serde_json::Map<String, serde_json::Value> = examples
        .iter()
        .enumerate()
        .filter_map(|(i, example)| {
            let mut builder = ExampleBuilder::new().value(example.value.clone());
            if let Some(description) = &example.description {
                builder = builder.description(description);
            }
            if let Some(url) = &example.external_value {
                builder = builder.external_value(url);
            }
            let json = serde_json::to_value(builder.build()).ok()?;
            Some((format!("example-{}", i + 1), json))
        })
        .collect();
    let mut ext = Extensions::default();
    ext.insert("examples".to_owned(), serde_json::Value::Object(map));
    Some(ext)
}

fn http_method(method: &Method) -> HttpMethod {
    match *method {
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::PATCH => HttpMethod::Patch,
        Method::DELETE => HttpMethod::Delete,
        _ => HttpMethod::Get,
    }
}

/// Builds the document with [`EdmSchemaProvider`] schemas.
#[must_use]
pub fn build_openapi(model: &EdmModel, conversion: &Conversion, info: &DocumentInfo) -> OpenApi {
    build_openapi_with(model, conversion, info, &EdmSchemaProvider)
}

/// Builds the document; one path item per path, operations in
/// synthesis order.
#[must_use]
pub fn build_openapi_with<P: SchemaProvider + ?Sized>(
    model: &EdmModel,
    conversion: &Conversion,
    info: &DocumentInfo,
    provider: &P,
) -> OpenApi {
    let mut assembler = Assembler::new(model, provider);
    let mut paths = PathsBuilder::new();
    for (path, operations) in conversion.by_path() {
        if operations.is_empty() {
            tracing::trace!(path = %path, "no operations, path omitted");
            continue;
        }
        let mut item = PathItemBuilder::new();
        for descriptor in operations {
            item = item.operation(http_method(&descriptor.method), assembler.operation(descriptor));
        }
        paths = paths.path(path.template(), item.build());
    }

    let components = assembler.components(conversion);
    let mut openapi = OpenApiBuilder::new()
        .info(
            InfoBuilder::new()
                .title(&info.title)
                .version(&info.version)
                .description(info.description.clone())
                .build(),
        )
        .paths(paths.build())
        .components(Some(components));
    if let Some(url) = &info.server_url {
        openapi = openapi.servers(Some(vec![ServerBuilder::new().url(url).build()]));
    }
    tracing::debug!(operations = conversion.operations.len(), "OpenAPI document built");
    openapi.build()
}

/// Pretty-printed JSON of `openapi`.
///
/// # Errors
/// Returns `ConvertError::Serialize` when serialization fails.
pub fn to_json(openapi: &OpenApi) -> Result<String, ConvertError> {
    Ok(openapi.to_pretty_json()?)
}

//! Per-path HTTP operation synthesis.
//!
//! The kind of a path's last segment decides the candidate verbs; each verb
//! is then kept unless the restriction governing it explicitly disallows it.
//! Query option capabilities only shape parameters, exclusion lists become
//! [`Constraint`]s, permissions and custom parameters become security and
//! parameter metadata.

mod context;
pub mod descriptor;
mod query;

use std::sync::Arc;

use edm_model::{OperationKind, ReturnType};
use http::Method;

pub use descriptor::{
    APPLICATION_JSON, BodyParameter, Constraint, OperationDescriptor, ParamLocation, ParamSpec,
    ParamType, RequestBodySpec, ResponseSpec, ResponseStatus, SecurityRequirement, ShapeRef,
    TEXT_PLAIN,
};

use crate::capabilities::{
    CustomParameter, DeleteRestrictions, InsertRestrictions, Permission, ReadRestrictionsBase,
    UpdateRestrictions,
};
use crate::paths::{ODataPath, PathKind, PathSegment};
use crate::resolver::RestrictionResolver;
use context::PathContext;
use query::listed;

/// Name of the component schema every error response refers to.
pub const ERROR_SCHEMA: &str = "ODataError";

/// Decides the operations of each path.
#[derive(Clone, Copy)]
pub struct OperationSynthesizer<'a> {
    resolver: RestrictionResolver<'a>,
}

impl<'a> OperationSynthesizer<'a> {
    #[must_use]
    pub const fn new(resolver: RestrictionResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Operations of `path`, in verb order.
    #[must_use]
    pub fn synthesize(&self, path: &Arc<ODataPath>) -> Vec<OperationDescriptor> {
        let Some(ctx) = PathContext::new(self.resolver, path) else {
            return Vec::new();
        };
        let out = match ctx.kind() {
            PathKind::EntitySet => Self::collection(&ctx),
            PathKind::NavigationProperty if path.is_collection() => Self::collection(&ctx),
            PathKind::Entity => Self::entity(&ctx),
            PathKind::Singleton => Self::singleton(&ctx),
            PathKind::NavigationProperty => Self::single_navigation(&ctx),
            PathKind::TypeCast => Self::type_cast(&ctx),
            PathKind::Count => Self::count(&ctx),
            PathKind::Ref => Self::reference(&ctx),
            PathKind::Operation | PathKind::OperationImport => self.operation(&ctx),
        };
        tracing::trace!(path = %path, operations = out.len(), "operations synthesized");
        out
    }

    /// GET and POST on an entity set or a collection-valued navigation.
    fn collection(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        let mut out = Vec::new();
        if r.read.is_readable() {
            let mut op =
                Self::descriptor(ctx, Method::GET, "List", format!("List {}", ctx.tag()));
            op.params.extend(query::collection_query(r));
            with_read(&mut op, &r.read.base);
            op.responses.insert(0, ok(200, "Retrieved entities", collection_shape(ctx)));
            out.push(op);
        }
        let excluded = ctx.root.as_ref().is_some_and(|root| {
            root.insert.is_non_insertable_navigation_property(&ctx.navigation_path)
        });
        if r.insert.is_insertable() && !excluded {
            out.push(Self::create(ctx, &r.insert));
        }
        out
    }

    fn create(ctx: &PathContext<'_>, insert: &InsertRestrictions) -> OperationDescriptor {
        let summary = format!("Create {}", ctx.type_label);
        let mut op = Self::descriptor(ctx, Method::POST, "Create", summary);
        op.params.extend(query::modification_query(
            insert.query_options.as_ref(),
            &ctx.restrictions,
        ));
        with_custom(
            &mut op,
            insert.permissions.as_deref(),
            insert.custom_headers.as_deref(),
            insert.custom_query_options.as_deref(),
        );
        op.description.clone_from(&insert.description);
        op.constraints.extend(
            [
                listed(
                    insert.non_insertable_properties.as_deref(),
                    Constraint::NonInsertableProperties,
                ),
                listed(
                    insert.non_insertable_navigation_properties.as_deref(),
                    Constraint::NonInsertableNavigationProperties,
                ),
                query::deep_levels(insert.max_levels),
            ]
            .into_iter()
            .flatten(),
        );
        op.request_body = entity_body(ctx, "New entity");
        op.responses.insert(0, ok(201, "Created entity", entity_shape(ctx)));
        op
    }

    /// GET, PATCH or PUT and DELETE on an entity addressed by key. Behind a
    /// navigation property the root's exclusion lists can remove PATCH and
    /// DELETE.
    fn entity(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        if !r.indexable.is_supported() {
            tracing::debug!(path = %ctx.path, "not indexable by key, no operations");
            return Vec::new();
        }
        let (updatable, deletable) = Self::root_gates(ctx);
        let mut out = Vec::new();
        if r.read.is_readable_by_key() {
            out.push(Self::read_entity(ctx, r.read.by_key()));
        }
        if updatable && r.update.is_updatable() {
            out.push(Self::update(ctx, &r.update));
        }
        if deletable && r.delete.is_deletable() {
            out.push(Self::delete(ctx, &r.delete));
        }
        out
    }

    fn singleton(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        let mut out = Vec::new();
        if r.read.is_readable() {
            out.push(Self::read_entity(ctx, &r.read.base));
        }
        if r.update.is_updatable() {
            out.push(Self::update(ctx, &r.update));
        }
        out
    }

    /// GET and PATCH on a single-valued navigation property; containment
    /// adds DELETE. The root's exclusion lists can remove PATCH and DELETE.
    fn single_navigation(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        let (updatable, deletable) = Self::root_gates(ctx);
        let mut out = Vec::new();
        if r.read.is_readable() {
            out.push(Self::read_entity(ctx, &r.read.base));
        }
        if updatable && r.update.is_updatable() {
            out.push(Self::update(ctx, &r.update));
        }
        if ctx.path.is_containment() && deletable && r.delete.is_deletable() {
            out.push(Self::delete(ctx, &r.delete));
        }
        out
    }

    /// Whether the root still allows updating and deleting through the
    /// navigation property of `ctx`. Paths without navigation allow both.
    fn root_gates(ctx: &PathContext<'_>) -> (bool, bool) {
        let nav = ctx.navigation_path.as_str();
        ctx.root.as_ref().map_or((true, true), |root| {
            (
                !root.update.is_non_updatable_navigation_property(nav),
                !root.delete.is_non_deletable_navigation_property(nav),
            )
        })
    }

    fn type_cast(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        if !r.read.is_readable() {
            return Vec::new();
        }
        let collection = ctx.path.is_collection();
        let (verb, summary) = if collection {
            ("List", format!("List {} as {}", ctx.tag(), ctx.type_label))
        } else {
            ("Get", format!("Get {} as {}", ctx.tag(), ctx.type_label))
        };
        let mut op = Self::descriptor(ctx, Method::GET, verb, summary);
        if collection {
            op.params.extend(query::collection_query(r));
            op.responses.insert(0, ok(200, "Retrieved entities", collection_shape(ctx)));
        } else {
            op.params.extend(query::entity_query(r));
            op.responses.insert(0, ok(200, "Retrieved entity", entity_shape(ctx)));
        }
        with_read(&mut op, &r.read.base);
        vec![op]
    }

    fn count(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        let excluded = ctx.root.as_ref().is_some_and(|root| {
            root.count.is_non_countable_navigation_property(&ctx.navigation_path)
        });
        if !r.count.is_countable() || excluded {
            return Vec::new();
        }
        let mut op = Self::descriptor(
            ctx,
            Method::GET,
            "GetCount",
            format!("Get the number of {}", ctx.tag()),
        );
        op.params.extend(
            query::collection_query(r)
                .into_iter()
                .filter(|p| matches!(p.name.as_str(), "$search" | "$filter")),
        );
        with_read(&mut op, &r.read.base);
        op.responses.insert(
            0,
            ResponseSpec {
                status: ResponseStatus::Code(200),
                content_type: TEXT_PLAIN,
                description: "The count of the resource".to_owned(),
                shape: Some(ShapeRef::Count),
            },
        );
        vec![op]
    }

    /// `$ref` of a reference navigation property.
    fn reference(ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let r = &ctx.restrictions;
        let nav = ctx.navigation_path.as_str();
        let collection = ctx.path.is_collection();
        let root = ctx.root.as_ref();
        let insertable =
            root.is_none_or(|root| !root.insert.is_non_insertable_navigation_property(nav));
        let updatable =
            root.is_none_or(|root| !root.update.is_non_updatable_navigation_property(nav));
        let deletable =
            root.is_none_or(|root| !root.delete.is_non_deletable_navigation_property(nav));

        let mut out = Vec::new();
        if r.read.is_readable() {
            let summary = format!("Get ref of {}", ctx.tag());
            let mut op = Self::descriptor(ctx, Method::GET, "GetRef", summary);
            if collection {
                op.params.extend(
                    query::collection_query(r)
                        .into_iter()
                        .filter(|p| !matches!(p.name.as_str(), "$select" | "$expand")),
                );
            }
            let shape = if collection {
                ShapeRef::ReferenceCollection
            } else {
                ShapeRef::Reference
            };
            op.responses.insert(0, ok(200, "Retrieved reference", Some(shape)));
            out.push(op);
        }
        if collection && insertable {
            let summary = format!("Create new navigation property ref to {}", ctx.tag());
            let mut op = Self::descriptor(ctx, Method::POST, "CreateRef", summary);
            op.request_body = Some(reference_body());
            op.responses.insert(0, no_content());
            out.push(op);
        }
        if !collection && updatable {
            let summary = format!("Update the ref of {}", ctx.tag());
            let mut op = Self::descriptor(ctx, Method::PUT, "SetRef", summary);
            op.request_body = Some(reference_body());
            op.responses.insert(0, no_content());
            out.push(op);
        }
        if deletable {
            let summary = format!("Delete ref of {}", ctx.tag());
            let mut op = Self::descriptor(ctx, Method::DELETE, "DeleteRef", summary);
            if collection {
                op.params.push(ParamSpec {
                    name: "$id".to_owned(),
                    location: ParamLocation::Query,
                    required: true,
                    description: Some("The delete Uri".to_owned()),
                    param_type: ParamType::String,
                    constraints: Vec::new(),
                    examples: Vec::new(),
                });
            }
            op.responses.insert(0, no_content());
            out.push(op);
        }
        out
    }

    /// Functions are invoked with GET and their parameters in the path,
    /// actions with POST and their parameters in the body.
    fn operation(&self, ctx: &PathContext<'_>) -> Vec<OperationDescriptor> {
        let model = self.resolver.model();
        let (id, name) = match ctx.path.last_segment() {
            Some(PathSegment::Operation(id)) => (*id, model.operation(*id).qualified_name()),
            Some(PathSegment::OperationImport(import)) => {
                let import = model.operation_import(*import);
                (import.operation, import.name.clone())
            }
            _ => return Vec::new(),
        };
        let operation = model.operation(id);
        let prefix = if ctx.kind() == PathKind::OperationImport {
            String::new()
        } else {
            format!("{}.", ctx.prefix)
        };
        let operation_id = format!("{prefix}{}", operation.name);

        let mut op = match operation.kind {
            OperationKind::Function => {
                let summary = format!("Invoke function {name}");
                let mut op = Self::descriptor(ctx, Method::GET, "", summary);
                let returns_collection =
                    operation.return_type.as_ref().is_some_and(|r| r.collection);
                if returns_collection && ctx.type_name.is_some() {
                    op.params.extend(query::collection_query(&ctx.restrictions));
                }
                op
            }
            OperationKind::Action => {
                let summary = format!("Invoke action {name}");
                let mut op = Self::descriptor(ctx, Method::POST, "", summary);
                if !operation.parameters.is_empty() {
                    op.request_body = Some(RequestBodySpec {
                        content_type: APPLICATION_JSON,
                        description: Some("Action parameters".to_owned()),
                        shape: ShapeRef::Parameters(
                            operation
                                .parameters
                                .iter()
                                .map(|p| BodyParameter {
                                    name: p.name.clone(),
                                    type_name: p.type_name.clone(),
                                    collection: p.collection,
                                    nullable: p.nullable,
                                })
                                .collect(),
                        ),
                        required: true,
                    });
                }
                op
            }
        };
        op.operation_id = operation_id;
        op.responses.insert(0, operation_response(operation.return_type.as_ref()));
        vec![op]
    }

    fn read_entity(ctx: &PathContext<'_>, read: &ReadRestrictionsBase) -> OperationDescriptor {
        let mut op = Self::descriptor(ctx, Method::GET, "Get", format!("Get {}", ctx.tag()));
        op.params.extend(query::entity_query(&ctx.restrictions));
        with_read(&mut op, read);
        op.responses.insert(0, ok(200, "Retrieved entity", entity_shape(ctx)));
        op
    }

    fn update(ctx: &PathContext<'_>, update: &UpdateRestrictions) -> OperationDescriptor {
        let method = update.update_method().method();
        let verb = if method == Method::PUT { "Set" } else { "Update" };
        let mut op = Self::descriptor(ctx, method, verb, format!("Update {}", ctx.tag()));
        op.params.extend(query::modification_query(
            update.query_options.as_ref(),
            &ctx.restrictions,
        ));
        with_custom(
            &mut op,
            update.permissions.as_deref(),
            update.custom_headers.as_deref(),
            update.custom_query_options.as_deref(),
        );
        op.description.clone_from(&update.description);
        op.constraints.extend(
            [
                listed(
                    update.non_updatable_navigation_properties.as_deref(),
                    Constraint::NonUpdatableNavigationProperties,
                ),
                query::deep_levels(update.max_levels),
            ]
            .into_iter()
            .flatten(),
        );
        op.request_body = entity_body(ctx, "New property values");
        op.responses.insert(0, no_content());
        op
    }

    fn delete(ctx: &PathContext<'_>, delete: &DeleteRestrictions) -> OperationDescriptor {
        let summary = format!("Delete {}", ctx.tag());
        let mut op = Self::descriptor(ctx, Method::DELETE, "Delete", summary);
        op.params.push(ParamSpec {
            name: "If-Match".to_owned(),
            location: ParamLocation::Header,
            required: false,
            description: Some("ETag".to_owned()),
            param_type: ParamType::String,
            constraints: Vec::new(),
            examples: Vec::new(),
        });
        with_custom(
            &mut op,
            delete.permissions.as_deref(),
            delete.custom_headers.as_deref(),
            delete.custom_query_options.as_deref(),
        );
        op.description.clone_from(&delete.description);
        op.constraints.extend(
            [
                listed(
                    delete.non_deletable_navigation_properties.as_deref(),
                    Constraint::NonDeletableNavigationProperties,
                ),
                query::deep_levels(delete.max_levels),
            ]
            .into_iter()
            .flatten(),
        );
        op.responses.insert(0, no_content());
        op
    }

    /// Skeleton with path parameters, tag, operation id and the default
    /// error response.
    fn descriptor(
        ctx: &PathContext<'_>,
        method: Method,
        verb: &str,
        summary: String,
    ) -> OperationDescriptor {
        OperationDescriptor {
            method,
            path: Arc::clone(ctx.path),
            operation_id: format!("{}.{verb}{}", ctx.prefix, ctx.type_label),
            summary,
            description: None,
            tags: vec![ctx.tag()],
            params: query::path_parameters(ctx.path),
            request_body: None,
            responses: vec![ResponseSpec {
                status: ResponseStatus::Default,
                content_type: APPLICATION_JSON,
                description: "Error".to_owned(),
                shape: Some(ShapeRef::Error),
            }],
            security: Vec::new(),
            constraints: Vec::new(),
        }
    }
}

fn with_read(op: &mut OperationDescriptor, read: &ReadRestrictionsBase) {
    with_custom(
        op,
        read.permissions.as_deref(),
        read.custom_headers.as_deref(),
        read.custom_query_options.as_deref(),
    );
    if op.description.is_none() {
        op.description.clone_from(&read.description);
    }
}

fn with_custom(
    op: &mut OperationDescriptor,
    permissions: Option<&[Permission]>,
    headers: Option<&[CustomParameter]>,
    options: Option<&[CustomParameter]>,
) {
    op.params.extend(query::custom_parameters(headers, options));
    op.security.extend(query::security(permissions));
}

fn ok(status: u16, description: &str, shape: Option<ShapeRef>) -> ResponseSpec {
    ResponseSpec {
        status: ResponseStatus::Code(status),
        content_type: APPLICATION_JSON,
        description: description.to_owned(),
        shape,
    }
}

fn no_content() -> ResponseSpec {
    ResponseSpec {
        status: ResponseStatus::Code(204),
        content_type: APPLICATION_JSON,
        description: "Success".to_owned(),
        shape: None,
    }
}

fn entity_shape(ctx: &PathContext<'_>) -> Option<ShapeRef> {
    ctx.type_name
        .clone()
        .map(|type_name| ShapeRef::Entity { type_name })
}

fn collection_shape(ctx: &PathContext<'_>) -> Option<ShapeRef> {
    ctx.type_name
        .clone()
        .map(|type_name| ShapeRef::EntityCollection { type_name })
}

fn entity_body(ctx: &PathContext<'_>, description: &str) -> Option<RequestBodySpec> {
    entity_shape(ctx).map(|shape| RequestBodySpec {
        content_type: APPLICATION_JSON,
        description: Some(description.to_owned()),
        shape,
        required: true,
    })
}

fn reference_body() -> RequestBodySpec {
    RequestBodySpec {
        content_type: APPLICATION_JSON,
        description: Some("New navigation property ref value".to_owned()),
        shape: ShapeRef::Reference,
        required: true,
    }
}

fn operation_response(return_type: Option<&ReturnType>) -> ResponseSpec {
    match return_type {
        Some(r) => ok(
            200,
            "Success",
            Some(ShapeRef::Type {
                type_name: r.type_name.clone(),
                collection: r.collection,
            }),
        ),
        None => no_content(),
    }
}

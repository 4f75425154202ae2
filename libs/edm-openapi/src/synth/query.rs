//! Query option, custom parameter and security shaping.

use crate::capabilities::{CustomParameter, ModificationQueryOptions, Permission};
use crate::paths::{ODataPath, ParameterSource};

use super::context::PathRestrictions;
use super::descriptor::{Constraint, ParamLocation, ParamSpec, ParamType, SecurityRequirement};

fn query(name: &str, description: &str, param_type: ParamType) -> ParamSpec {
    ParamSpec {
        name: name.to_owned(),
        location: ParamLocation::Query,
        required: false,
        description: Some(description.to_owned()),
        param_type,
        constraints: Vec::new(),
        examples: Vec::new(),
    }
}

pub fn listed(items: Option<&[String]>, make: fn(Vec<String>) -> Constraint) -> Option<Constraint> {
    items.filter(|list| !list.is_empty()).map(|list| make(list.to_vec()))
}

/// Template parameters of the path, in path order.
pub fn path_parameters(path: &ODataPath) -> Vec<ParamSpec> {
    path.parameters()
        .iter()
        .map(|p| ParamSpec {
            name: p.name.clone(),
            location: ParamLocation::Path,
            required: true,
            description: Some(match p.source {
                ParameterSource::Key => format!("Key: {}", p.binds),
                ParameterSource::Function => format!("Parameter: {}", p.binds),
            }),
            param_type: ParamType::Edm(p.type_name.clone()),
            constraints: Vec::new(),
            examples: Vec::new(),
        })
        .collect()
}

pub fn select(r: &PathRestrictions) -> Option<ParamSpec> {
    r.select
        .is_supported()
        .then(|| query("$select", "Select properties to be returned", ParamType::StringList))
}

pub fn expand(r: &PathRestrictions) -> Option<ParamSpec> {
    if !r.expand.is_expandable() {
        return None;
    }
    let mut param = query("$expand", "Expand related entities", ParamType::StringList);
    param.constraints.extend(listed(
        r.expand.non_expandable_properties.as_deref(),
        Constraint::NonExpandableProperties,
    ));
    param
        .constraints
        .extend(r.expand.max_levels_bound().map(Constraint::MaxExpandLevels));
    Some(param)
}

/// `$top`, `$skip`, `$search`, `$filter`, `$count`, `$orderby`, `$select`
/// and `$expand`, each present unless its capability is switched off.
pub fn collection_query(r: &PathRestrictions) -> Vec<ParamSpec> {
    let mut out = Vec::new();
    if r.top.is_supported() {
        out.push(query("$top", "Show only the first n items", ParamType::Integer));
    }
    if r.skip.is_supported() {
        out.push(query("$skip", "Skip the first n items", ParamType::Integer));
    }
    if r.search.is_searchable() {
        let mut param = query("$search", "Search items by search phrases", ParamType::String);
        param.constraints.extend(
            r.search
                .unsupported_expressions
                .clone()
                .map(Constraint::UnsupportedSearchExpressions),
        );
        out.push(param);
    }
    if r.filter.is_filterable() {
        let mut param = query("$filter", "Filter items by property values", ParamType::String);
        param.required = r.filter.is_requires_filter();
        if param.required {
            param.constraints.push(Constraint::RequiresFilter);
        }
        param.constraints.extend(listed(
            r.filter.required_properties.as_deref(),
            Constraint::RequiredFilterProperties,
        ));
        param.constraints.extend(listed(
            r.filter.non_filterable_properties.as_deref(),
            Constraint::NonFilterableProperties,
        ));
        out.push(param);
    }
    if r.count.is_countable() {
        let mut param = query("$count", "Include count of items", ParamType::Boolean);
        param.constraints.extend(listed(
            r.count.non_countable_properties.as_deref(),
            Constraint::NonCountableProperties,
        ));
        out.push(param);
    }
    if r.sort.is_sortable() {
        let mut param = query("$orderby", "Order items by property values", ParamType::StringList);
        param.constraints.extend(
            [
                listed(
                    r.sort.non_sortable_properties.as_deref(),
                    Constraint::NonSortableProperties,
                ),
                listed(
                    r.sort.ascending_only_properties.as_deref(),
                    Constraint::AscendingOnlyProperties,
                ),
                listed(
                    r.sort.descending_only_properties.as_deref(),
                    Constraint::DescendingOnlyProperties,
                ),
            ]
            .into_iter()
            .flatten(),
        );
        out.push(param);
    }
    out.extend(select(r));
    out.extend(expand(r));
    out
}

/// `$select` and `$expand` on a single entity.
pub fn entity_query(r: &PathRestrictions) -> Vec<ParamSpec> {
    select(r).into_iter().chain(expand(r)).collect()
}

/// `$select` and `$expand` on a write, only when explicitly enabled.
pub fn modification_query(
    options: Option<&ModificationQueryOptions>,
    r: &PathRestrictions,
) -> Vec<ParamSpec> {
    let Some(options) = options else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if options.is_select_supported() {
        out.extend(select(r));
    }
    if options.is_expand_supported() {
        out.extend(expand(r));
    }
    out
}

/// Custom headers followed by custom query options.
pub fn custom_parameters(
    headers: Option<&[CustomParameter]>,
    options: Option<&[CustomParameter]>,
) -> Vec<ParamSpec> {
    let as_param = |location: ParamLocation| {
        move |custom: &CustomParameter| ParamSpec {
            name: custom.name.clone(),
            location: location.clone(),
            required: custom.is_required(),
            description: custom.description.clone().or_else(|| {
                custom
                    .documentation_url
                    .as_ref()
                    .map(|url| format!("Documentation: {url}"))
            }),
            param_type: ParamType::String,
            constraints: Vec::new(),
            examples: custom.example_values.clone(),
        }
    };
    headers
        .into_iter()
        .flatten()
        .map(as_param(ParamLocation::Header))
        .chain(options.into_iter().flatten().map(as_param(ParamLocation::Query)))
        .collect()
}

/// One requirement per permission naming a scheme.
pub fn security(permissions: Option<&[Permission]>) -> Vec<SecurityRequirement> {
    permissions
        .into_iter()
        .flatten()
        .filter_map(|permission| {
            Some(SecurityRequirement {
                scheme: permission.scheme_name.clone()?,
                scopes: permission.scope_names().map(str::to_owned).collect(),
            })
        })
        .collect()
}

/// `MaxLevels` of a deep write, when bounded.
pub fn deep_levels(max_levels: Option<i64>) -> Option<Constraint> {
    max_levels
        .filter(|levels| *levels >= 0)
        .and_then(|levels| u32::try_from(levels).ok())
        .map(Constraint::MaxDeepLevels)
}

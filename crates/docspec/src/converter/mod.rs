//! Path converters: routing metadata in, path descriptors out
//!
//! Both converters resolve the URL rules bound to the target's endpoint,
//! translate each rule template to OpenAPI syntax and build one operation per
//! documented HTTP method from the target's annotations. Rules sharing a
//! template are folded into a single descriptor.

mod function;
mod resource;

pub use function::FunctionConverter;
pub use resource::ResourceConverter;

use crate::error::{DocsError, Result};
use crate::target::RegisterOptions;
use docspec_core::{App, Method, Rule};
use docspec_openapi::translate::{parameter_for_dialect, path_parameter, responses_for_dialect};
use docspec_openapi::{
    merge_recursive, AnnotationKind, Annotations, Dialect, Operation, PathDescriptor,
};
use serde_json::{json, Value};

/// Shared capability of the two converters
pub trait Converter {
    type Target;

    /// Produce the path descriptors documenting `target`
    fn convert(&self, target: &Self::Target, options: &RegisterOptions)
        -> Result<Vec<PathDescriptor>>;
}

/// Rules bound to the endpoint a registration names
///
/// The endpoint defaults to `default_name` lower-cased. With a blueprint the
/// rules of `<blueprint>.<endpoint>` are used; without one the bare endpoint
/// is tried first, then a unique blueprint-scoped match.
pub(crate) fn resolve_rules(
    app: &App,
    default_name: &str,
    options: &RegisterOptions,
) -> Result<Vec<Rule>> {
    let name = options
        .endpoint
        .clone()
        .unwrap_or_else(|| default_name.to_lowercase());
    let rules = app.url_map();

    if let Some(blueprint) = &options.blueprint {
        let endpoint = format!("{}.{}", blueprint, name);
        let matching: Vec<Rule> = rules
            .into_iter()
            .filter(|rule| rule.endpoint() == endpoint)
            .collect();
        if matching.is_empty() {
            return Err(DocsError::Lookup { endpoint });
        }
        return Ok(matching);
    }

    let exact: Vec<Rule> = rules
        .iter()
        .filter(|rule| rule.endpoint() == name)
        .cloned()
        .collect();
    if !exact.is_empty() {
        return Ok(exact);
    }

    let scoped: Vec<Rule> = rules
        .into_iter()
        .filter(|rule| {
            rule.blueprint()
                .is_some_and(|blueprint| rule.endpoint() == format!("{}.{}", blueprint, name))
        })
        .collect();

    let mut candidates: Vec<String> = scoped.iter().map(|rule| rule.endpoint().to_string()).collect();
    candidates.dedup();
    match candidates.len() {
        0 => Err(DocsError::Lookup { endpoint: name }),
        1 => Ok(scoped),
        _ => Err(DocsError::Ambiguous {
            endpoint: name,
            candidates,
        }),
    }
}

/// Whether `method` is documented; HEAD never is
pub(crate) fn is_documented(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::PUT | Method::POST | Method::DELETE | Method::OPTIONS | Method::PATCH
    )
}

/// Build the operation for one rule from a handler's annotations
///
/// `parent` holds class-level annotations of a resource; the handler's own
/// annotations take precedence.
pub(crate) fn build_operation(
    rule: &Rule,
    annotations: &Annotations,
    parent: Option<&Annotations>,
    dialect: Dialect,
) -> Result<Operation> {
    let mut docs = annotations.merged(AnnotationKind::Docs, parent);
    let overrides = docs
        .as_object_mut()
        .and_then(|docs| docs.remove("params"))
        .unwrap_or(Value::Null);

    let args = annotations.merged(AnnotationKind::Args, parent);
    let mut parameters: Vec<Value> = args
        .get("parameters")
        .and_then(Value::as_object)
        .map(|params| {
            params
                .values()
                .cloned()
                .map(|param| parameter_for_dialect(param, dialect))
                .collect()
        })
        .unwrap_or_default();
    parameters.extend(rule.arguments().map(|argument| {
        path_parameter(
            &argument.name,
            &argument.converter,
            overrides.get(&argument.name),
            dialect,
        )
    }));

    let responses = responses_for_dialect(
        annotations.merged(AnnotationKind::Schemas, parent),
        dialect,
    );

    let operation = merge_recursive(vec![
        json!({ "responses": responses, "parameters": parameters }),
        docs,
    ]);
    serde_json::from_value(operation).map_err(|source| DocsError::Serialization {
        path: rule.openapi_path(),
        source,
    })
}

/// Fold descriptors sharing a template, keeping first-seen order
pub(crate) fn group_paths(descriptors: Vec<PathDescriptor>) -> Vec<PathDescriptor> {
    let mut grouped: Vec<PathDescriptor> = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        match grouped.iter_mut().find(|existing| existing.path == descriptor.path) {
            Some(existing) => existing.absorb(descriptor),
            None => grouped.push(descriptor),
        }
    }
    grouped
}

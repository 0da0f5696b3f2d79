//! Documentation attributes attached to handlers and resources
//!
//! Handlers, resource classes and individual verb methods each carry an
//! [`Annotations`] store with three kinds of entries:
//!
//! - `docs`: free-form operation fields (`tags`, `summary`, `params`, ...)
//! - `args`: request parameters produced by a `utoipa::IntoParams` type
//! - `schemas`: responses keyed by status code
//!
//! The most recently applied annotation is stored first, so when the options
//! are merged (see [`merge_recursive`]) the outermost annotation wins.
//!
//! Named schemas referenced from responses or parameters (`$ref`) travel
//! with the store as components and end up in the document's definitions.
//! `marshal_with::<T>` registers `T` itself; types nested inside it are
//! declared with [`Annotations::component`].
//!
//! # Example
//!
//! ```rust,ignore
//! let annotations = Annotations::new()
//!     .tags(["band"])
//!     .summary("Fetch a band")
//!     .use_kwargs::<BandQuery>()
//!     .marshal_with::<Band>(200)
//!     .component::<Album>();
//! ```

use crate::merge::merge_recursive;
use http::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use utoipa::openapi::path::ParameterIn;

/// Which attribute list an annotation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Docs,
    Args,
    Schemas,
}

/// A group of options plus whether resolution continues past it
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub options: Vec<Value>,
    pub inherit: bool,
}

impl Annotation {
    fn empty() -> Self {
        Self {
            options: Vec::new(),
            inherit: true,
        }
    }

    /// Append `other` unless this annotation stops inheritance
    fn merge(mut self, other: &Annotation) -> Annotation {
        if !self.inherit {
            return self;
        }
        self.options.extend(other.options.iter().cloned());
        Annotation {
            options: self.options,
            inherit: other.inherit,
        }
    }
}

/// Attribute store for one handler, resource or verb method
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    docs: Vec<Annotation>,
    args: Vec<Annotation>,
    schemas: Vec<Annotation>,
    components: BTreeMap<String, Value>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an annotation of the given kind on top of the existing ones
    pub fn annotate(mut self, kind: AnnotationKind, options: Value, inherit: bool) -> Self {
        self.list_mut(kind).insert(
            0,
            Annotation {
                options: vec![options],
                inherit,
            },
        );
        self
    }

    /// Attach free-form operation fields
    pub fn doc(self, options: Value) -> Self {
        self.annotate(AnnotationKind::Docs, options, true)
    }

    /// Attach operation fields and ignore anything inherited from the class
    pub fn doc_no_inherit(self, options: Value) -> Self {
        self.annotate(AnnotationKind::Docs, options, false)
    }

    pub fn tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.doc(json!({ "tags": tags }))
    }

    pub fn summary(self, summary: impl Into<String>) -> Self {
        self.doc(json!({ "summary": summary.into() }))
    }

    pub fn description(self, description: impl Into<String>) -> Self {
        self.doc(json!({ "description": description.into() }))
    }

    pub fn operation_id(self, operation_id: impl Into<String>) -> Self {
        self.doc(json!({ "operationId": operation_id.into() }))
    }

    pub fn deprecated(self) -> Self {
        self.doc(json!({ "deprecated": true }))
    }

    /// Override fields of the generated path parameter `name`
    pub fn path_param(self, name: &str, overrides: Value) -> Self {
        let mut params = Map::new();
        params.insert(name.to_string(), overrides);
        self.doc(json!({ "params": params }))
    }

    /// Document query parameters from an `IntoParams` type
    pub fn use_kwargs<T: utoipa::IntoParams>(self) -> Self {
        self.use_kwargs_in::<T>(ParameterIn::Query)
    }

    /// Document parameters from an `IntoParams` type at a default location
    pub fn use_kwargs_in<T: utoipa::IntoParams>(self, location: ParameterIn) -> Self {
        let mut parameters = Map::new();
        for parameter in T::into_params(|| Some(location.clone())) {
            match serde_json::to_value(&parameter) {
                Ok(value) => {
                    parameters.insert(parameter.name.clone(), value);
                }
                Err(err) => {
                    tracing::warn!(parameter = %parameter.name, error = %err, "Skipped unserializable parameter")
                }
            }
        }
        self.annotate(
            AnnotationKind::Args,
            json!({ "parameters": parameters }),
            true,
        )
    }

    /// Document the response body for `code` with a `ToSchema` type
    pub fn marshal_with<T: for<'a> utoipa::ToSchema<'a>>(self, code: u16) -> Self {
        let description = default_description(code);
        self.marshal_with_description::<T>(code, description)
    }

    pub fn marshal_with_description<T: for<'a> utoipa::ToSchema<'a>>(
        self,
        code: u16,
        description: impl Into<String>,
    ) -> Self {
        let (name, schema) = T::schema();
        match serde_json::to_value(schema) {
            Ok(schema) => self
                .component::<T>()
                .response_with(code, description.into(), Some(schema)),
            Err(err) => {
                tracing::warn!(schema = %name, code, error = %err, "Response schema not serializable");
                self.response_with(code, description.into(), None)
            }
        }
    }

    /// Register the named schema of `T` (and its aliases) as a component
    ///
    /// Use it for types only reachable through a `$ref`, such as the element
    /// type of a list field.
    pub fn component<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = T::schema();
        let aliases = T::aliases()
            .into_iter()
            .map(|(alias, schema)| (alias, utoipa::openapi::RefOr::T(schema)));
        for (name, schema) in std::iter::once((name, schema)).chain(aliases) {
            match serde_json::to_value(schema) {
                Ok(schema) => {
                    self.components.insert(name.to_string(), schema);
                }
                Err(err) => tracing::warn!(schema = %name, error = %err, "Component not serializable"),
            }
        }
        self
    }

    /// Named schemas registered on this store
    pub fn components(&self) -> &BTreeMap<String, Value> {
        &self.components
    }

    /// Document a response without a body schema
    pub fn response(self, code: u16, description: impl Into<String>) -> Self {
        self.response_with(code, description.into(), None)
    }

    fn response_with(self, code: u16, description: String, schema: Option<Value>) -> Self {
        let mut response = Map::new();
        response.insert("description".to_string(), Value::String(description));
        if let Some(schema) = schema {
            response.insert("schema".to_string(), schema);
        }
        let mut responses = Map::new();
        responses.insert(code.to_string(), Value::Object(response));
        self.annotate(AnnotationKind::Schemas, Value::Object(responses), true)
    }

    /// Annotations of one kind, most recent first
    pub fn get(&self, kind: AnnotationKind) -> &[Annotation] {
        match kind {
            AnnotationKind::Docs => &self.docs,
            AnnotationKind::Args => &self.args,
            AnnotationKind::Schemas => &self.schemas,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
            && self.args.is_empty()
            && self.schemas.is_empty()
            && self.components.is_empty()
    }

    /// Collect own annotations followed by the parent's, honouring `inherit`
    pub fn resolve(&self, kind: AnnotationKind, parent: Option<&Annotations>) -> Annotation {
        let parent_annotations = parent.map(|p| p.get(kind)).unwrap_or(&[]);
        self.get(kind)
            .iter()
            .chain(parent_annotations)
            .fold(Annotation::empty(), |acc, next| acc.merge(next))
    }

    /// Resolved options of one kind merged into a single JSON object
    pub fn merged(&self, kind: AnnotationKind, parent: Option<&Annotations>) -> Value {
        merge_recursive(self.resolve(kind, parent).options)
    }

    fn list_mut(&mut self, kind: AnnotationKind) -> &mut Vec<Annotation> {
        match kind {
            AnnotationKind::Docs => &mut self.docs,
            AnnotationKind::Args => &mut self.args,
            AnnotationKind::Schemas => &mut self.schemas,
        }
    }
}

fn default_description(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use utoipa::{IntoParams, ToSchema};

    #[allow(dead_code)]
    #[derive(Deserialize, IntoParams)]
    struct BandQuery {
        /// Filter by genre
        genre: Option<String>,
        limit: i32,
    }

    #[allow(dead_code)]
    #[derive(ToSchema)]
    struct Band {
        name: String,
    }

    #[allow(dead_code)]
    #[derive(ToSchema)]
    struct Album {
        title: String,
    }

    #[allow(dead_code)]
    #[derive(ToSchema)]
    struct Discography {
        albums: Vec<Album>,
    }

    #[test]
    fn outermost_annotation_wins() {
        let annotations = Annotations::new().summary("inner").summary("outer");
        let merged = annotations.merged(AnnotationKind::Docs, None);
        assert_eq!(merged["summary"], "outer");
    }

    #[test]
    fn method_overrides_class_tags() {
        let class = Annotations::new().tags(["class"]).description("from class");
        let method = Annotations::new().tags(["method"]);

        let merged = method.merged(AnnotationKind::Docs, Some(&class));
        assert_eq!(merged["tags"], json!(["method"]));
        assert_eq!(merged["description"], "from class");
    }

    #[test]
    fn no_inherit_stops_at_method() {
        let class = Annotations::new().tags(["class"]).description("from class");
        let method = Annotations::new().doc_no_inherit(json!({"summary": "alone"}));

        let merged = method.merged(AnnotationKind::Docs, Some(&class));
        assert_eq!(merged, json!({"summary": "alone"}));
    }

    #[test]
    fn class_annotations_apply_when_method_has_none() {
        let class = Annotations::new().tags(["band"]);
        let merged = Annotations::new().merged(AnnotationKind::Docs, Some(&class));
        assert_eq!(merged["tags"], json!(["band"]));
    }

    #[test]
    fn use_kwargs_produces_named_parameters() {
        let annotations = Annotations::new().use_kwargs::<BandQuery>();
        let merged = annotations.merged(AnnotationKind::Args, None);

        let params = merged["parameters"].as_object().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["genre"]["in"], "query");
        assert_eq!(params["limit"]["required"], json!(true));
    }

    #[test]
    fn marshal_with_keys_by_status_code() {
        let annotations = Annotations::new()
            .marshal_with::<Band>(200)
            .response(404, "Band not found");
        let merged = annotations.merged(AnnotationKind::Schemas, None);

        assert_eq!(merged["200"]["description"], "OK");
        assert_eq!(merged["200"]["schema"]["type"], "object");
        assert_eq!(merged["404"]["description"], "Band not found");
        assert!(merged["404"].get("schema").is_none());
    }

    #[test]
    fn path_param_overrides_are_nested() {
        let annotations =
            Annotations::new().path_param("band_id", json!({"description": "Band id"}));
        let merged = annotations.merged(AnnotationKind::Docs, None);
        assert_eq!(merged["params"]["band_id"]["description"], "Band id");
    }

    #[test]
    fn marshal_with_registers_named_components() {
        let annotations = Annotations::new()
            .marshal_with::<Discography>(200)
            .component::<Album>();

        let merged = annotations.merged(AnnotationKind::Schemas, None);
        assert_eq!(
            merged["200"]["schema"]["properties"]["albums"]["items"]["$ref"],
            "#/components/schemas/Album"
        );

        let components = annotations.components();
        assert!(components.contains_key("Discography"));
        assert_eq!(components["Album"]["properties"]["title"]["type"], "string");
    }
}

//! OpenAPI specification document
//!
//! [`Document`] accumulates one [`PathItem`] per URL template. Path items are
//! only ever changed through [`Document::add_path`], which overwrites the
//! operation for a given method instead of duplicating it.

use crate::translate::rewrite_refs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A document shared between its coordinator and the routes serving it
pub type SharedDocument = Arc<RwLock<Document>>;

/// The two document layouts the builder can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Swagger 2.0: `swagger` key, `definitions`, parameter types inline
    Swagger2,
    /// OpenAPI 3.x: `openapi` key, `components.schemas`, parameter `schema`
    OpenApi3,
}

impl Dialect {
    /// Pick the dialect matching a version string such as `2.0` or `3.0.3`
    pub fn from_version(version: &str) -> Self {
        if version.trim().starts_with('2') {
            Dialect::Swagger2
        } else {
            Dialect::OpenApi3
        }
    }

    /// JSON pointer prefix for named schema definitions
    pub fn schema_ref_prefix(self) -> &'static str {
        match self {
            Dialect::Swagger2 => "#/definitions/",
            Dialect::OpenApi3 => "#/components/schemas/",
        }
    }
}

/// API information for OpenAPI spec
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiInfo {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI specification document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub info: ApiInfo,
    openapi_version: String,
    paths: BTreeMap<String, PathItem>,
    schemas: BTreeMap<String, Value>,
}

/// All documented operations of one URL template
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

/// Operation (endpoint) in OpenAPI spec
///
/// Fields the builder does not model are kept in `extensions` and
/// serialized next to the known ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Value>,
    #[serde(default)]
    pub responses: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Output of a path converter: one URL template and its operations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathDescriptor {
    /// OpenAPI template, e.g. `/bands/{band_id}/`
    pub path: String,
    /// Operations keyed by lower-case HTTP method
    pub operations: BTreeMap<String, Operation>,
    /// Named schemas the operations reference
    pub schemas: BTreeMap<String, Value>,
}

impl PathDescriptor {
    /// Create a descriptor without operations
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            operations: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    /// Add (or replace) the operation for `method`
    pub fn operation(mut self, method: &str, operation: Operation) -> Self {
        self.operations.insert(method.to_lowercase(), operation);
        self
    }

    /// Carry named schemas referenced by the operations
    pub fn schemas(mut self, schemas: &BTreeMap<String, Value>) -> Self {
        self.schemas
            .extend(schemas.iter().map(|(name, schema)| (name.clone(), schema.clone())));
        self
    }

    /// Fold the operations of `other` into this descriptor
    pub fn absorb(&mut self, other: PathDescriptor) {
        self.operations.extend(other.operations);
        self.schemas.extend(other.schemas);
    }
}

impl Document {
    /// Create a new document for the given schema version (`2.0`, `3.0.3`, ...)
    pub fn new(
        title: impl Into<String>,
        version: impl Into<String>,
        openapi_version: impl Into<String>,
    ) -> Self {
        Self {
            info: ApiInfo {
                title: title.into(),
                version: version.into(),
                description: None,
            },
            openapi_version: openapi_version.into(),
            paths: BTreeMap::new(),
            schemas: BTreeMap::new(),
        }
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.info.description = Some(desc.into());
        self
    }

    /// Wrap the document for sharing with the serving routes
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    /// Schema version string this document was created with
    pub fn openapi_version(&self) -> &str {
        &self.openapi_version
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_version(&self.openapi_version)
    }

    /// Insert a path descriptor.
    ///
    /// Operations already present for the same template and method are
    /// replaced; other methods of the template are left alone.
    /// Named schemas carried by the descriptor are added to the
    /// definitions.
    pub fn add_path(&mut self, descriptor: PathDescriptor) {
        let dialect = self.dialect();
        for (name, mut schema) in descriptor.schemas {
            rewrite_refs(&mut schema, dialect);
            self.schemas.insert(name, schema);
        }

        let item = self.paths.entry(descriptor.path).or_default();
        for (method, operation) in descriptor.operations {
            item.set(&method, operation);
        }
    }

    /// All documented templates
    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    /// Look up one template
    pub fn path(&self, template: &str) -> Option<&PathItem> {
        self.paths.get(template)
    }

    /// Add a schema definition
    pub fn schema(mut self, name: &str, mut schema: Value) -> Self {
        rewrite_refs(&mut schema, self.dialect());
        self.schemas.insert(name.to_string(), schema);
        self
    }

    /// Register a type that implements `utoipa::ToSchema`
    pub fn register<T: for<'a> utoipa::ToSchema<'a>>(mut self) -> Self {
        let (name, schema) = T::schema();
        match serde_json::to_value(schema) {
            Ok(json_schema) => self.schema(name, json_schema),
            Err(err) => {
                tracing::warn!(schema = %name, error = %err, "Schema not serializable");
                self
            }
        }
    }

    /// Named schema definitions
    pub fn schemas(&self) -> &BTreeMap<String, Value> {
        &self.schemas
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        let mut spec = match self.dialect() {
            Dialect::Swagger2 => serde_json::json!({
                "swagger": self.openapi_version,
                "info": self.info,
                "paths": self.paths,
            }),
            Dialect::OpenApi3 => serde_json::json!({
                "openapi": self.openapi_version,
                "info": self.info,
                "paths": self.paths,
            }),
        };

        if !self.schemas.is_empty() {
            match self.dialect() {
                Dialect::Swagger2 => spec["definitions"] = serde_json::json!(self.schemas),
                Dialect::OpenApi3 => {
                    spec["components"] = serde_json::json!({ "schemas": self.schemas })
                }
            }
        }

        spec
    }
}

impl PathItem {
    /// Set the operation for a method; unknown methods (and HEAD) are ignored
    pub fn set(&mut self, method: &str, operation: Operation) -> bool {
        match self.slot_mut(method) {
            Some(slot) => {
                *slot = Some(operation);
                true
            }
            None => false,
        }
    }

    /// Operation documented for `method`, if any
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method.to_lowercase().as_str() {
            "get" => self.get.as_ref(),
            "put" => self.put.as_ref(),
            "post" => self.post.as_ref(),
            "delete" => self.delete.as_ref(),
            "options" => self.options.as_ref(),
            "patch" => self.patch.as_ref(),
            _ => None,
        }
    }

    /// Lower-case names of the documented methods
    pub fn methods(&self) -> Vec<&'static str> {
        ["get", "put", "post", "delete", "options", "patch"]
            .into_iter()
            .filter(|m| self.operation(m).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.methods().is_empty()
    }

    fn slot_mut(&mut self, method: &str) -> Option<&mut Option<Operation>> {
        match method.to_lowercase().as_str() {
            "get" => Some(&mut self.get),
            "put" => Some(&mut self.put),
            "post" => Some(&mut self.post),
            "delete" => Some(&mut self.delete),
            "options" => Some(&mut self.options),
            "patch" => Some(&mut self.patch),
            _ => None,
        }
    }
}

impl Operation {
    /// Create an empty operation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set summary
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add tags
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tagged(tag: &str) -> Operation {
        Operation::new().tags(vec![tag.to_string()])
    }

    #[test]
    fn add_path_overwrites_same_method() {
        let mut doc = Document::new("pets", "v1", "2.0");
        doc.add_path(PathDescriptor::new("/pets/{id}").operation("get", tagged("old")));
        doc.add_path(PathDescriptor::new("/pets/{id}").operation("GET", tagged("new")));

        assert_eq!(doc.paths().len(), 1);
        let item = doc.path("/pets/{id}").unwrap();
        assert_eq!(item.methods(), vec!["get"]);
        assert_eq!(item.get.as_ref().unwrap().tags, Some(vec!["new".to_string()]));
    }

    #[test]
    fn add_path_keeps_other_methods() {
        let mut doc = Document::new("pets", "v1", "2.0");
        doc.add_path(PathDescriptor::new("/pets").operation("get", tagged("a")));
        doc.add_path(PathDescriptor::new("/pets").operation("post", tagged("b")));

        assert_eq!(doc.path("/pets").unwrap().methods(), vec!["get", "post"]);
    }

    #[test]
    fn head_is_not_a_documented_method() {
        let mut item = PathItem::default();
        assert!(!item.set("head", Operation::new()));
        assert!(item.is_empty());
    }

    #[test]
    fn swagger2_layout() {
        let doc = Document::new("pets", "v1", "2.0").schema("Pet", json!({"type": "object"}));
        let value = doc.to_json();

        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["info"]["title"], "pets");
        assert_eq!(value["definitions"]["Pet"]["type"], "object");
        assert!(value.get("openapi").is_none());
    }

    #[test]
    fn openapi3_layout() {
        let doc = Document::new("pets", "v1", "3.0.3").schema("Pet", json!({"type": "object"}));
        let value = doc.to_json();

        assert_eq!(value["openapi"], "3.0.3");
        assert_eq!(value["components"]["schemas"]["Pet"]["type"], "object");
        assert_eq!(doc.dialect().schema_ref_prefix(), "#/components/schemas/");
    }

    #[test]
    fn operation_extensions_are_flattened() {
        let op: Operation = serde_json::from_value(json!({
            "summary": "List",
            "x-internal": true,
            "responses": {"200": {"description": "OK"}}
        }))
        .unwrap();

        assert_eq!(op.summary.as_deref(), Some("List"));
        assert_eq!(op.extensions["x-internal"], json!(true));
        let back = serde_json::to_value(&op).unwrap();
        assert_eq!(back["x-internal"], json!(true));
        assert!(back.get("parameters").is_none());
    }

    #[test]
    fn empty_descriptor_creates_empty_path_item() {
        let mut doc = Document::new("pets", "v1", "2.0");
        doc.add_path(PathDescriptor::new("/empty"));
        assert!(doc.path("/empty").unwrap().is_empty());
        assert_eq!(doc.to_json()["paths"]["/empty"], json!({}));
    }

    #[test]
    fn descriptor_schemas_become_definitions() {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            "Band".to_string(),
            json!({"properties": {"albums": {"items": {"$ref": "#/components/schemas/Album"}}}}),
        );
        schemas.insert("Album".to_string(), json!({"type": "object"}));

        let mut doc = Document::new("bands", "v1", "2.0");
        doc.add_path(PathDescriptor::new("/bands").schemas(&schemas));

        let value = doc.to_json();
        assert_eq!(value["definitions"]["Album"]["type"], "object");
        assert_eq!(
            value["definitions"]["Band"]["properties"]["albums"]["items"]["$ref"],
            "#/definitions/Album"
        );
    }
}

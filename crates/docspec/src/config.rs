//! Extension configuration
//!
//! Either built explicitly with [`DocsConfig`]'s builder methods or read from
//! the application configuration when the extension attaches:
//!
//! | Key | Field | Default |
//! |-----|-------|---------|
//! | `APISPEC_TITLE` | `title` | `docspec` |
//! | `APISPEC_VERSION` | `version` | `v1` |
//! | `APISPEC_OAS_VERSION` | `schema_version` | `2.0` |
//! | `APISPEC_SWAGGER_URL` | `json_url` | `/swagger/` |
//! | `APISPEC_SWAGGER_UI_URL` | `ui_url` | `/swagger-ui/` |
//! | `APISPEC_BLUEPRINT` | `blueprint_name` | `docspec` |
//! | `APISPEC_STATIC_URL_PATH` | `static_url_path` | `/docspec/static` |
//! | `APISPEC_UI_ASSET_URL` | `ui_asset_url` | Swagger UI CDN |
//!
//! A URL set to `null` or `""` disables the corresponding route.

use docspec_core::Config;
use docspec_openapi::{Document, SharedDocument, DEFAULT_ASSET_URL};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_TITLE: &str = "docspec";
pub const DEFAULT_VERSION: &str = "v1";
pub const DEFAULT_SCHEMA_VERSION: &str = "2.0";
pub const DEFAULT_JSON_URL: &str = "/swagger/";
pub const DEFAULT_UI_URL: &str = "/swagger-ui/";
pub const DEFAULT_BLUEPRINT_NAME: &str = "docspec";
pub const DEFAULT_STATIC_URL_PATH: &str = "/docspec/static";

/// Configuration of one documentation instance
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Pre-built document; referenced, not copied
    pub document: Option<SharedDocument>,
    pub title: String,
    pub version: String,
    /// Document schema version (`2.0`, `3.0.3`, ...)
    pub schema_version: String,
    /// URL serving the document as JSON, `None` disables it
    pub json_url: Option<String>,
    /// URL serving the Swagger UI page, `None` disables it
    pub ui_url: Option<String>,
    /// Name of the blueprint holding the documentation routes
    pub blueprint_name: String,
    pub static_url_path: String,
    /// Local Swagger UI assets served under `static_url_path`
    pub static_folder: Option<PathBuf>,
    /// Base URL the UI page loads `swagger-ui.css` and the bundles from
    pub ui_asset_url: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            document: None,
            title: DEFAULT_TITLE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
            json_url: Some(DEFAULT_JSON_URL.to_string()),
            ui_url: Some(DEFAULT_UI_URL.to_string()),
            blueprint_name: DEFAULT_BLUEPRINT_NAME.to_string(),
            static_url_path: DEFAULT_STATIC_URL_PATH.to_string(),
            static_folder: None,
            ui_asset_url: DEFAULT_ASSET_URL.to_string(),
        }
    }
}

impl DocsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `APISPEC_*` keys of an application configuration
    pub fn from_app_config(config: &Config) -> Self {
        let defaults = Self::default();
        Self {
            document: None,
            title: string_or(config, "APISPEC_TITLE", defaults.title),
            version: string_or(config, "APISPEC_VERSION", defaults.version),
            schema_version: string_or(config, "APISPEC_OAS_VERSION", defaults.schema_version),
            json_url: url_or(config, "APISPEC_SWAGGER_URL", defaults.json_url),
            ui_url: url_or(config, "APISPEC_SWAGGER_UI_URL", defaults.ui_url),
            blueprint_name: string_or(config, "APISPEC_BLUEPRINT", defaults.blueprint_name),
            static_url_path: string_or(config, "APISPEC_STATIC_URL_PATH", defaults.static_url_path),
            static_folder: None,
            ui_asset_url: string_or(config, "APISPEC_UI_ASSET_URL", defaults.ui_asset_url),
        }
    }

    /// Use an existing document instead of building one
    pub fn document(mut self, document: SharedDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn schema_version(mut self, schema_version: impl Into<String>) -> Self {
        self.schema_version = schema_version.into();
        self
    }

    /// Serve the JSON document at `url`; an empty string disables it
    pub fn json_url(mut self, url: impl Into<String>) -> Self {
        self.json_url = non_empty(url.into());
        self
    }

    /// Serve the UI page at `url`; an empty string disables it
    pub fn ui_url(mut self, url: impl Into<String>) -> Self {
        self.ui_url = non_empty(url.into());
        self
    }

    pub fn blueprint_name(mut self, name: impl Into<String>) -> Self {
        self.blueprint_name = name.into();
        self
    }

    pub fn static_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.static_folder = Some(folder.into());
        self
    }

    pub fn static_url_path(mut self, path: impl Into<String>) -> Self {
        self.static_url_path = path.into();
        self
    }

    pub fn ui_asset_url(mut self, url: impl Into<String>) -> Self {
        self.ui_asset_url = url.into();
        self
    }

    /// The configured document, or a new one from title and versions
    pub(crate) fn resolve_document(&self) -> SharedDocument {
        match &self.document {
            Some(document) => document.clone(),
            None => Document::new(&self.title, &self.version, &self.schema_version).into_shared(),
        }
    }

    /// Where the UI page loads its assets from
    pub(crate) fn asset_base(&self) -> String {
        match self.static_folder {
            Some(_) => self.static_url_path.trim_end_matches('/').to_string(),
            None => self.ui_asset_url.trim_end_matches('/').to_string(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn string_or(config: &Config, key: &str, default: String) -> String {
    config.get_str(key).map_or(default, str::to_string)
}

fn url_or(config: &Config, key: &str, default: Option<String>) -> Option<String> {
    match config.get(key) {
        None => default,
        Some(Value::String(url)) => non_empty(url.clone()),
        Some(_) => None,
    }
}

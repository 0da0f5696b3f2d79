//! # docspec
//!
//! OpenAPI / Swagger documentation for docspec applications.
//!
//! `docspec` inspects the URL rules of an [`App`] and turns the view
//! functions and resource classes bound to them into path entries of a
//! specification document. The document is served as JSON next to a
//! Swagger UI page.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docspec::prelude::*;
//!
//! #[derive(Serialize, ToSchema)]
//! struct Band {
//!     name: String,
//! }
//!
//! async fn get_band() -> Json<Band> {
//!     Json(Band { name: "Queen".to_string() })
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let app = App::new("bands");
//!     let view = ViewFunction::new("get_band", get_band)
//!         .annotate(|a| a.tags(["band"]).marshal_with::<Band>(200));
//!     app.route("/bands/<int:band_id>/", &[Method::GET], view.clone())?;
//!
//!     let mut docs = ApiDocs::with_app(&app)?;
//!     docs.register(&view)?;
//!
//!     // GET /swagger/ and /swagger-ui/
//!     app.run("127.0.0.1:8080").await
//! }
//! ```
//!
//! ## Configuration
//!
//! [`ApiDocs::new`] reads `APISPEC_*` keys from the application config when it
//! attaches; [`ApiDocs::with_config`] takes a [`DocsConfig`] instead. Give every
//! instance on one application its own `blueprint_name` and URLs.

mod config;
pub mod converter;
mod deferred;
mod error;
mod extension;
mod target;

pub use config::{
    DocsConfig, DEFAULT_BLUEPRINT_NAME, DEFAULT_JSON_URL, DEFAULT_SCHEMA_VERSION,
    DEFAULT_STATIC_URL_PATH, DEFAULT_TITLE, DEFAULT_UI_URL, DEFAULT_VERSION,
};
pub use deferred::{DeferredCall, DeferredQueue};
pub use error::{DocsError, Result};
pub use extension::{ApiDocs, SWAGGER_JSON_ENDPOINT, SWAGGER_UI_ENDPOINT};
pub use target::{IntoTarget, RegisterOptions, Registration, Target};

// Re-export the host application and the document types
pub use docspec_core::{
    App, Blueprint, Method, MethodResource, ResourceArgs, ResourceClass, ResourceError,
    ResourceMethods, View, ViewFunction,
};
pub use docspec_openapi::{Annotations, Dialect, Document, Operation, PathDescriptor, SharedDocument};

/// Prelude module - import everything you need with `use docspec::prelude::*`
pub mod prelude {
    // Extension
    pub use crate::{ApiDocs, DocsConfig, DocsError, RegisterOptions};

    // Host application
    pub use docspec_core::{
        ApiError, App, Blueprint, Html, IntoResponse, Json, Method, MethodResource, Request,
        ResourceArgs, ResourceClass, ResourceError, ResourceMethods, Response, StatusCode,
        ViewFunction,
    };

    // Documentation attributes and schemas
    pub use docspec_openapi::{Annotations, Document, IntoParams, ToSchema};

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> crate::Result<()> = || Ok(());
        let _ = RegisterOptions::new().endpoint("band");
    }
}

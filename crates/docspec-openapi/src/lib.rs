//! OpenAPI documentation building blocks for docspec
//!
//! This crate holds the pieces of the documentation pipeline that do not
//! depend on the host application:
//!
//! - [`Document`]: the accumulating Swagger 2.0 / OpenAPI 3 document
//! - [`Annotations`]: documentation attributes attached to handlers
//! - [`merge_recursive`]: the deep merge used to resolve annotations
//! - [`translate`]: dialect-specific shaping of parameters and responses
//! - Swagger UI page rendering and the JSON / HTML responses serving them
//!
//! Schemas and parameters come from `utoipa`; derive `ToSchema` and
//! `IntoParams` on your types and reference them from annotations.

mod annotations;
mod merge;
mod spec;
mod swagger;
pub mod translate;

pub use annotations::{Annotation, AnnotationKind, Annotations};
pub use merge::merge_recursive;
pub use spec::{ApiInfo, Dialect, Document, Operation, PathDescriptor, PathItem, SharedDocument};
pub use swagger::{generate_swagger_html, DEFAULT_ASSET_URL};

// Re-export utoipa's derive macros under their usual names
pub use utoipa::{IntoParams, ToSchema};
pub use utoipa::openapi::path::ParameterIn;

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::Full;

/// Generate OpenAPI JSON response
pub fn openapi_json(spec: &Document) -> Response<Full<Bytes>> {
    match serde_json::to_string_pretty(&spec.to_json()) {
        Ok(json) => with_content_type(StatusCode::OK, "application/json", json),
        Err(_) => with_content_type(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            "Failed to serialize OpenAPI spec".to_string(),
        ),
    }
}

/// Generate Swagger UI HTML response
pub fn swagger_ui_html(openapi_url: &str, asset_url: &str, title: &str) -> Response<Full<Bytes>> {
    let html = swagger::generate_swagger_html(openapi_url, asset_url, title);
    with_content_type(StatusCode::OK, "text/html; charset=utf-8", html)
}

fn with_content_type(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

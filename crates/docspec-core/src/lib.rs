//! # docspec-core
//!
//! The host application that documentation is generated for: URL rules with
//! typed converters, an endpoint to view registry, blueprints, static files
//! and a hyper-based server.
//!
//! This crate is not meant to be used directly. Use `docspec` instead.

mod app;
mod blueprint;
mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod rule;
mod server;
pub mod static_files;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;
mod view;

// Public API
pub use app::App;
pub use blueprint::Blueprint;
pub use config::Config;
pub use error::{ApiError, ResourceError, Result, RouteError};
pub use handler::{BoxFuture, BoxedHandler, Handler};
pub use request::Request;
pub use response::{Html, IntoResponse, Json, Response};
pub use router::UrlMap;
pub use rule::{Rule, RuleArgument, CONVERTERS};
pub use static_files::StaticFileConfig;
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
pub use view::{
    MethodResource, RawHandler, ResourceArgs, ResourceClass, ResourceInstance, ResourceMethod,
    ResourceMethods, ResourceView, View, ViewFunction,
};

pub use http::{Method, StatusCode};

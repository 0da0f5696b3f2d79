//! Application: URL map, view registry, configuration and dispatch

use crate::blueprint::Blueprint;
use crate::config::Config;
use crate::error::{ApiError, RouteError};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::{RouteMatch, UrlMap};
use crate::rule::Rule;
use crate::server::Server;
use crate::static_files::StaticFileConfig;
use crate::view::{View, ViewFunction};
use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Host application
///
/// A cheap-to-clone handle: clones share the same URL map, views and
/// configuration, so extensions can keep one and register rules later.
///
/// # Example
///
/// ```rust,ignore
/// use docspec::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///     let app = App::new("bands");
///     app.route("/", &[Method::GET], ViewFunction::new("index", index))?;
///     app.run("127.0.0.1:8080").await
/// }
/// ```
#[derive(Clone)]
pub struct App {
    inner: Arc<RwLock<AppState>>,
}

#[derive(Clone)]
struct AppState {
    name: String,
    config: Config,
    url_map: UrlMap,
    views: BTreeMap<String, View>,
    blueprints: BTreeSet<String>,
}

impl App {
    /// Create a new application
    pub fn new(name: impl Into<String>) -> Self {
        // Initialize tracing if not already done
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,docspec=debug")),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        Self {
            inner: Arc::new(RwLock::new(AppState {
                name: name.into(),
                config: Config::new(),
                url_map: UrlMap::new(),
                views: BTreeMap::new(),
                blueprints: BTreeSet::new(),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Set a configuration value
    pub fn configure(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.write().config.set(key, value);
        self
    }

    /// Snapshot of the configuration
    pub fn config(&self) -> Config {
        self.read().config.clone()
    }

    /// Bind `rule` to `view` under `endpoint`
    ///
    /// The endpoint defaults to the view name (lower-cased for resource
    /// classes). Methods default to the verbs of a resource view, or `GET`
    /// for everything else.
    pub fn add_url_rule(
        &self,
        rule: &str,
        endpoint: Option<&str>,
        view: impl Into<View>,
        methods: Option<&[Method]>,
    ) -> Result<(), RouteError> {
        let view = view.into();
        let endpoint = endpoint.map_or_else(|| view.default_endpoint(), str::to_string);
        let methods = match methods {
            Some(methods) => methods.to_vec(),
            None => default_methods(&view)?,
        };
        self.write().add_rule(rule, endpoint, view, methods, None)
    }

    /// Bind a view function under its own name
    pub fn route(&self, rule: &str, methods: &[Method], view: ViewFunction) -> Result<(), RouteError> {
        self.add_url_rule(rule, None, view, Some(methods))
    }

    /// Register every rule recorded on `blueprint`
    ///
    /// Either every rule is added and the name is reserved, or on error the
    /// application is left as it was.
    pub fn register_blueprint(&self, blueprint: Blueprint) -> Result<(), RouteError> {
        let name = blueprint.name().to_string();
        let mut state = self.write();
        if name.is_empty() || name.contains('.') || state.blueprints.contains(&name) {
            return Err(RouteError::BlueprintNameTaken(name));
        }

        let mut staged = state.clone();
        staged.blueprints.insert(name.clone());

        if let Some(config) = blueprint.static_view() {
            let rule = config.rule();
            staged.add_rule(
                &rule,
                blueprint.full_endpoint("static"),
                View::Static(config),
                vec![Method::GET],
                Some(name.clone()),
            )?;
        }

        let prefixed: Vec<_> = blueprint
            .clone()
            .into_rules()
            .into_iter()
            .map(|rule| {
                let endpoint = rule.endpoint.unwrap_or_else(|| rule.view.default_endpoint());
                (
                    blueprint.full_rule(&rule.rule),
                    blueprint.full_endpoint(&endpoint),
                    rule.view,
                    rule.methods,
                )
            })
            .collect();

        for (rule, endpoint, view, methods) in prefixed {
            let methods = match methods {
                Some(methods) => methods,
                None => default_methods(&view)?,
            };
            staged.add_rule(&rule, endpoint, view, methods, Some(name.clone()))?;
        }

        *state = staged;
        tracing::debug!(blueprint = %name, "Registered blueprint");
        Ok(())
    }

    /// Serve files below `root` at `prefix` under the `static` endpoint
    pub fn serve_static(&self, prefix: &str, root: impl Into<PathBuf>) -> Result<(), RouteError> {
        let config = StaticFileConfig::new(root, prefix);
        let rule = config.rule();
        self.write()
            .add_rule(&rule, "static".to_string(), View::Static(config), vec![Method::GET], None)
    }

    /// Snapshot of all rules in registration order
    pub fn url_map(&self) -> Vec<Rule> {
        self.read().url_map.rules().to_vec()
    }

    /// Rules bound to `endpoint`
    pub fn rules_for_endpoint(&self, endpoint: &str) -> Vec<Rule> {
        self.read()
            .url_map
            .rules_for_endpoint(endpoint)
            .cloned()
            .collect()
    }

    /// Snapshot of the endpoint to view mapping
    pub fn view_functions(&self) -> Vec<(String, View)> {
        self.read()
            .views
            .iter()
            .map(|(endpoint, view)| (endpoint.clone(), view.clone()))
            .collect()
    }

    pub fn view_function(&self, endpoint: &str) -> Option<View> {
        self.read().views.get(endpoint).cloned()
    }

    pub fn has_blueprint(&self, name: &str) -> bool {
        self.read().blueprints.contains(name)
    }

    /// Route a request to its view
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> Response {
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let path = parts.uri.path().to_string();

        let resolved = {
            let state = self.read();
            let matched = state.url_map.match_route(&path, &method);
            match matched {
                RouteMatch::Found { rule, args } => match state.views.get(rule.endpoint()) {
                    Some(view) => Ok((rule.endpoint().to_string(), view.clone(), args)),
                    None => Err(ApiError::internal(format!(
                        "No view registered for endpoint {}",
                        rule.endpoint()
                    ))
                    .into_response()),
                },
                RouteMatch::NotFound => Err(ApiError::not_found(format!(
                    "No route found for {} {}",
                    method, path
                ))
                .into_response()),
                RouteMatch::MethodNotAllowed { allowed } => {
                    let allowed_str: Vec<&str> = allowed.iter().map(|m| m.as_str()).collect();
                    let mut response = ApiError::new(
                        StatusCode::METHOD_NOT_ALLOWED,
                        "method_not_allowed",
                        format!("Method {} not allowed for {}", method, path),
                    )
                    .into_response();
                    if let Ok(value) = HeaderValue::from_str(&allowed_str.join(", ")) {
                        response.headers_mut().insert(header::ALLOW, value);
                    }
                    Err(response)
                }
            }
        };

        match resolved {
            Ok((endpoint, view, args)) => view.call(Request::new(parts, body, endpoint, args)).await,
            Err(response) => response,
        }
    }

    /// Run the server
    pub async fn run(&self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Server::new(self.clone()).run(addr).await
    }

    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read();
        f.debug_struct("App")
            .field("name", &state.name)
            .field("rules", &state.url_map.len())
            .field("blueprints", &state.blueprints)
            .finish()
    }
}

impl AppState {
    fn add_rule(
        &mut self,
        rule: &str,
        endpoint: String,
        view: View,
        methods: Vec<Method>,
        blueprint: Option<String>,
    ) -> Result<(), RouteError> {
        if let Some(existing) = self.views.get(&endpoint) {
            if !existing.same_as(&view) {
                return Err(RouteError::EndpointOverwrite(endpoint));
            }
        }
        let rule = Rule::new(rule, endpoint.clone(), methods, blueprint)?;
        self.url_map.add(rule)?;
        self.views.insert(endpoint, view);
        Ok(())
    }
}

fn default_methods(view: &View) -> Result<Vec<Method>, RouteError> {
    let View::Resource(resource) = view else {
        return Ok(vec![Method::GET]);
    };
    let instance = resource
        .class()
        .instantiate(resource.args())
        .map_err(|source| RouteError::Resource {
            name: resource.class().name().to_string(),
            source,
        })?;
    let verbs = instance.methods().verbs();
    Ok(if verbs.is_empty() { vec![Method::GET] } else { verbs })
}

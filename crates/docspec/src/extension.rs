//! The documentation extension
//!
//! [`ApiDocs`] is bound to one [`App`]. It owns a specification document,
//! serves it (and a Swagger UI page) from its own blueprint and turns
//! registered view functions and resource classes into path entries.
//!
//! Registrations made before [`ApiDocs::init_app`] are queued and replayed in
//! order on attachment, so the resulting document is the same whichever
//! order the calls happen in.
//!
//! # Example
//!
//! ```rust,ignore
//! use docspec::prelude::*;
//!
//! let app = App::new("bands");
//! let get_band = ViewFunction::new("get_band", get_band).annotate(|a| a.tags(["band"]));
//! app.route("/bands/<int:band_id>/", &[Method::GET], get_band.clone())?;
//!
//! let mut docs = ApiDocs::with_config(DocsConfig::new().title("bands"));
//! docs.register(&get_band)?;
//! docs.init_app(&app)?;
//! ```

use crate::config::DocsConfig;
use crate::converter::{Converter, FunctionConverter, ResourceConverter};
use crate::deferred::{DeferredCall, DeferredQueue};
use crate::error::{DocsError, Result};
use crate::target::{IntoTarget, RegisterOptions, Registration, Target};
use docspec_core::{App, Blueprint, Method, Response, View};
use docspec_openapi::{openapi_json, swagger_ui_html, SharedDocument};
use std::sync::PoisonError;

/// Endpoint of the JSON document route, inside the extension's blueprint
pub const SWAGGER_JSON_ENDPOINT: &str = "swagger-json";
/// Endpoint of the Swagger UI route, inside the extension's blueprint
pub const SWAGGER_UI_ENDPOINT: &str = "swagger-ui";

/// Registration coordinator for one documentation surface
///
/// Several instances can document the same application as long as each uses
/// its own blueprint name and URLs.
pub struct ApiDocs {
    /// `None` until attached when the configuration comes from the app
    config: Option<DocsConfig>,
    document: Option<SharedDocument>,
    queue: DeferredQueue,
    attachment: Option<Attachment>,
}

struct Attachment {
    app: App,
    functions: FunctionConverter,
    resources: ResourceConverter,
}

impl Attachment {
    fn execute(&self, document: &SharedDocument, registration: Registration) -> Result<()> {
        let Registration { target, options } = registration;
        let descriptors = match &target {
            Target::Function(view) => self.functions.convert(view, &options)?,
            Target::Resource(class) => self.resources.convert(class, &options)?,
        };

        let mut document = document.write().unwrap_or_else(PoisonError::into_inner);
        for descriptor in descriptors {
            tracing::debug!(
                target_name = %target.name(),
                path = %descriptor.path,
                methods = descriptor.operations.len(),
                "Documented path"
            );
            document.add_path(descriptor);
        }
        Ok(())
    }
}

impl Default for ApiDocs {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiDocs {
    /// Create an unattached instance configured from the application's
    /// `APISPEC_*` keys when it attaches
    pub fn new() -> Self {
        Self {
            config: None,
            document: None,
            queue: DeferredQueue::new(),
            attachment: None,
        }
    }

    /// Create an unattached instance with an explicit configuration
    ///
    /// The document exists right away, so [`ApiDocs::document`] can be
    /// handed out before attachment.
    pub fn with_config(config: DocsConfig) -> Self {
        let document = config.resolve_document();
        Self {
            config: Some(config),
            document: Some(document),
            queue: DeferredQueue::new(),
            attachment: None,
        }
    }

    /// Create an instance attached to `app`, configured from its config keys
    pub fn with_app(app: &App) -> Result<Self> {
        let mut docs = Self::new();
        docs.init_app(app)?;
        Ok(docs)
    }

    /// Bind to `app`
    ///
    /// Registers the documentation blueprint (JSON document, UI page and the
    /// optional static folder) and then replays queued registrations in
    /// order. A failing registration stops the replay: its error is
    /// returned, and the registrations behind it stay queued (see
    /// [`ApiDocs::pending_registrations`] and [`ApiDocs::replay_deferred`]).
    pub fn init_app(&mut self, app: &App) -> Result<()> {
        if let Some(attachment) = &self.attachment {
            return Err(DocsError::AlreadyAttached(attachment.app.name()));
        }

        let config = self
            .config
            .clone()
            .unwrap_or_else(|| DocsConfig::from_app_config(&app.config()));
        let document = self
            .document
            .clone()
            .unwrap_or_else(|| config.resolve_document());
        let dialect = document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .dialect();

        app.register_blueprint(docs_blueprint(&config, &document))?;

        tracing::info!(
            app = %app.name(),
            blueprint = %config.blueprint_name,
            json_url = ?config.json_url,
            ui_url = ?config.ui_url,
            "Attached documentation"
        );

        self.config = Some(config);
        self.document = Some(document);
        self.attachment = Some(Attachment {
            app: app.clone(),
            functions: FunctionConverter::new(app.clone(), dialect),
            resources: ResourceConverter::new(app.clone(), dialect),
        });

        self.replay_deferred().map(|_| ())
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// The specification document, once it exists
    pub fn document(&self) -> Option<SharedDocument> {
        self.document.clone()
    }

    /// Configuration in effect, once known
    pub fn config(&self) -> Option<&DocsConfig> {
        self.config.as_ref()
    }

    /// Document a view function or resource class under its default endpoint
    pub fn register<T: IntoTarget>(&mut self, target: T) -> Result<()> {
        self.register_with(target, RegisterOptions::new())
    }

    /// Document a view function or resource class
    ///
    /// Runs immediately when attached, otherwise the call is queued. Targets
    /// that are neither kind are rejected right away.
    pub fn register_with<T: IntoTarget>(&mut self, target: T, options: RegisterOptions) -> Result<()> {
        let registration = Registration {
            target: target.into_target()?,
            options,
        };

        match (&self.attachment, &self.document) {
            (Some(attachment), Some(document)) => attachment.execute(document, registration),
            _ => {
                tracing::debug!(
                    target_name = %registration.target.name(),
                    queued = self.queue.len() + 1,
                    "Deferred registration until attachment"
                );
                self.queue.push(DeferredCall::Register(registration));
                Ok(())
            }
        }
    }

    /// Document every view already routed on the attached application
    ///
    /// Views that cannot be documented (static folders, the documentation
    /// routes themselves) are skipped; any other failure is returned.
    /// Returns the number of endpoints documented.
    pub fn register_existing_resources(&mut self) -> Result<usize> {
        let app = match &self.attachment {
            Some(attachment) => attachment.app.clone(),
            None => return Err(DocsError::NotAttached),
        };

        let mut documented = 0;
        for (endpoint, view) in app.view_functions() {
            let resource_args = match &view {
                View::Resource(view) => Some(view.args().clone()),
                _ => None,
            };
            let target = match view.into_target() {
                Ok(target) => target,
                Err(err) if err.is_usage() => {
                    tracing::debug!(endpoint = %endpoint, reason = %err, "Skipped endpoint");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let mut options = match endpoint.split_once('.') {
                Some((blueprint, name)) => RegisterOptions::new().blueprint(blueprint).endpoint(name),
                None => RegisterOptions::new().endpoint(endpoint.as_str()),
            };
            if let Some(args) = resource_args {
                options = options.resource_args(args);
            }

            self.register_with(target, options)?;
            documented += 1;
        }

        tracing::info!(documented, "Registered existing endpoints");
        Ok(documented)
    }

    /// Number of queued registrations not yet replayed
    pub fn pending_registrations(&self) -> usize {
        self.queue.len()
    }

    /// Resume replaying queued registrations after a failure
    ///
    /// Returns the number replayed successfully. Does nothing before
    /// attachment.
    pub fn replay_deferred(&mut self) -> Result<usize> {
        let (Some(attachment), Some(document)) = (&self.attachment, &self.document) else {
            return Ok(0);
        };
        if self.queue.is_empty() {
            return Ok(0);
        }

        let pending = self.queue.len();
        let result = self.queue.drain(|call| match call {
            DeferredCall::Register(registration) => attachment.execute(document, registration),
        });
        match &result {
            Ok(replayed) => tracing::debug!(replayed, "Replayed deferred registrations"),
            Err(err) => tracing::warn!(
                pending,
                remaining = self.queue.len(),
                error = %err,
                "Deferred registration failed"
            ),
        }
        result
    }
}

/// Blueprint holding the routes serving `document`
fn docs_blueprint(config: &DocsConfig, document: &SharedDocument) -> Blueprint {
    let mut blueprint = Blueprint::new(config.blueprint_name.as_str());
    if let Some(folder) = &config.static_folder {
        blueprint = blueprint.static_folder(folder.clone(), config.static_url_path.as_str());
    }

    if let Some(json_url) = &config.json_url {
        let document = document.clone();
        let view = View::handler(SWAGGER_JSON_ENDPOINT, move || {
            let response = render_json(&document);
            async move { response }
        });
        blueprint.add_url_rule(json_url, Some(SWAGGER_JSON_ENDPOINT), view, Some(&[Method::GET]));
    }

    match (&config.ui_url, &config.json_url) {
        (Some(ui_url), Some(json_url)) => {
            let document = document.clone();
            let json_url = json_url.clone();
            let asset_base = config.asset_base();
            let view = View::handler(SWAGGER_UI_ENDPOINT, move || {
                let response = render_ui(&document, &json_url, &asset_base);
                async move { response }
            });
            blueprint.add_url_rule(ui_url, Some(SWAGGER_UI_ENDPOINT), view, Some(&[Method::GET]));
        }
        (Some(ui_url), None) => {
            tracing::warn!(ui_url = %ui_url, "Swagger UI disabled: no JSON document URL configured");
        }
        (None, _) => {}
    }

    blueprint
}

fn render_json(document: &SharedDocument) -> Response {
    let document = document.read().unwrap_or_else(PoisonError::into_inner);
    openapi_json(&document)
}

fn render_ui(document: &SharedDocument, json_url: &str, asset_base: &str) -> Response {
    let title = document
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .info
        .title
        .clone();
    swagger_ui_html(json_url, asset_base, &title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docspec_core::{TestClient, ViewFunction};

    fn band_view() -> ViewFunction {
        ViewFunction::new("band", || async { "band" }).annotate(|a| a.tags(["band"]))
    }

    #[test]
    fn registers_immediately_when_attached() {
        let app = App::new("test");
        let view = band_view();
        app.route("/bands/<int:band_id>/", &[Method::GET], view.clone())
            .unwrap();

        let mut docs = ApiDocs::with_app(&app).unwrap();
        docs.register(&view).unwrap();

        assert_eq!(docs.pending_registrations(), 0);
        let document = docs.document().unwrap();
        let document = document.read().unwrap();
        assert!(document.path("/bands/{band_id}/").is_some());
    }

    #[test]
    fn queues_until_attached() {
        let app = App::new("test");
        let view = band_view();
        app.route("/band", &[Method::GET], view.clone()).unwrap();

        let mut docs = ApiDocs::with_config(DocsConfig::new());
        docs.register(view).unwrap();
        assert_eq!(docs.pending_registrations(), 1);
        assert!(docs.document().unwrap().read().unwrap().paths().is_empty());

        docs.init_app(&app).unwrap();
        assert_eq!(docs.pending_registrations(), 0);
        assert!(docs.document().unwrap().read().unwrap().path("/band").is_some());
    }

    #[test]
    fn attaching_twice_is_rejected() {
        let app = App::new("twice");
        let mut docs = ApiDocs::with_app(&app).unwrap();
        let err = docs.init_app(&app).unwrap_err();
        assert!(matches!(err, DocsError::AlreadyAttached(name) if name == "twice"));
    }

    #[test]
    fn bulk_scan_requires_attachment() {
        let mut docs = ApiDocs::new();
        assert!(matches!(
            docs.register_existing_resources(),
            Err(DocsError::NotAttached)
        ));
    }

    #[test]
    fn replay_before_attachment_is_a_no_op() {
        let mut docs = ApiDocs::new();
        docs.register(band_view()).unwrap();
        assert_eq!(docs.replay_deferred().unwrap(), 0);
        assert_eq!(docs.pending_registrations(), 1);
    }

    #[tokio::test]
    async fn serves_document_and_ui() {
        let app = App::new("test");
        let mut docs = ApiDocs::with_config(DocsConfig::new().title("Bands API"));
        docs.init_app(&app).unwrap();

        let client = TestClient::new(&app);
        let json = client.get("/swagger/").await;
        json.assert_status(200);
        let body: serde_json::Value = json.json().unwrap();
        assert_eq!(body["info"]["title"], "Bands API");
        assert_eq!(body["swagger"], "2.0");

        let ui = client.get("/swagger-ui/").await;
        ui.assert_status(200)
            .assert_header("content-type", "text/html; charset=utf-8")
            .assert_body_contains("/swagger/");
    }
}

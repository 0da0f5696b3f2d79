//! Blueprints: named groups of rules registered on an application together
//!
//! Rules added to a blueprint are recorded and only enter the URL map when
//! the blueprint is registered. Their endpoints are prefixed with the
//! blueprint name (`api.get_band`) and their rules with the URL prefix.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut api = Blueprint::new("api").url_prefix("/api");
//! api.route("/bands/<int:band_id>", &[Method::GET], ViewFunction::new("get_band", get_band));
//! app.register_blueprint(api)?;
//! ```

use crate::static_files::StaticFileConfig;
use crate::view::{View, ViewFunction};
use http::Method;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub(crate) struct BlueprintRule {
    pub rule: String,
    pub endpoint: Option<String>,
    pub view: View,
    pub methods: Option<Vec<Method>>,
}

/// A named group of rules
#[derive(Debug, Clone)]
pub struct Blueprint {
    name: String,
    url_prefix: String,
    static_folder: Option<PathBuf>,
    static_url_path: Option<String>,
    rules: Vec<BlueprintRule>,
}

impl Blueprint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_prefix: String::new(),
            static_folder: None,
            static_url_path: None,
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prefix prepended to every rule
    pub fn url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Serve `folder` under `url_path` as the `<name>.static` endpoint
    pub fn static_folder(mut self, folder: impl Into<PathBuf>, url_path: impl Into<String>) -> Self {
        self.static_folder = Some(folder.into());
        self.static_url_path = Some(url_path.into());
        self
    }

    /// Record a rule; it is added to the URL map on registration
    pub fn add_url_rule(
        &mut self,
        rule: &str,
        endpoint: Option<&str>,
        view: impl Into<View>,
        methods: Option<&[Method]>,
    ) -> &mut Self {
        self.rules.push(BlueprintRule {
            rule: rule.to_string(),
            endpoint: endpoint.map(str::to_string),
            view: view.into(),
            methods: methods.map(<[Method]>::to_vec),
        });
        self
    }

    /// Record a view function under its own name
    pub fn route(&mut self, rule: &str, methods: &[Method], view: ViewFunction) -> &mut Self {
        self.add_url_rule(rule, None, view, Some(methods))
    }

    pub(crate) fn full_rule(&self, rule: &str) -> String {
        format!("{}{}", self.url_prefix, rule)
    }

    pub(crate) fn full_endpoint(&self, endpoint: &str) -> String {
        format!("{}.{}", self.name, endpoint)
    }

    /// Static directory view, if configured
    pub(crate) fn static_view(&self) -> Option<StaticFileConfig> {
        let folder = self.static_folder.as_ref()?;
        let url_path = self.static_url_path.as_deref().unwrap_or("/static");
        Some(StaticFileConfig::new(folder.clone(), self.full_rule(url_path)))
    }

    pub(crate) fn into_rules(self) -> Vec<BlueprintRule> {
        self.rules
    }
}

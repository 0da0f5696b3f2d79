use super::{build_operation, group_paths, is_documented, resolve_rules, Converter};
use crate::error::Result;
use crate::target::RegisterOptions;
use docspec_core::{App, ViewFunction};
use docspec_openapi::{Dialect, PathDescriptor};

/// Documents a plain view function
///
/// Every method a bound rule accepts gets the same operation, built from the
/// function's own annotations.
#[derive(Clone)]
pub struct FunctionConverter {
    app: App,
    dialect: Dialect,
}

impl FunctionConverter {
    pub fn new(app: App, dialect: Dialect) -> Self {
        Self { app, dialect }
    }
}

impl Converter for FunctionConverter {
    type Target = ViewFunction;

    fn convert(&self, target: &ViewFunction, options: &RegisterOptions) -> Result<Vec<PathDescriptor>> {
        let rules = resolve_rules(&self.app, target.name(), options)?;

        let mut descriptors = Vec::with_capacity(rules.len());
        for rule in &rules {
            let mut descriptor =
                PathDescriptor::new(rule.openapi_path()).schemas(target.annotations().components());
            for method in rule.methods().iter().filter(|method| is_documented(method)) {
                let operation = build_operation(rule, target.annotations(), None, self.dialect)?;
                descriptor = descriptor.operation(method.as_str(), operation);
            }
            descriptors.push(descriptor);
        }

        tracing::debug!(
            view = %target.name(),
            paths = descriptors.len(),
            "Converted view function"
        );
        Ok(group_paths(descriptors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docspec_core::Method;
    use serde_json::json;

    async fn get_band() -> &'static str {
        "band"
    }

    #[test]
    fn one_operation_per_method() {
        let app = App::new("test");
        let view = ViewFunction::new("band", get_band)
            .annotate(|a| a.tags(["band"]).response(200, "The band"));
        app.route("/bands/<int:band_id>/", &[Method::GET, Method::POST], view.clone())
            .unwrap();

        let converter = FunctionConverter::new(app, Dialect::Swagger2);
        let paths = converter.convert(&view, &RegisterOptions::new()).unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, "/bands/{band_id}/");
        assert_eq!(
            paths[0].operations.keys().collect::<Vec<_>>(),
            vec!["get", "post"]
        );
        let get = &paths[0].operations["get"];
        assert_eq!(get.tags, Some(vec!["band".to_string()]));
        assert_eq!(get.parameters[0]["type"], json!("integer"));
        assert_eq!(get.responses["200"], json!({"description": "The band"}));
    }

    #[test]
    fn several_rules_for_one_endpoint() {
        let app = App::new("test");
        let view = ViewFunction::new("bands", get_band);
        app.route("/bands", &[Method::GET], view.clone()).unwrap();
        app.route("/bands/<genre>", &[Method::GET], view.clone()).unwrap();

        let converter = FunctionConverter::new(app, Dialect::OpenApi3);
        let paths = converter.convert(&view, &RegisterOptions::new()).unwrap();

        let templates: Vec<_> = paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(templates, vec!["/bands", "/bands/{genre}"]);
        assert_eq!(
            paths[1].operations["get"].parameters[0]["schema"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn explicit_endpoint_is_used() {
        let app = App::new("test");
        let view = ViewFunction::new("get_band", get_band);
        app.add_url_rule("/band", Some("band_detail"), view.clone(), None)
            .unwrap();

        let converter = FunctionConverter::new(app, Dialect::Swagger2);
        assert!(converter.convert(&view, &RegisterOptions::new()).is_err());

        let paths = converter
            .convert(&view, &RegisterOptions::new().endpoint("band_detail"))
            .unwrap();
        assert_eq!(paths[0].path, "/band");
        assert!(paths[0].operations.contains_key("get"));
    }
}

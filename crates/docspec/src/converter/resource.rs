use super::{build_operation, group_paths, is_documented, resolve_rules, Converter};
use crate::error::{DocsError, Result};
use crate::target::RegisterOptions;
use docspec_core::{App, ResourceClass};
use docspec_openapi::{Dialect, PathDescriptor};

/// Documents a resource class
///
/// The class is instantiated with the registration's constructor arguments
/// so its verb methods and annotations can be inspected. Only methods that
/// are both routed by a rule and implemented by the instance are documented;
/// class-level annotations are inherited by each verb method.
#[derive(Clone)]
pub struct ResourceConverter {
    app: App,
    dialect: Dialect,
}

impl ResourceConverter {
    pub fn new(app: App, dialect: Dialect) -> Self {
        Self { app, dialect }
    }
}

impl Converter for ResourceConverter {
    type Target = ResourceClass;

    fn convert(&self, target: &ResourceClass, options: &RegisterOptions) -> Result<Vec<PathDescriptor>> {
        let rules = resolve_rules(&self.app, target.name(), options)?;
        let instance = target
            .instantiate(&options.resource_args)
            .map_err(|source| DocsError::Construct {
                name: target.name().to_string(),
                source,
            })?;

        let mut descriptors = Vec::with_capacity(rules.len());
        for rule in &rules {
            let mut descriptor = PathDescriptor::new(rule.openapi_path());
            for method in rule.methods().iter().filter(|method| is_documented(method)) {
                let Some(verb) = instance.methods().method(method) else {
                    continue;
                };
                let operation = build_operation(
                    rule,
                    verb.annotations(),
                    Some(instance.annotations()),
                    self.dialect,
                )?;
                descriptor = descriptor
                    .operation(method.as_str(), operation)
                    .schemas(instance.annotations().components())
                    .schemas(verb.annotations().components());
            }
            descriptors.push(descriptor);
        }

        tracing::debug!(
            resource = %target.name(),
            paths = descriptors.len(),
            "Converted resource class"
        );
        Ok(group_paths(descriptors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docspec_core::{
        Method, MethodResource, ResourceArgs, ResourceError, ResourceMethods,
    };
    use docspec_openapi::Annotations;
    use serde_json::json;
    use std::sync::Arc;

    struct BandResource {
        label: String,
    }

    impl MethodResource for BandResource {
        fn construct(args: &ResourceArgs) -> Result<Self, ResourceError> {
            Ok(Self {
                label: args.get(0, "label")?,
            })
        }

        fn annotations(&self) -> Annotations {
            Annotations::new().tags([self.label.as_str()]).description("A band")
        }

        fn methods(self: Arc<Self>) -> ResourceMethods {
            ResourceMethods::new()
                .get(|| async { "band" }, Annotations::new().summary("Fetch"))
                .delete(
                    || async { "" },
                    Annotations::new().tags(["admin"]).response(204, "Deleted"),
                )
        }
    }

    fn app_with_band() -> (App, ResourceClass) {
        let app = App::new("test");
        let class = ResourceClass::of::<BandResource>();
        let view = class.as_view(ResourceArgs::new().arg("bands"));
        app.add_url_rule(
            "/bands/<int:band_id>/",
            None,
            view,
            Some(&[Method::GET, Method::PUT, Method::DELETE]),
        )
        .unwrap();
        (app, class)
    }

    #[test]
    fn documents_implemented_methods_only() {
        let (app, class) = app_with_band();
        let converter = ResourceConverter::new(app, Dialect::Swagger2);
        let paths = converter
            .convert(&class, &RegisterOptions::new().arg("bands"))
            .unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, "/bands/{band_id}/");
        assert_eq!(
            paths[0].operations.keys().collect::<Vec<_>>(),
            vec!["delete", "get"]
        );

        let get = &paths[0].operations["get"];
        assert_eq!(get.summary.as_deref(), Some("Fetch"));
        assert_eq!(get.tags, Some(vec!["bands".to_string()]));
        assert_eq!(get.description.as_deref(), Some("A band"));
        assert_eq!(get.parameters[0]["name"], json!("band_id"));

        let delete = &paths[0].operations["delete"];
        assert_eq!(delete.tags, Some(vec!["admin".to_string()]));
        assert_eq!(delete.responses["204"], json!({"description": "Deleted"}));
    }

    #[test]
    fn missing_constructor_argument() {
        let (app, class) = app_with_band();
        let converter = ResourceConverter::new(app, Dialect::Swagger2);
        let err = converter.convert(&class, &RegisterOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            DocsError::Construct { ref name, source: ResourceError::MissingArgument(_) } if name == "BandResource"
        ));
    }
}

//! Registration targets and their options
//!
//! Only two kinds of view can be documented: view functions and resource
//! classes. Anything convertible into a [`Target`] can be passed to
//! [`ApiDocs::register`](crate::ApiDocs::register); views of any other kind
//! are rejected with a usage error.

use crate::error::{DocsError, Result};
use docspec_core::{ResourceArgs, ResourceClass, View, ViewFunction};
use serde_json::Value;

/// What a registration documents
#[derive(Debug, Clone)]
pub enum Target {
    Function(ViewFunction),
    Resource(ResourceClass),
}

impl Target {
    /// Name the endpoint is derived from when none is given
    pub fn name(&self) -> &str {
        match self {
            Target::Function(view) => view.name(),
            Target::Resource(class) => class.name(),
        }
    }
}

/// Conversion into a registration target
pub trait IntoTarget {
    fn into_target(self) -> Result<Target>;
}

impl IntoTarget for Target {
    fn into_target(self) -> Result<Target> {
        Ok(self)
    }
}

impl IntoTarget for ViewFunction {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Function(self))
    }
}

impl IntoTarget for &ViewFunction {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Function(self.clone()))
    }
}

impl IntoTarget for ResourceClass {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Resource(self))
    }
}

impl IntoTarget for &ResourceClass {
    fn into_target(self) -> Result<Target> {
        Ok(Target::Resource(self.clone()))
    }
}

impl IntoTarget for View {
    fn into_target(self) -> Result<Target> {
        match self {
            View::Function(view) => Ok(Target::Function(view)),
            View::Resource(view) => Ok(Target::Resource(view.class().clone())),
            View::Static(config) => Err(DocsError::Usage {
                kind: "static",
                name: config.prefix,
            }),
            View::Handler(handler) => Err(DocsError::Usage {
                kind: "raw handler",
                name: handler.name().to_string(),
            }),
        }
    }
}

/// Optional arguments of a registration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterOptions {
    /// Endpoint name; defaults to the target name, lower-cased
    pub endpoint: Option<String>,
    /// Blueprint the target is registered on
    pub blueprint: Option<String>,
    /// Constructor arguments used to instantiate a resource class
    pub resource_args: ResourceArgs,
}

impl RegisterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn blueprint(mut self, blueprint: impl Into<String>) -> Self {
        self.blueprint = Some(blueprint.into());
        self
    }

    pub fn resource_args(mut self, args: ResourceArgs) -> Self {
        self.resource_args = args;
        self
    }

    /// Append a positional constructor argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.resource_args = self.resource_args.arg(value);
        self
    }

    /// Set a keyword constructor argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource_args = self.resource_args.kwarg(name, value);
        self
    }
}

/// A captured `register` call
#[derive(Debug, Clone)]
pub struct Registration {
    pub target: Target,
    pub options: RegisterOptions,
}

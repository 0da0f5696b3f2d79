//! Views: what an endpoint dispatches to
//!
//! An endpoint is bound to one of four kinds of view:
//!
//! - [`ViewFunction`]: a single async handler carrying [`Annotations`]
//! - [`ResourceView`]: a [`ResourceClass`] plus the constructor arguments it
//!   is instantiated with on every request (method-based dispatch)
//! - a static directory ([`StaticFileConfig`])
//! - a raw internal handler without documentation metadata
//!
//! # Example
//!
//! ```rust,ignore
//! struct BandResource { prefix: String }
//!
//! impl MethodResource for BandResource {
//!     fn construct(args: &ResourceArgs) -> Result<Self, ResourceError> {
//!         Ok(Self { prefix: args.get(0, "prefix")? })
//!     }
//!
//!     fn methods(self: Arc<Self>) -> ResourceMethods {
//!         ResourceMethods::new().get(move |req: Request| {
//!             let this = self.clone();
//!             async move { format!("{}{}", this.prefix, req.view_arg("band_id").unwrap_or("")) }
//!         }, Annotations::new().summary("Fetch a band"))
//!     }
//! }
//!
//! let view = ResourceClass::of::<BandResource>().as_view(ResourceArgs::new().arg("band-"));
//! ```

use crate::error::{ApiError, ResourceError};
use crate::handler::{into_boxed_handler, same_handler, BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::IntoResponse;
use crate::static_files::{StaticFile, StaticFileConfig};
use docspec_openapi::Annotations;
use http::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A single async handler plus its documentation attributes
#[derive(Clone)]
pub struct ViewFunction {
    name: String,
    handler: BoxedHandler,
    annotations: Annotations,
}

impl ViewFunction {
    /// Wrap a handler; `name` becomes the default endpoint
    pub fn new<H, T>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        Self {
            name: name.into(),
            handler: into_boxed_handler(handler),
            annotations: Annotations::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Apply documentation attributes
    ///
    /// ```rust,ignore
    /// let view = ViewFunction::new("get_band", get_band)
    ///     .annotate(|a| a.tags(["band"]).marshal_with::<Band>(200));
    /// ```
    pub fn annotate<F>(mut self, apply: F) -> Self
    where
        F: FnOnce(Annotations) -> Annotations,
    {
        self.annotations = apply(self.annotations);
        self
    }

    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    fn call(&self, req: Request) -> BoxFuture {
        (self.handler)(req)
    }
}

impl fmt::Debug for ViewFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Constructor arguments for a resource class
///
/// Positional arguments and keyword arguments are both JSON values; a
/// constructor usually reads each parameter with [`ResourceArgs::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceArgs {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl ResourceArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Read the parameter at `index`, or passed by keyword as `name`
    pub fn get<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T, ResourceError> {
        self.lookup(index, name)
            .ok_or_else(|| ResourceError::MissingArgument(name.to_string()))
            .and_then(|value| decode(name, value))
    }

    /// Like [`ResourceArgs::get`], falling back to `default` when absent
    pub fn get_or<T: DeserializeOwned>(
        &self,
        index: usize,
        name: &str,
        default: T,
    ) -> Result<T, ResourceError> {
        match self.lookup(index, name) {
            Some(value) => decode(name, value),
            None => Ok(default),
        }
    }

    fn lookup(&self, index: usize, name: &str) -> Option<&Value> {
        self.kwargs.get(name).or_else(|| self.args.get(index))
    }
}

fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, ResourceError> {
    serde_json::from_value(value.clone()).map_err(|err| ResourceError::InvalidArgument {
        name: name.to_string(),
        message: err.to_string(),
    })
}

/// One verb method of a resource
#[derive(Clone)]
pub struct ResourceMethod {
    handler: BoxedHandler,
    annotations: Annotations,
}

impl ResourceMethod {
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

/// Verb methods an instantiated resource responds to
#[derive(Clone, Default)]
pub struct ResourceMethods {
    methods: Vec<(Method, ResourceMethod)>,
}

impl ResourceMethods {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the method for `verb`, replacing any earlier one
    pub fn on<H, T>(mut self, verb: Method, handler: H, annotations: Annotations) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        let method = ResourceMethod {
            handler: into_boxed_handler(handler),
            annotations,
        };
        match self.methods.iter_mut().find(|(m, _)| *m == verb) {
            Some(slot) => slot.1 = method,
            None => self.methods.push((verb, method)),
        }
        self
    }

    pub fn get<H: Handler<T>, T: 'static>(self, handler: H, annotations: Annotations) -> Self {
        self.on(Method::GET, handler, annotations)
    }

    pub fn post<H: Handler<T>, T: 'static>(self, handler: H, annotations: Annotations) -> Self {
        self.on(Method::POST, handler, annotations)
    }

    pub fn put<H: Handler<T>, T: 'static>(self, handler: H, annotations: Annotations) -> Self {
        self.on(Method::PUT, handler, annotations)
    }

    pub fn patch<H: Handler<T>, T: 'static>(self, handler: H, annotations: Annotations) -> Self {
        self.on(Method::PATCH, handler, annotations)
    }

    pub fn delete<H: Handler<T>, T: 'static>(self, handler: H, annotations: Annotations) -> Self {
        self.on(Method::DELETE, handler, annotations)
    }

    pub fn method(&self, verb: &Method) -> Option<&ResourceMethod> {
        self.methods.iter().find(|(m, _)| m == verb).map(|(_, method)| method)
    }

    /// Verbs in registration order
    pub fn verbs(&self) -> Vec<Method> {
        self.methods.iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// A class of resources dispatching on the HTTP method
///
/// Class-level annotations come from [`MethodResource::annotations`] and
/// apply to every verb method unless the method stops inheritance.
pub trait MethodResource: Send + Sync + Sized + 'static {
    /// Build an instance from constructor arguments
    fn construct(args: &ResourceArgs) -> Result<Self, ResourceError>;

    /// Class-level documentation attributes
    fn annotations(&self) -> Annotations {
        Annotations::new()
    }

    /// Verb methods of this instance
    fn methods(self: Arc<Self>) -> ResourceMethods;
}

/// An instantiated resource
#[derive(Clone)]
pub struct ResourceInstance {
    annotations: Annotations,
    methods: ResourceMethods,
}

impl ResourceInstance {
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn methods(&self) -> &ResourceMethods {
        &self.methods
    }
}

type Factory = Arc<dyn Fn(&ResourceArgs) -> Result<ResourceInstance, ResourceError> + Send + Sync>;

/// Type-erased handle to a [`MethodResource`] implementation
#[derive(Clone)]
pub struct ResourceClass {
    name: String,
    factory: Factory,
}

impl ResourceClass {
    /// Handle for `R`, named after the type
    pub fn of<R: MethodResource>() -> Self {
        Self {
            name: short_type_name::<R>().to_string(),
            factory: Arc::new(|args| {
                let resource = Arc::new(R::construct(args)?);
                let annotations = resource.annotations();
                let methods = resource.methods();
                Ok(ResourceInstance {
                    annotations,
                    methods,
                })
            }),
        }
    }

    /// Override the class name used for the default endpoint
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self, args: &ResourceArgs) -> Result<ResourceInstance, ResourceError> {
        (self.factory)(args)
    }

    /// Bind constructor arguments, producing a view
    pub fn as_view(&self, args: ResourceArgs) -> ResourceView {
        ResourceView {
            class: self.clone(),
            args,
        }
    }

    pub fn same_class(&self, other: &ResourceClass) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.factory) as *const (),
            Arc::as_ptr(&other.factory) as *const (),
        )
    }
}

impl fmt::Debug for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClass")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A resource class bound to constructor arguments
#[derive(Debug, Clone)]
pub struct ResourceView {
    class: ResourceClass,
    args: ResourceArgs,
}

impl ResourceView {
    pub fn class(&self) -> &ResourceClass {
        &self.class
    }

    pub fn args(&self) -> &ResourceArgs {
        &self.args
    }

    fn call(&self, req: Request) -> BoxFuture {
        let instance = match self.class.instantiate(&self.args) {
            Ok(instance) => instance,
            Err(err) => {
                tracing::error!(resource = %self.class.name(), error = %err, "Resource construction failed");
                let response = ApiError::internal(err.to_string()).into_response();
                return Box::pin(async move { response });
            }
        };

        let verb = if *req.method() == Method::HEAD {
            Method::GET
        } else {
            req.method().clone()
        };
        match instance.methods().method(&verb) {
            Some(method) => (method.handler)(req),
            None => {
                let response = ApiError::method_not_allowed(format!(
                    "Method {} not allowed for {}",
                    req.method(),
                    req.path()
                ))
                .into_response();
                Box::pin(async move { response })
            }
        }
    }
}

/// Internal handler registered without documentation metadata
#[derive(Clone)]
pub struct RawHandler {
    name: String,
    handler: BoxedHandler,
}

impl RawHandler {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RawHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What an endpoint dispatches to
#[derive(Debug, Clone)]
pub enum View {
    Function(ViewFunction),
    Resource(ResourceView),
    Static(StaticFileConfig),
    Handler(RawHandler),
}

impl View {
    /// Raw handler view
    pub fn handler<H, T>(name: impl Into<String>, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        View::Handler(RawHandler {
            name: name.into(),
            handler: into_boxed_handler(handler),
        })
    }

    /// Name used as the endpoint when none is given
    pub fn name(&self) -> &str {
        match self {
            View::Function(view) => view.name(),
            View::Resource(view) => view.class.name(),
            View::Static(_) => "static",
            View::Handler(handler) => handler.name(),
        }
    }

    /// Endpoint used when none is given; resource class names are lower-cased
    pub fn default_endpoint(&self) -> String {
        match self {
            View::Resource(view) => view.class.name().to_lowercase(),
            other => other.name().to_string(),
        }
    }

    /// Whether two views are the same registration target
    pub fn same_as(&self, other: &View) -> bool {
        match (self, other) {
            (View::Function(a), View::Function(b)) => same_handler(&a.handler, &b.handler),
            (View::Resource(a), View::Resource(b)) => {
                a.class.same_class(&b.class) && a.args == b.args
            }
            (View::Static(a), View::Static(b)) => a == b,
            (View::Handler(a), View::Handler(b)) => same_handler(&a.handler, &b.handler),
            _ => false,
        }
    }

    pub(crate) fn call(&self, req: Request) -> BoxFuture {
        match self {
            View::Function(view) => view.call(req),
            View::Resource(view) => view.call(req),
            View::Handler(handler) => (handler.handler)(req),
            View::Static(config) => {
                let config = config.clone();
                let filename = req.view_arg("filename").unwrap_or_default().to_string();
                Box::pin(async move {
                    match StaticFile::serve(&filename, &config).await {
                        Ok(response) => response,
                        Err(err) => err.into_response(),
                    }
                })
            }
        }
    }
}

impl From<ViewFunction> for View {
    fn from(view: ViewFunction) -> Self {
        View::Function(view)
    }
}

impl From<ResourceView> for View {
    fn from(view: ResourceView) -> Self {
        View::Resource(view)
    }
}

impl From<StaticFileConfig> for View {
    fn from(config: StaticFileConfig) -> Self {
        View::Static(config)
    }
}

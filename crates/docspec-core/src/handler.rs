//! Handler trait and utilities

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every type-erased handler
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Trait representing an async handler function
///
/// Implemented for async functions and closures taking either no argument
/// or the [`Request`].
pub trait Handler<T>: Clone + Send + Sync + Sized + 'static {
    /// The response type
    type Future: Future<Output = Response> + Send + 'static;

    /// Call the handler with the request
    fn call(self, req: Request) -> Self::Future;
}

// 0 args
impl<F, Fut, Res> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    type Future = BoxFuture;

    fn call(self, _req: Request) -> Self::Future {
        Box::pin(async move { self().await.into_response() })
    }
}

// Request arg
impl<F, Fut, Res> Handler<(Request,)> for F
where
    F: FnOnce(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    type Future = BoxFuture;

    fn call(self, req: Request) -> Self::Future {
        Box::pin(async move { self(req).await.into_response() })
    }
}

/// Type-erased handler for storage in the view registry
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync>;

/// Create a boxed handler from any Handler
pub fn into_boxed_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |req| {
        let handler = handler.clone();
        Box::pin(async move { handler.call(req).await })
    })
}

/// Identity comparison of two boxed handlers
pub(crate) fn same_handler(a: &BoxedHandler, b: &BoxedHandler) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

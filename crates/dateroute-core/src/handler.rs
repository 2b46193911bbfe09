//! Handler trait and utilities
//!
//! Handlers are async functions taking either nothing or the routed
//! [`Request`]. Once registered they are type-erased into a [`BoxedHandler`]
//! and shared, so a route carried into several version tables runs the same
//! handler.

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Trait representing an async handler function
pub trait Handler<T>: Clone + Send + Sync + Sized + 'static {
    /// The response future
    type Future: Future<Output = Response> + Send + 'static;

    /// Call the handler with the request
    fn call(self, req: Request) -> Self::Future;
}

impl<F, Fut, Res> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    type Future = BoxFuture<'static, Response>;

    fn call(self, _req: Request) -> Self::Future {
        async move { self().await.into_response() }.boxed()
    }
}

impl<F, Fut, Res> Handler<(Request,)> for F
where
    F: FnOnce(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    type Future = BoxFuture<'static, Response>;

    fn call(self, req: Request) -> Self::Future {
        async move { self(req).await.into_response() }.boxed()
    }
}

/// Type-erased, shareable handler
pub type BoxedHandler = Arc<dyn Fn(Request) -> BoxFuture<'static, Response> + Send + Sync>;

/// Erase a handler's type
pub(crate) fn into_boxed_handler<H, T>(handler: H) -> BoxedHandler
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |req| {
        let handler = handler.clone();
        handler.call(req).boxed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;

    fn request(path: &str) -> Request {
        let (parts, _) = http::Request::get(path).body(()).unwrap().into_parts();
        Request::new(parts, Bytes::new())
    }

    #[tokio::test]
    async fn test_zero_arg_handler() {
        async fn ok() -> &'static str {
            "ok"
        }

        let boxed = into_boxed_handler(ok);
        let response = boxed(request("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_handler_sees_path() {
        async fn echo(req: Request) -> String {
            req.path().to_string()
        }

        let boxed = into_boxed_handler(echo);
        let response = boxed(request("/v1/users")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

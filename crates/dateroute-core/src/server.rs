//! HTTP server implementation

use crate::app::VersionedApi;
use crate::error::ApiError;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::versioning::Version;
use http::StatusCode;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Internal server struct
pub(crate) struct Server {
    api: Arc<VersionedApi>,
}

impl Server {
    pub fn new(api: VersionedApi) -> Self {
        Self { api: Arc::new(api) }
    }

    /// Accept connections until `shutdown` resolves
    ///
    /// Startup hooks finish before the first accept. Shutdown hooks run once
    /// the accept loop has stopped and open connections have drained.
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.api.startup().await;

        let addr = listener.local_addr()?;
        info!(
            versions = self.api.bundle().len(),
            "dateroute server running on http://{}", addr
        );

        let graceful = GracefulShutdown::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, _remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            error!("Accept error: {}", err);
                            continue;
                        }
                    };
                    let io = TokioIo::new(stream);
                    let api = self.api.clone();

                    let service = service_fn(move |req: hyper::Request<Incoming>| {
                        let api = api.clone();
                        async move { Ok::<_, Infallible>(handle_request(api, req).await) }
                    });

                    let conn = graceful.watch(http1::Builder::new().serve_connection(io, service));
                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            error!("Connection error: {}", err);
                        }
                    });
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, draining connections");
                    break;
                }
            }
        }

        drop(listener);
        graceful.shutdown().await;
        self.api.shutdown().await;
        Ok(())
    }
}

/// Buffer the body and hand the request to the application
async fn handle_request(api: Arc<VersionedApi>, req: hyper::Request<Incoming>) -> Response {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => return ApiError::from(err).into_response(),
    };
    api.handle(Request::new(parts, body)).await
}

/// Log request completion
pub(crate) fn log_request(
    method: &http::Method,
    path: &str,
    version: Option<Version>,
    status: StatusCode,
    start: std::time::Instant,
) {
    let elapsed = start.elapsed();
    let version = version.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());

    if status.is_success() {
        info!(
            method = %method,
            path = %path,
            version = %version,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request completed"
        );
    } else {
        error!(
            method = %method,
            path = %path,
            version = %version,
            status = %status.as_u16(),
            duration_ms = %elapsed.as_millis(),
            "Request failed"
        );
    }
}

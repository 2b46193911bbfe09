//! VersionedApi - the root router
//!
//! Composes the version resolver, the per-version route tables, an
//! unversioned route table and lifecycle hooks into one application.
//!
//! ```rust,ignore
//! use dateroute::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let bundle = Arc::new(VersionBundle::new([
//!         "2022-01-10".parse()?,
//!         "2022-02-11".parse()?,
//!     ])?);
//!
//!     let tables = RouteTableSet::builder(bundle.clone())
//!         .add_at(bundle.lowest(), Route::get("/v1/users", list_users).name("users"))
//!         .build()?;
//!
//!     VersionedApi::new(tables)
//!         .unversioned_route(Route::get("/health", health))
//!         .run("127.0.0.1:8080")
//!         .await
//! }
//! ```

use crate::config::RoutingConfig;
use crate::dispatcher::{dispatch, RouteMatch, Scope};
use crate::error::{ApiError, RoutingError};
use crate::lifecycle::Lifecycle;
use crate::path_params::PathParams;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::reverse::{url_path_for_tables, NoMatchFound};
use crate::server::{log_request, Server};
use crate::table::{Route, RouteTable, RouteTableSet};
use crate::versioning::{
    DefaultVersion, Resolution, Version, VersionBundle, VersionExtractor, VersionResolver,
    VersionSource,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use http_body_util::Full;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// A successful routing decision
#[derive(Debug)]
pub enum Routed<'a> {
    /// A route will serve the request
    Found {
        route: &'a Route,
        params: PathParams,
        /// Serving version, `None` for unversioned routes
        version: Option<Version>,
    },
    /// The scope is not HTTP; nothing was consulted
    Skipped,
}

/// Date-versioned application
pub struct VersionedApi {
    tables: RouteTableSet,
    unversioned: RouteTable,
    resolver: VersionResolver,
    extractor: VersionExtractor,
    lifecycle: Lifecycle,
    config: RoutingConfig,
}

impl VersionedApi {
    /// Create an application serving `tables`
    ///
    /// Initializes a `tracing` subscriber unless one is already installed.
    pub fn new(tables: RouteTableSet) -> Self {
        let _ = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,dateroute=debug")),
            )
            .with(tracing_subscriber::fmt::layer())
            .try_init();

        let resolver = VersionResolver::new(tables.bundle().clone());
        Self {
            tables,
            unversioned: RouteTable::new(),
            resolver,
            extractor: VersionExtractor::new(),
            lifecycle: Lifecycle::new(),
            config: RoutingConfig::default(),
        }
    }

    /// Apply a [`RoutingConfig`]
    pub fn with_config(mut self, config: RoutingConfig) -> Self {
        self.extractor = VersionExtractor::with_source(config.version_source());
        self.resolver = self.resolver.default_version(config.default_version);
        self.config = config;
        self
    }

    /// Policy for requests without a version
    pub fn default_version(self, default: DefaultVersion) -> Self {
        let config = self.config.clone().with_default_version(default);
        self.with_config(config)
    }

    /// Where the version token is read from
    pub fn version_source(self, source: VersionSource) -> Self {
        let config = match source {
            VersionSource::Header { name } => self.config.clone().with_version_header(name),
            VersionSource::HostLabel { index } => self.config.clone().with_host_label(index),
        };
        self.with_config(config)
    }

    /// Echo the serving version in the version header of each response
    pub fn echo_version_header(self, echo: bool) -> Self {
        let config = self.config.clone().with_echo_version_header(echo);
        self.with_config(config)
    }

    /// Add a route that bypasses version resolution
    pub fn unversioned_route(mut self, route: Route) -> Self {
        self.unversioned.push(route);
        self
    }

    /// Add every route of `table` as unversioned
    pub fn unversioned_routes(mut self, table: RouteTable) -> Self {
        for route in table.iter() {
            self.unversioned.push(route.clone());
        }
        self
    }

    /// Register an async hook run once before serving
    pub fn on_startup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.lifecycle.on_startup(hook);
        self
    }

    /// Register an async hook run once after serving stops
    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.lifecycle.on_shutdown(hook);
        self
    }

    /// Run startup hooks (once)
    pub async fn startup(&self) {
        if self.lifecycle.startup().await {
            tracing::info!("Application startup complete");
        }
    }

    /// Run shutdown hooks (once)
    pub async fn shutdown(&self) {
        if self.lifecycle.shutdown().await {
            tracing::info!("Application shutdown complete");
        }
    }

    pub fn bundle(&self) -> &Arc<VersionBundle> {
        self.tables.bundle()
    }

    pub fn tables(&self) -> &RouteTableSet {
        &self.tables
    }

    pub fn unversioned(&self) -> &RouteTable {
        &self.unversioned
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Resolve the version a request asks for
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Resolution, RoutingError> {
        let token = self.extractor.extract(headers);
        self.resolver.resolve_token(&token)
    }

    /// Decide which route serves `scope`
    ///
    /// Unversioned routes are tried first. Version errors surface before
    /// versioned matching; a path known only under another method yields
    /// [`RoutingError::MethodNotAllowed`].
    pub fn route(&self, scope: &Scope, headers: &HeaderMap) -> Result<Routed<'_>, RoutingError> {
        let Scope::Http { method, path } = scope else {
            return Ok(Routed::Skipped);
        };

        let mut allowed: Vec<Method> = Vec::new();

        match dispatch(&self.unversioned, scope) {
            RouteMatch::Found { route, params } => {
                return Ok(Routed::Found {
                    route,
                    params,
                    version: None,
                })
            }
            RouteMatch::MethodNotAllowed { allowed: methods } => allowed = methods,
            RouteMatch::NotFound | RouteMatch::Skipped => {}
        }

        // a path known unversioned never reports a version error
        let resolution = match self.resolve(headers) {
            Ok(resolution) => resolution,
            Err(err) if !allowed.is_empty() => {
                tracing::debug!(error = %err, "Version ignored for unversioned path");
                return Err(RoutingError::MethodNotAllowed {
                    method: method.clone(),
                    path: path.clone(),
                    allowed,
                });
            }
            Err(err) => return Err(err),
        };

        match resolution {
            Resolution::Matched { version, .. } => {
                if let Some(table) = self.tables.get(version) {
                    match dispatch(table, scope) {
                        RouteMatch::Found { route, params } => {
                            return Ok(Routed::Found {
                                route,
                                params,
                                version: Some(version),
                            })
                        }
                        RouteMatch::MethodNotAllowed { allowed: methods } => {
                            for m in methods {
                                if !allowed.contains(&m) {
                                    allowed.push(m);
                                }
                            }
                        }
                        RouteMatch::NotFound | RouteMatch::Skipped => {}
                    }
                }
            }
            Resolution::BelowRange { requested } => {
                tracing::debug!(
                    requested = %requested,
                    lowest = %self.bundle().lowest(),
                    "Requested version predates every supported version"
                );
            }
        }

        if allowed.is_empty() {
            Err(RoutingError::NotFound {
                method: method.clone(),
                path: path.clone(),
            })
        } else {
            Err(RoutingError::MethodNotAllowed {
                method: method.clone(),
                path: path.clone(),
                allowed,
            })
        }
    }

    /// Whether some route serves `scope`
    pub fn matches(&self, scope: &Scope, headers: &HeaderMap) -> bool {
        matches!(self.route(scope, headers), Ok(Routed::Found { .. }))
    }

    /// Route and run a request
    pub async fn handle(&self, mut req: Request) -> Response {
        let start = std::time::Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();
        let scope = Scope::http(method.clone(), path.clone());

        let routed = self.route(&scope, req.headers());
        let (response, version) = match routed {
            Ok(Routed::Found {
                route,
                params,
                version,
            }) => {
                req.set_path_params(params);
                if let Some(version) = version {
                    req.extensions_mut().insert(version);
                }
                let handler = route.handler().clone();
                (handler(req).await, version)
            }
            Ok(Routed::Skipped) => (
                ApiError::not_found(format!("no route found for {} {}", method, path))
                    .into_response(),
                None,
            ),
            Err(err) => {
                tracing::debug!(error = %err, "Routing failed");
                (ApiError::from(err).into_response(), None)
            }
        };

        let response = self.finish_response(response, &method, version);
        log_request(&method, &path, version, response.status(), start);
        response
    }

    fn finish_response(&self, mut response: Response, method: &Method, version: Option<Version>) -> Response {
        if *method == Method::HEAD {
            *response.body_mut() = Full::new(Bytes::new());
        }

        if self.config.echo_version_header {
            if let Some(version) = version {
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(self.config.version_header.as_bytes()),
                    HeaderValue::from_str(&version.to_string()),
                ) {
                    response.headers_mut().insert(name, value);
                }
            }
        }

        response
    }

    /// Build a path by route name across unversioned and all versioned tables
    ///
    /// Unversioned routes are searched first, then versions newest first.
    pub fn url_path_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, NoMatchFound> {
        let tables = std::iter::once(&self.unversioned)
            .chain(self.tables.iter_newest_first().map(|(_, table)| table.as_ref()));
        url_path_for_tables(tables, name, params)
    }

    /// Build a path by route name in the table serving `version`
    ///
    /// `version` resolves nearest-lower like a request would.
    pub fn url_path_for_version(
        &self,
        version: Version,
        name: &str,
        params: &[(&str, &str)],
    ) -> Result<String, NoMatchFound> {
        let table = self
            .bundle()
            .floor(version)
            .and_then(|v| self.tables.get(v))
            .map(|table| table.as_ref());
        url_path_for_tables(table, name, params)
    }

    /// Serve on `addr` until Ctrl-C
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: std::net::SocketAddr = addr.parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "Failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Serve on `listener` until `shutdown` completes
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Server::new(self).serve(listener, shutdown).await
    }
}

impl std::fmt::Debug for VersionedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedApi")
            .field("versions", &self.bundle().versions())
            .field("unversioned_routes", &self.unversioned.len())
            .field("config", &self.config)
            .finish()
    }
}

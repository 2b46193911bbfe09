//! # dateroute-core
//!
//! Core library for dateroute. Most users should depend on the `dateroute`
//! crate instead.
//!
//! Requests name the API revision they were written against with a calendar
//! date. The date resolves to the newest supported version not after it, and
//! that version's route table serves the request.

pub mod config;
pub mod dispatcher;
pub mod path;
pub mod reverse;
pub mod table;
pub mod versioning;

mod app;
mod error;
mod handler;
mod lifecycle;
mod path_params;
mod request;
mod response;
mod server;
#[cfg(any(test, feature = "test-utils"))]
mod test_client;

pub use app::{Routed, VersionedApi};
pub use config::{ConfigError, RoutingConfig, SourceKind};
pub use dispatcher::{dispatch, RouteMatch, Scope};
pub use error::{ApiError, FieldError, Result, RoutingError};
pub use handler::{BoxedHandler, Handler};
pub use lifecycle::{Lifecycle, LifecycleHook};
pub use path::{Convertor, PathPattern, PatternError};
pub use path_params::PathParams;
pub use request::Request;
pub use response::{IntoResponse, Json, Response};
pub use reverse::{url_path_for_tables, NoMatchFound};
pub use table::{Route, RouteTable, RouteTableBuilder, RouteTableSet, RouteTableSetBuilder, TableSetError};
#[cfg(any(test, feature = "test-utils"))]
pub use test_client::{TestClient, TestRequest, TestResponse};
pub use versioning::{
    BundleError, DefaultVersion, Resolution, ResolvedVersionToken, Version, VersionBundle,
    VersionExtractor, VersionParseError, VersionResolver, VersionSource, DEFAULT_VERSION_HEADER,
};

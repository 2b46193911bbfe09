//! # dateroute
//!
//! Date-versioned HTTP routing.
//!
//! An API keeps every supported revision alive by naming each one with a
//! calendar date. Callers send the date they integrated against (by default
//! in the `X-API-VERSION` header) and are served by the newest revision not
//! after that date.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dateroute::prelude::*;
//!
//! async fn users() -> Json<serde_json::Value> {
//!     Json(serde_json::json!({"users": []}))
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let bundle = Arc::new(VersionBundle::new([
//!         "2022-01-10".parse()?,
//!         "2022-02-11".parse()?,
//!     ])?);
//!
//!     let tables = RouteTableSet::builder(bundle.clone())
//!         .add_at(bundle.lowest(), Route::get("/v1/users", users).name("users"))
//!         .build()?;
//!
//!     VersionedApi::new(tables).run("127.0.0.1:8080").await
//! }
//! ```
//!
//! ## Behaviour
//!
//! - A route added at one version stays reachable at every later version
//!   until a later version removes it
//! - A date between two versions is served by the older one
//! - A date before the oldest version finds no routes (404)
//! - A malformed date is a validation error (422) located at the header
//! - A known path with an unregistered method is 405 with an `Allow` header
//!
//! ## Optional Features
//!
//! - `test-utils` - in-memory [`TestClient`] for driving an app in tests

// Re-export core functionality
pub use dateroute_core::*;

/// Prelude module - import everything you need with `use dateroute::prelude::*`
pub mod prelude {
    pub use dateroute_core::{
        // Error handling
        ApiError,
        DefaultVersion,
        FieldError,
        // Response types
        IntoResponse,
        Json,
        NoMatchFound,
        PathParams,
        // Request context
        Request,
        Response,
        Result,
        // Routing
        Route,
        RouteTable,
        RouteTableSet,
        RoutingConfig,
        RoutingError,
        Scope,
        // Versions
        Version,
        VersionBundle,
        VersionSource,
        VersionedApi,
    };

    pub use http::{Method, StatusCode};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use tracing::{debug, error, info, trace, warn};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let version: Version = "2022-02-11".parse().unwrap();
        assert_eq!(version.to_string(), "2022-02-11");
    }
}

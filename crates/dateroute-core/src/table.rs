//! Route tables
//!
//! A [`RouteTable`] is the ordered, immutable set of routes served at one API
//! version. A [`RouteTableSet`] holds one table per version of a
//! [`VersionBundle`].
//!
//! Tables can be handed in complete with [`RouteTableSet::from_tables`], or
//! produced by forward carry with [`RouteTableSet::builder`]: each version
//! starts from the previous version's table, drops the routes removed at that
//! version, and adds the routes introduced at it.
//!
//! ```rust,ignore
//! let tables = RouteTableSet::builder(bundle.clone())
//!     .add_at(v2022_01_10, Route::get("/v1/users", list_users).name("users"))
//!     .add_at(v2022_02_11, Route::get("/v1/users/{username}/{page:int}", user_page))
//!     .remove_at(v2022_03_12, Method::GET, "/v1/users")
//!     .build()?;
//! ```

use crate::handler::{into_boxed_handler, BoxedHandler, Handler};
use crate::path::{PathPattern, PatternError};
use crate::versioning::{Version, VersionBundle};
use http::Method;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One routing rule: path template, method, handler and optional name
#[derive(Clone)]
pub struct Route {
    pattern: Arc<PathPattern>,
    method: Method,
    handler: BoxedHandler,
    name: Option<String>,
}

impl Route {
    /// Create a route
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template. Use [`Route::try_new`] to
    /// handle the error instead.
    pub fn new<H, T>(method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T>,
        T: 'static,
    {
        match Self::try_new(method, path, handler) {
            Ok(route) => route,
            Err(err) => panic!("Invalid route path: {}", err),
        }
    }

    /// Create a route, reporting an invalid template as an error
    pub fn try_new<H, T>(method: Method, path: &str, handler: H) -> Result<Self, PatternError>
    where
        H: Handler<T>,
        T: 'static,
    {
        Ok(Self {
            pattern: Arc::new(PathPattern::parse(path)?),
            method,
            handler: into_boxed_handler(handler),
            name: None,
        })
    }

    pub fn get<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::GET, path, handler)
    }

    pub fn post<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::POST, path, handler)
    }

    pub fn put<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    pub fn patch<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    pub fn delete<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    pub fn head<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::HEAD, path, handler)
    }

    pub fn options<H: Handler<T>, T: 'static>(path: &str, handler: H) -> Self {
        Self::new(Method::OPTIONS, path, handler)
    }

    /// Name the route for reverse lookup
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn path(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn route_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    fn same_endpoint(&self, method: &Method, path: &str) -> bool {
        self.method == *method && self.pattern.as_str() == path
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.pattern.as_str())
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered routes served at one version
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Routes in match order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Whether a route with this method and template is present
    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.iter().any(|r| r.same_endpoint(method, path))
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// Builder appending routes in match order
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            routes: self.routes,
        }
    }
}

/// Error assembling a [`RouteTableSet`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableSetError {
    /// A bundle version has no table
    #[error("no route table provided for version {0}")]
    MissingVersion(Version),

    /// A table or instruction names a version outside the bundle
    #[error("version {0} is not part of the version bundle")]
    UnknownVersion(Version),

    /// Two tables were given for the same version
    #[error("more than one route table provided for version {0}")]
    DuplicateVersion(Version),

    /// A removal names a route that is not present at that version
    #[error("cannot remove {method} {path} at version {version}: route does not exist")]
    RouteNotFound {
        version: Version,
        method: Method,
        path: String,
    },

    /// A removal by name matched nothing at that version
    #[error("cannot remove route named \"{name}\" at version {version}: route does not exist")]
    NamedRouteNotFound { version: Version, name: String },
}

/// One route table per bundle version
#[derive(Debug, Clone)]
pub struct RouteTableSet {
    bundle: Arc<VersionBundle>,
    tables: BTreeMap<Version, Arc<RouteTable>>,
}

impl RouteTableSet {
    /// Accept complete per-version tables
    ///
    /// Every bundle version must have exactly one table and no table may name
    /// a version outside the bundle.
    pub fn from_tables<I>(bundle: Arc<VersionBundle>, tables: I) -> Result<Self, TableSetError>
    where
        I: IntoIterator<Item = (Version, RouteTable)>,
    {
        let mut map = BTreeMap::new();
        for (version, table) in tables {
            if !bundle.contains(&version) {
                return Err(TableSetError::UnknownVersion(version));
            }
            if map.insert(version, Arc::new(table)).is_some() {
                return Err(TableSetError::DuplicateVersion(version));
            }
        }

        if let Some(missing) = bundle.iter().find(|v| !map.contains_key(*v)) {
            return Err(TableSetError::MissingVersion(*missing));
        }

        Ok(Self {
            bundle,
            tables: map,
        })
    }

    /// Start a forward-carry builder
    pub fn builder(bundle: Arc<VersionBundle>) -> RouteTableSetBuilder {
        RouteTableSetBuilder {
            bundle,
            changes: BTreeMap::new(),
        }
    }

    pub fn bundle(&self) -> &Arc<VersionBundle> {
        &self.bundle
    }

    /// The table for an exact bundle version
    pub fn get(&self, version: Version) -> Option<&Arc<RouteTable>> {
        self.tables.get(&version)
    }

    /// Tables oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Version, &Arc<RouteTable>)> {
        self.tables.iter().map(|(v, t)| (*v, t))
    }

    /// Tables newest first
    pub fn iter_newest_first(&self) -> impl Iterator<Item = (Version, &Arc<RouteTable>)> {
        self.iter().rev()
    }
}

#[derive(Debug)]
enum Change {
    Add(Route),
    Remove { method: Method, path: String },
    RemoveNamed(String),
}

/// Builds a [`RouteTableSet`] by carrying routes forward through the bundle
///
/// Changes at a version are applied in the order they were given. An added
/// route replaces a carried route with the same method and template in place;
/// otherwise it is appended.
#[derive(Debug)]
pub struct RouteTableSetBuilder {
    bundle: Arc<VersionBundle>,
    changes: BTreeMap<Version, Vec<Change>>,
}

impl RouteTableSetBuilder {
    /// Introduce `route` at `version`
    pub fn add_at(self, version: Version, route: Route) -> Self {
        self.push(version, Change::Add(route))
    }

    /// Introduce several routes at `version`
    pub fn add_all_at(mut self, version: Version, routes: impl IntoIterator<Item = Route>) -> Self {
        for route in routes {
            self = self.add_at(version, route);
        }
        self
    }

    /// Remove the route with this method and template starting at `version`
    pub fn remove_at(self, version: Version, method: Method, path: impl Into<String>) -> Self {
        self.push(
            version,
            Change::Remove {
                method,
                path: path.into(),
            },
        )
    }

    /// Remove every route with this name starting at `version`
    pub fn remove_named_at(self, version: Version, name: impl Into<String>) -> Self {
        self.push(version, Change::RemoveNamed(name.into()))
    }

    fn push(mut self, version: Version, change: Change) -> Self {
        self.changes.entry(version).or_default().push(change);
        self
    }

    /// Produce the tables oldest to newest
    pub fn build(mut self) -> Result<RouteTableSet, TableSetError> {
        if let Some(unknown) = self.changes.keys().find(|v| !self.bundle.contains(v)) {
            return Err(TableSetError::UnknownVersion(*unknown));
        }

        let mut tables = BTreeMap::new();
        let mut current: Vec<Route> = Vec::new();

        for &version in self.bundle.iter() {
            for change in self.changes.remove(&version).unwrap_or_default() {
                apply(&mut current, version, change)?;
            }
            tables.insert(
                version,
                Arc::new(RouteTable {
                    routes: current.clone(),
                }),
            );
        }

        tracing::debug!(versions = tables.len(), "Built versioned route tables");

        Ok(RouteTableSet {
            bundle: self.bundle,
            tables,
        })
    }
}

fn apply(routes: &mut Vec<Route>, version: Version, change: Change) -> Result<(), TableSetError> {
    match change {
        Change::Add(route) => {
            match routes
                .iter_mut()
                .find(|r| r.same_endpoint(&route.method, route.path()))
            {
                Some(existing) => *existing = route,
                None => routes.push(route),
            }
        }
        Change::Remove { method, path } => {
            let before = routes.len();
            routes.retain(|r| !r.same_endpoint(&method, &path));
            if routes.len() == before {
                return Err(TableSetError::RouteNotFound {
                    version,
                    method,
                    path,
                });
            }
        }
        Change::RemoveNamed(name) => {
            let before = routes.len();
            routes.retain(|r| r.route_name() != Some(name.as_str()));
            if routes.len() == before {
                return Err(TableSetError::NamedRouteNotFound { version, name });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn bundle() -> Arc<VersionBundle> {
        Arc::new(VersionBundle::new([v("2022-01-10"), v("2022-02-11"), v("2022-03-12")]).unwrap())
    }

    fn paths(table: &RouteTable) -> Vec<String> {
        table
            .iter()
            .map(|r| format!("{} {}", r.method(), r.path()))
            .collect()
    }

    #[test]
    fn test_route_constructors() {
        let route = Route::patch("/v1/users/{id}", ok).name("patch_user");
        assert_eq!(route.method(), &Method::PATCH);
        assert_eq!(route.path(), "/v1/users/{id}");
        assert_eq!(route.route_name(), Some("patch_user"));
    }

    #[test]
    #[should_panic(expected = "Invalid route path")]
    fn test_invalid_path_panics() {
        let _ = Route::get("/v1/users/{id", ok);
    }

    #[test]
    fn test_try_new_reports_error() {
        let err = Route::try_new(Method::GET, "v1/users", ok).unwrap_err();
        assert!(matches!(err, PatternError::MissingLeadingSlash { .. }));
    }

    #[test]
    fn test_forward_carry() {
        let set = RouteTableSet::builder(bundle())
            .add_at(v("2022-01-10"), Route::get("/v1/users", ok))
            .add_at(v("2022-02-11"), Route::get("/v1/users/{username}/{page:int}", ok))
            .remove_at(v("2022-03-12"), Method::GET, "/v1/users")
            .build()
            .unwrap();

        assert_eq!(paths(set.get(v("2022-01-10")).unwrap()), vec!["GET /v1/users"]);
        assert_eq!(
            paths(set.get(v("2022-02-11")).unwrap()),
            vec!["GET /v1/users", "GET /v1/users/{username}/{page:int}"]
        );
        assert_eq!(
            paths(set.get(v("2022-03-12")).unwrap()),
            vec!["GET /v1/users/{username}/{page:int}"]
        );
    }

    #[test]
    fn test_carried_route_shares_handler() {
        let set = RouteTableSet::builder(bundle())
            .add_at(v("2022-01-10"), Route::get("/v1/users", ok))
            .build()
            .unwrap();

        let first = &set.get(v("2022-01-10")).unwrap().routes()[0];
        let last = &set.get(v("2022-03-12")).unwrap().routes()[0];
        assert!(Arc::ptr_eq(first.handler(), last.handler()));
    }

    #[test]
    fn test_add_replaces_same_endpoint() {
        let set = RouteTableSet::builder(bundle())
            .add_at(v("2022-01-10"), Route::get("/v1/users", ok).name("old"))
            .add_at(v("2022-01-10"), Route::get("/v1/doggies/{dogname}", ok))
            .add_at(v("2022-02-11"), Route::get("/v1/users", ok).name("new"))
            .build()
            .unwrap();

        let table = set.get(v("2022-02-11")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.routes()[0].route_name(), Some("new"));
    }

    #[test]
    fn test_builder_errors() {
        let unknown = RouteTableSet::builder(bundle())
            .add_at(v("2023-01-01"), Route::get("/x", ok))
            .build();
        assert_eq!(unknown.unwrap_err(), TableSetError::UnknownVersion(v("2023-01-01")));

        let missing = RouteTableSet::builder(bundle())
            .remove_at(v("2022-02-11"), Method::GET, "/nope")
            .build();
        assert!(matches!(missing, Err(TableSetError::RouteNotFound { .. })));

        let missing_named = RouteTableSet::builder(bundle())
            .remove_named_at(v("2022-02-11"), "nope")
            .build();
        assert!(matches!(missing_named, Err(TableSetError::NamedRouteNotFound { .. })));
    }

    #[test]
    fn test_from_tables_validates_versions() {
        let bundle = bundle();
        let complete = bundle.iter().map(|v| (*v, RouteTable::new())).collect::<Vec<_>>();
        assert!(RouteTableSet::from_tables(bundle.clone(), complete).is_ok());

        let partial = vec![(v("2022-01-10"), RouteTable::new())];
        assert_eq!(
            RouteTableSet::from_tables(bundle.clone(), partial).unwrap_err(),
            TableSetError::MissingVersion(v("2022-02-11"))
        );

        let stray = vec![(v("1999-01-01"), RouteTable::new())];
        assert_eq!(
            RouteTableSet::from_tables(bundle, stray).unwrap_err(),
            TableSetError::UnknownVersion(v("1999-01-01"))
        );
    }

    #[test]
    fn test_from_tables_rejects_duplicate_version() {
        let bundle = bundle();
        let mut tables = bundle.iter().map(|v| (*v, RouteTable::new())).collect::<Vec<_>>();
        tables.push((v("2022-02-11"), RouteTable::new()));

        assert_eq!(
            RouteTableSet::from_tables(bundle, tables).unwrap_err(),
            TableSetError::DuplicateVersion(v("2022-02-11"))
        );
    }

    #[test]
    fn test_newest_first_order() {
        let set = RouteTableSet::builder(bundle()).build().unwrap();
        let order: Vec<_> = set.iter_newest_first().map(|(v, _)| v.to_string()).collect();
        assert_eq!(order, vec!["2022-03-12", "2022-02-11", "2022-01-10"]);
    }

    proptest! {
        /// A route introduced at some version is present at every later version
        /// until the version that removes it
        #[test]
        fn prop_forward_carry(added in 0usize..3, removed in proptest::option::of(0usize..3)) {
            let bundle = bundle();
            let versions: Vec<Version> = bundle.iter().copied().collect();
            let removed = removed.filter(|r| *r > added);

            let mut builder = RouteTableSet::builder(bundle.clone())
                .add_at(versions[added], Route::get("/v1/users", ok));
            if let Some(r) = removed {
                builder = builder.remove_at(versions[r], Method::GET, "/v1/users");
            }
            let set = builder.build().unwrap();

            for (i, version) in versions.iter().enumerate() {
                let present = set.get(*version).unwrap().contains(&Method::GET, "/v1/users");
                let expected = i >= added && removed.map_or(true, |r| i < r);
                prop_assert_eq!(present, expected);
            }
        }
    }
}

//! Matching a request against one route table

use crate::path_params::PathParams;
use crate::table::{Route, RouteTable};
use http::Method;

/// What is being routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A plain HTTP request
    Http { method: Method, path: String },
    /// A WebSocket upgrade
    WebSocket { path: String },
    /// Server lifecycle events
    Lifespan,
}

impl Scope {
    pub fn http(method: Method, path: impl Into<String>) -> Self {
        Self::Http {
            method,
            path: path.into(),
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }
}

/// Outcome of matching a scope against a table
#[derive(Debug)]
pub enum RouteMatch<'a> {
    /// A route accepts both the path and the method
    Found {
        route: &'a Route,
        params: PathParams,
    },
    /// Some route accepts the path but none the method
    MethodNotAllowed { allowed: Vec<Method> },
    /// No route accepts the path
    NotFound,
    /// The scope is not HTTP and was not considered
    Skipped,
}

impl RouteMatch<'_> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Match `scope` against `table`
///
/// Routes are tried in table order. A path match with the wrong method does
/// not stop the scan. `HEAD` is served by `GET` routes.
pub fn dispatch<'a>(table: &'a RouteTable, scope: &Scope) -> RouteMatch<'a> {
    let Scope::Http { method, path } = scope else {
        return RouteMatch::Skipped;
    };

    let mut allowed: Vec<Method> = Vec::new();

    for route in table {
        let Some(params) = route.pattern().matches(path) else {
            continue;
        };

        if serves(route.method(), method) {
            return RouteMatch::Found { route, params };
        }

        push_unique(&mut allowed, route.method().clone());
        if *route.method() == Method::GET {
            push_unique(&mut allowed, Method::HEAD);
        }
    }

    if allowed.is_empty() {
        RouteMatch::NotFound
    } else {
        RouteMatch::MethodNotAllowed { allowed }
    }
}

fn serves(registered: &Method, requested: &Method) -> bool {
    registered == requested || (*requested == Method::HEAD && *registered == Method::GET)
}

fn push_unique(methods: &mut Vec<Method>, method: Method) {
    if !methods.contains(&method) {
        methods.push(method);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn table() -> RouteTable {
        RouteTable::builder()
            .route(Route::get("/v1/users", ok).name("users"))
            .route(Route::post("/v1/users", ok))
            .route(Route::get("/v1/users/{username}/{page:int}", ok))
            .route(Route::delete("/v1/users/{username}/{page:int}", ok))
            .route(Route::put("/v1/items/{id}", ok))
            .build()
    }

    #[test]
    fn test_found_with_params() {
        let table = table();
        match dispatch(&table, &Scope::http(Method::GET, "/v1/users/tom/83")) {
            RouteMatch::Found { route, params } => {
                assert_eq!(route.path(), "/v1/users/{username}/{page:int}");
                assert_eq!(params.get("username"), Some("tom"));
                assert_eq!(params.get("page"), Some("83"));
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_scan_continues_past_wrong_method() {
        let table = table();
        match dispatch(&table, &Scope::http(Method::POST, "/v1/users")) {
            RouteMatch::Found { route, .. } => assert_eq!(route.method(), &Method::POST),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let table = table();
        match dispatch(&table, &Scope::http(Method::PATCH, "/v1/users/tom/83")) {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::HEAD, Method::DELETE]);
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_head_served_by_get() {
        let table = table();
        let matched = dispatch(&table, &Scope::http(Method::HEAD, "/v1/users"));
        assert!(matched.is_found());

        // PUT-only path does not accept HEAD
        let not_allowed = dispatch(&table, &Scope::http(Method::HEAD, "/v1/items/1"));
        assert!(matches!(not_allowed, RouteMatch::MethodNotAllowed { .. }));
    }

    #[test]
    fn test_explicit_head_route_wins_when_first() {
        async fn head() -> http::StatusCode {
            http::StatusCode::NO_CONTENT
        }

        let table = RouteTable::builder()
            .route(Route::head("/ping", head))
            .route(Route::get("/ping", ok))
            .build();

        match dispatch(&table, &Scope::http(Method::HEAD, "/ping")) {
            RouteMatch::Found { route, .. } => assert_eq!(route.method(), &Method::HEAD),
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        let table = table();
        let matched = dispatch(&table, &Scope::http(Method::GET, "/v1/users/tom/page"));
        assert!(matches!(matched, RouteMatch::NotFound));
    }

    #[test]
    fn test_non_http_scopes_skip() {
        let table = table();
        let ws = dispatch(
            &table,
            &Scope::WebSocket {
                path: "/v1/users".into(),
            },
        );
        assert!(matches!(ws, RouteMatch::Skipped));
        assert!(matches!(dispatch(&table, &Scope::Lifespan), RouteMatch::Skipped));
    }
}

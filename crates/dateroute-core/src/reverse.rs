//! Reverse URL lookup
//!
//! Builds a path from a route name and parameter values. Lookups can span
//! several tables; candidates are considered in the order the tables and
//! their routes are given.

use crate::table::{Route, RouteTable};
use std::collections::BTreeMap;
use thiserror::Error;

/// No route accepts the requested name and parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No route exists for name \"{name}\" and params \"{}\".", .params.join(", "))]
pub struct NoMatchFound {
    /// The route name looked up
    pub name: String,
    /// The parameters reported as the reason for the failure
    pub params: Vec<String>,
}

/// Accumulates candidates across one or more tables
pub(crate) struct ReverseLookup<'p> {
    name: &'p str,
    params: BTreeMap<&'p str, &'p str>,
    missing: Option<Vec<String>>,
}

impl<'p> ReverseLookup<'p> {
    pub(crate) fn new(name: &'p str, params: &'p [(&'p str, &'p str)]) -> Self {
        Self {
            name,
            params: params.iter().copied().collect(),
            missing: None,
        }
    }

    /// Try every route of `table`, returning the first accepted path
    pub(crate) fn search(&mut self, table: &RouteTable) -> Option<String> {
        table.iter().find_map(|route| self.try_route(route))
    }

    fn try_route(&mut self, route: &Route) -> Option<String> {
        if route.route_name() != Some(self.name) {
            return None;
        }

        let pattern = route.pattern();
        let missing: Vec<String> = pattern
            .param_names()
            .filter(|name| !self.params.contains_key(*name))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            self.missing.get_or_insert(missing);
            return None;
        }

        let required = pattern.params().count();
        if self.params.len() != required {
            return None;
        }

        let valid = pattern
            .params()
            .all(|(name, convertor)| self.params.get(name).is_some_and(|v| convertor.accepts(v)));
        if !valid {
            return None;
        }

        let params = &self.params;
        pattern.render(|name| params.get(name).copied())
    }

    pub(crate) fn finish(self) -> NoMatchFound {
        let params = self
            .missing
            .unwrap_or_else(|| self.params.keys().map(|k| k.to_string()).collect());
        NoMatchFound {
            name: self.name.to_string(),
            params,
        }
    }
}

/// Look a path up across `tables` in order
pub fn url_path_for_tables<'t>(
    tables: impl IntoIterator<Item = &'t RouteTable>,
    name: &str,
    params: &[(&str, &str)],
) -> Result<String, NoMatchFound> {
    let mut lookup = ReverseLookup::new(name, params);
    for table in tables {
        if let Some(path) = lookup.search(table) {
            return Ok(path);
        }
    }
    Err(lookup.finish())
}

impl RouteTable {
    /// Build the path of the route named `name` from `params`
    ///
    /// ```rust,ignore
    /// let path = table.url_path_for("get_user", &[("username", "tom"), ("page", "83")])?;
    /// assert_eq!(path, "/v1/users/tom/83");
    /// ```
    pub fn url_path_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, NoMatchFound> {
        url_path_for_tables([self], name, params)
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
            .route(Route::get("/v1/users/{username}/{page:int}", ok).name("user_page"))
            .route(Route::get("/v1/doggies/{dogname}", ok).name("doggies"))
            .build()
    }

    #[test]
    fn test_substitutes_params() {
        let table = table();
        assert_eq!(table.url_path_for("users", &[]).unwrap(), "/v1/users");
        assert_eq!(
            table
                .url_path_for("user_page", &[("username", "tom"), ("page", "83")])
                .unwrap(),
            "/v1/users/tom/83"
        );
    }

    #[test]
    fn test_missing_params_are_named_in_declaration_order() {
        let table = table();

        let err = table.url_path_for("user_page", &[]).unwrap_err();
        assert_eq!(err.params, vec!["username", "page"]);
        assert_eq!(
            err.to_string(),
            r#"No route exists for name "user_page" and params "username, page"."#
        );

        let err = table.url_path_for("doggies", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"No route exists for name "doggies" and params "dogname"."#
        );
    }

    #[test]
    fn test_unknown_name_reports_supplied_keys() {
        let err = table()
            .url_path_for("cats", &[("z", "1"), ("a", "2")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"No route exists for name "cats" and params "a, z"."#
        );
    }

    #[test]
    fn test_extra_params_reject() {
        let err = table()
            .url_path_for("users", &[("page", "1")])
            .unwrap_err();
        assert_eq!(err.params, vec!["page"]);
    }

    #[test]
    fn test_invalid_values_reject() {
        let table = table();
        assert!(table
            .url_path_for("user_page", &[("username", "tom"), ("page", "eighty")])
            .is_err());
        assert!(table
            .url_path_for("doggies", &[("dogname", "a/b")])
            .is_err());
        assert!(table.url_path_for("doggies", &[("dogname", "")]).is_err());
    }

    #[test]
    fn test_first_accepting_table_wins() {
        let older = RouteTable::builder()
            .route(Route::get("/v1/old/{id}", ok).name("item"))
            .build();
        let newer = RouteTable::builder()
            .route(Route::get("/v2/item/{id}", ok).name("item"))
            .build();

        let path = url_path_for_tables([&newer, &older], "item", &[("id", "7")]).unwrap();
        assert_eq!(path, "/v2/item/7");
    }
}

use std::collections::HashMap;

/// Handlers reachable through the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ping,
    Users,
    Tokens,
    Checks,
    Assets,
    NotFound,
}

/// Exact-match mapping from a normalized path to a handler, plus a reserved
/// prefix under which every path resolves to the static-asset handler.
///
/// Constructed once and injected into the dispatcher through application
/// state; it is never mutated after startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, Route>,
    asset_prefix: String,
}

impl RouteTable {
    pub fn new() -> Self {
        let mut routes = HashMap::new();
        routes.insert("ping".to_string(), Route::Ping);
        routes.insert("users".to_string(), Route::Users);
        routes.insert("tokens".to_string(), Route::Tokens);
        routes.insert("checks".to_string(), Route::Checks);
        Self {
            routes,
            asset_prefix: "public".to_string(),
        }
    }

    #[cfg(test)]
    pub fn insert(&mut self, path: impl Into<String>, route: Route) {
        self.routes.insert(path.into(), route);
    }

    /// Resolve a normalized path. The asset prefix wins over any exact
    /// match; everything unmatched falls back to `NotFound`.
    pub fn resolve(&self, path: &str) -> Route {
        let under_prefix = path
            .strip_prefix(self.asset_prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        if under_prefix {
            return Route::Assets;
        }
        self.routes.get(path).copied().unwrap_or(Route::NotFound)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

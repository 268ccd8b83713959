//! Ordered route table and three-phase resolution
//!
//! Registration order is match priority. Resolution scans every route once:
//!
//! 1. URL pattern against the path, skipping non-matches
//! 2. method, recording mismatching methods into `allowed`
//! 3. version, recording mismatching routes' versions into `acceptable`
//!
//! The first route passing all three wins and the scan stops. Without a full
//! match, a non-empty `acceptable` set yields a version mismatch, else a
//! non-empty `allowed` set a method mismatch, else not found.
//!
//! Resolution never mutates the table.

use std::sync::Arc;
use std::time::Instant;

use http::Method;
use tracing::{debug, info, warn};

use super::{ParamVec, Route};

/// A fully matched route with its bound path parameters
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    pub params: ParamVec,
}

/// Outcome of [`RouteTable::resolve`]
#[derive(Debug, Clone)]
pub enum Resolution {
    Matched(RouteMatch),
    NotFound,
    /// Methods registered for the path, deduplicated, in registration order
    MethodNotAllowed(Vec<Method>),
    /// Versions the path+method routes would accept, deduplicated
    VersionNotAllowed(Vec<String>),
}

/// Identifies a route for removal
#[derive(Debug, Clone, Copy)]
pub enum RouteKey<'a> {
    Name(&'a str),
    Route(&'a Route),
}

impl<'a> From<&'a str> for RouteKey<'a> {
    fn from(name: &'a str) -> Self {
        RouteKey::Name(name)
    }
}

impl<'a> From<&'a String> for RouteKey<'a> {
    fn from(name: &'a String) -> Self {
        RouteKey::Name(name)
    }
}

impl<'a> From<&'a Route> for RouteKey<'a> {
    fn from(route: &'a Route) -> Self {
        RouteKey::Route(route)
    }
}

impl<'a> From<&'a Arc<Route>> for RouteKey<'a> {
    fn from(route: &'a Arc<Route>) -> Self {
        RouteKey::Route(route)
    }
}

impl RouteKey<'_> {
    fn matches(&self, route: &Route) -> bool {
        match self {
            RouteKey::Name(name) => route.name() == *name,
            RouteKey::Route(other) => route.same_route(other),
        }
    }
}

/// Ordered collection of routes
///
/// Cloning is cheap (routes are shared); the server publishes a fresh table
/// on every registration so in-flight resolutions keep a consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
}

fn push_unique<T: PartialEq + Clone>(into: &mut Vec<T>, items: impl IntoIterator<Item = T>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes in registration (priority) order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    /// Route by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Route>> {
        self.routes.iter().find(|r| r.name() == name)
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Append a route and back-patch the `allowed_methods` of every route with
    /// a structurally identical pattern (and the new route with theirs).
    ///
    /// Patched siblings are copied on write, so snapshots already handed out
    /// are never modified.
    pub fn insert(&mut self, mut route: Route) -> Arc<Route> {
        let mut methods: Vec<Method> = Vec::new();
        for existing in &mut self.routes {
            if existing.pattern().same_shape(route.pattern()) {
                push_unique(&mut methods, [existing.method().clone()]);
                if !existing.allowed_methods().contains(route.method()) {
                    Arc::make_mut(existing).allow_method(route.method());
                }
            }
        }
        push_unique(&mut methods, [route.method().clone()]);
        route.set_allowed_methods(methods);
        let route = Arc::new(route);
        self.routes.push(Arc::clone(&route));
        route
    }

    /// Remove the first route matching `key`, recomputing its siblings' allowed methods
    pub fn remove(&mut self, key: RouteKey<'_>) -> Option<Arc<Route>> {
        let idx = self.routes.iter().position(|r| key.matches(r))?;
        let removed = self.routes.remove(idx);

        let siblings: Vec<usize> = self
            .routes
            .iter()
            .enumerate()
            .filter(|(_, r)| r.pattern().same_shape(removed.pattern()))
            .map(|(i, _)| i)
            .collect();
        let mut methods: Vec<Method> = Vec::new();
        push_unique(
            &mut methods,
            siblings.iter().map(|&i| self.routes[i].method().clone()),
        );
        for i in siblings {
            Arc::make_mut(&mut self.routes[i]).set_allowed_methods(methods.clone());
        }

        info!(
            route_name = %removed.name(),
            method = %removed.method(),
            path = %removed.path(),
            routes_count = self.routes.len(),
            "Route removed"
        );
        Some(removed)
    }

    /// Resolve a request against the table
    ///
    /// # Example
    ///
    /// ```rust
    /// use chainrouter::router::{Resolution, RouteTable};
    /// use http::Method;
    ///
    /// let table = RouteTable::new();
    /// let versions = vec!["*".to_string()];
    /// assert!(matches!(
    ///     table.resolve(&Method::GET, "/nothing", &versions),
    ///     Resolution::NotFound
    /// ));
    /// ```
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str, versions: &[String]) -> Resolution {
        let match_start = Instant::now();
        let mut allowed: Vec<Method> = Vec::new();
        let mut acceptable: Vec<String> = Vec::new();

        for route in &self.routes {
            let Some(params) = route.matches_path(path) else {
                continue;
            };
            if !route.matches_method(method) {
                push_unique(&mut allowed, route.allowed_methods().iter().cloned());
                continue;
            }
            if !route.matches_version(versions) {
                push_unique(&mut acceptable, route.versions().versions().iter().cloned());
                continue;
            }

            debug!(
                method = %method,
                path = %path,
                route_name = %route.name(),
                route_pattern = %route.path(),
                path_params = ?params,
                duration_us = match_start.elapsed().as_micros(),
                "Route matched"
            );
            return Resolution::Matched(RouteMatch {
                route: Arc::clone(route),
                params,
            });
        }

        let duration_us = match_start.elapsed().as_micros();
        if !acceptable.is_empty() {
            warn!(
                method = %method,
                path = %path,
                requested = ?versions,
                acceptable = ?acceptable,
                duration_us,
                "No route accepted the requested version"
            );
            Resolution::VersionNotAllowed(acceptable)
        } else if !allowed.is_empty() {
            warn!(
                method = %method,
                path = %path,
                allowed = ?allowed,
                duration_us,
                "Method not allowed"
            );
            Resolution::MethodNotAllowed(allowed)
        } else {
            warn!(method = %method, path = %path, duration_us, "No route matched");
            Resolution::NotFound
        }
    }
}

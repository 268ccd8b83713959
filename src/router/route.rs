use std::fmt;

use http::Method;

use super::{ParamVec, UrlPattern, VersionConstraint};
use crate::middleware::Chain;

/// A registered route: method, URL pattern, version constraint and handler chain
///
/// Routes are created by [`Server::route`](crate::Server::route) and the verb
/// helpers. Besides the three match predicates a route only exposes data; it
/// performs no I/O.
#[derive(Clone)]
pub struct Route {
    name: String,
    method: Method,
    pattern: UrlPattern,
    versions: VersionConstraint,
    chain: Chain,
    /// Methods of every route sharing this URL shape, own method included.
    /// Maintained at registration/removal time for 405 reporting only.
    allowed_methods: Vec<Method>,
}

impl Route {
    pub(crate) fn new(
        name: String,
        method: Method,
        pattern: UrlPattern,
        versions: VersionConstraint,
        chain: Chain,
    ) -> Self {
        let allowed_methods = vec![method.clone()];
        Self {
            name,
            method,
            pattern,
            versions,
            chain,
            allowed_methods,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    /// The URL template as registered
    #[must_use]
    pub fn path(&self) -> &str {
        self.pattern.source()
    }

    #[must_use]
    pub fn versions(&self) -> &VersionConstraint {
        &self.versions
    }

    /// Effective chain: global units captured at registration, then the route's own
    #[must_use]
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Methods registered on structurally identical patterns, in registration order
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }

    pub(crate) fn allow_method(&mut self, method: &Method) {
        if !self.allowed_methods.contains(method) {
            self.allowed_methods.push(method.clone());
        }
    }

    pub(crate) fn set_allowed_methods(&mut self, methods: Vec<Method>) {
        self.allowed_methods = methods;
    }

    /// Path parameters if the URL pattern matches `path`
    #[must_use]
    pub fn matches_path(&self, path: &str) -> Option<ParamVec> {
        self.pattern.matches(path)
    }

    /// Exact method comparison
    ///
    /// OPTIONS requests with no OPTIONS route fall through to the
    /// method-mismatch outcome, where the dispatcher answers them with the
    /// aggregated `Allow` list.
    #[must_use]
    pub fn matches_method(&self, method: &Method) -> bool {
        self.method == method
    }

    /// True if the route is unconstrained or accepts one of `requested`
    #[must_use]
    pub fn matches_version(&self, requested: &[String]) -> bool {
        self.versions.matches(requested)
    }

    /// Same name, method and pattern text
    #[must_use]
    pub fn same_route(&self, other: &Route) -> bool {
        self.name == other.name && self.method == other.method && self.path() == other.path()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.pattern.source())
            .field("versions", &self.versions.versions())
            .field("chain", &self.chain)
            .field("allowed_methods", &self.allowed_methods)
            .finish()
    }
}

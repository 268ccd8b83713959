use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use bytes::Bytes;
use http::Method;
use tracing::{debug, error, info, info_span, Instrument};

use super::{Request, Response, RouteOptions};
use crate::config::ServerConfig;
use crate::content::Formatters;
use crate::dispatcher::{execute, ChainOutcome, Fallbacks};
use crate::error::{FallbackKind, HandlerError, RegistrationError, RoutingError};
use crate::middleware::{Chain, HandlerUnit};
use crate::router::{Resolution, Route, RouteKey, RouteTable, UrlPattern, VersionConstraint};

/// The routing and dispatch engine
///
/// Owns the route table, the pre-routing chain, the global chain prefix and
/// the fallback responders. Registration takes `&self`: writers are
/// serialized by an internal lock and publish copy-on-write snapshots, so a
/// `Server` behind an `Arc` can keep serving while routes change.
///
/// # Example
///
/// ```rust
/// use chainrouter::{sync_handler, Server, ServerConfig};
/// use http::StatusCode;
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let server = Server::new(ServerConfig::default());
/// server
///     .get("/hello/:name", sync_handler(|req, res| {
///         let name = req.param("name").unwrap_or("world").to_string();
///         res.send(StatusCode::OK, &json!({ "hello": name }))
///     }))
///     .unwrap();
///
/// let req = http::Request::get("/hello/ferris").body(bytes::Bytes::new()).unwrap();
/// let res = server.handle(req).await;
/// assert_eq!(res.status(), StatusCode::OK);
/// assert_eq!(&res.body()[..], br#"{"hello":"ferris"}"#);
/// # }
/// ```
pub struct Server {
    config: ServerConfig,
    formatters: Arc<Formatters>,
    routes: ArcSwap<RouteTable>,
    pre: ArcSwap<Chain>,
    /// Global chain prefix; the lock also serializes route table writers
    global: Mutex<Chain>,
    fallbacks: Fallbacks,
}

/// Route name derived from method, path and versions: `GET /users/:id` -> `getusersid`
fn derive_name(method: &Method, path: &str, versions: &[String]) -> String {
    let mut name = method.as_str().to_ascii_lowercase();
    name.extend(path.chars().filter(char::is_ascii_alphanumeric));
    for version in versions {
        name.extend(version.chars().filter(char::is_ascii_alphanumeric));
    }
    name
}

impl Server {
    /// Server negotiating over the built-in formatters
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self::with_formatters(config, Formatters::default())
    }

    /// Server negotiating only over `formatters`
    #[must_use]
    pub fn with_formatters(config: ServerConfig, formatters: Formatters) -> Self {
        info!(
            name = %config.name,
            formatters = ?formatters.acceptable(),
            range_versioning = config.range_versioning,
            strict_negotiation = config.strict_negotiation,
            "Server created"
        );
        Self {
            config,
            formatters: Arc::new(formatters),
            routes: ArcSwap::from_pointee(RouteTable::new()),
            pre: ArcSwap::from_pointee(Chain::new()),
            global: Mutex::new(Chain::new()),
            fallbacks: Fallbacks::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }

    /// Content types this server can produce, in preference order
    #[must_use]
    pub fn acceptable(&self) -> Vec<String> {
        self.formatters.acceptable()
    }

    /// Snapshot of the route table
    #[must_use]
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Route by name
    #[must_use]
    pub fn route_named(&self, name: &str) -> Option<Arc<Route>> {
        self.routes.load().get(name).map(Arc::clone)
    }

    fn lock_global(&self) -> std::sync::MutexGuard<'_, Chain> {
        self.global.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append units to the pre-routing chain
    ///
    /// Pre units run for every request before resolution. They may rewrite the
    /// path or version list but see no path parameters.
    pub fn pre(&self, units: impl Into<Chain>) {
        let _writer = self.lock_global();
        let mut chain = Chain::clone(&self.pre.load());
        chain.extend(units);
        debug!(pre_chain_len = chain.len(), "Pre-routing chain extended");
        self.pre.store(Arc::new(chain));
    }

    /// Append units to the global chain ("use")
    ///
    /// Only routes registered afterwards run them; existing routes keep the
    /// chain they captured at registration.
    pub fn add_middleware(&self, units: impl Into<Chain>) {
        let mut global = self.lock_global();
        global.extend(units);
        debug!(global_chain_len = global.len(), "Global chain extended");
    }

    /// Register a route
    ///
    /// The effective chain is the global chain as it stands now, followed by
    /// `units`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Pattern`] for a malformed URL template
    /// - [`RegistrationError::DuplicateName`] if the explicit name is taken
    /// - [`RegistrationError::InvalidVersion`] for an unparsable range constraint
    pub fn route(
        &self,
        method: Method,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        let options = options.into();
        let pattern = UrlPattern::compile(options.path())?;

        let versions: Vec<String> = match (
            options.route_versions(),
            &self.config.default_version,
        ) {
            ([], Some(default)) => vec![default.clone()],
            (explicit, _) => explicit.to_vec(),
        };
        let constraint = VersionConstraint::new(versions.iter(), self.config.range_versioning)?;

        let global = self.lock_global();
        let current = self.routes.load_full();

        let name = match options.route_name() {
            Some(explicit) if current.contains_name(explicit) => {
                return Err(RegistrationError::DuplicateName(explicit.to_string()));
            }
            Some(explicit) => explicit.to_string(),
            None => {
                let base = derive_name(&method, options.path(), &versions);
                let mut candidate = base.clone();
                let mut suffix = 1;
                while current.contains_name(&candidate) {
                    candidate = format!("{base}-{suffix}");
                    suffix += 1;
                }
                candidate
            }
        };

        let chain = global.concat(&units.into());
        let route = Route::new(name, method, pattern, constraint, chain);

        let mut table = RouteTable::clone(&current);
        let route = table.insert(route);
        self.routes.store(Arc::new(table));
        drop(global);

        info!(
            route_name = %route.name(),
            method = %route.method(),
            path = %route.path(),
            versions = ?route.versions().versions(),
            chain_len = route.chain().len(),
            "Route registered"
        );
        Ok(route)
    }

    pub fn get(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::GET, options, units)
    }

    pub fn put(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::PUT, options, units)
    }

    pub fn post(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::POST, options, units)
    }

    pub fn patch(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::PATCH, options, units)
    }

    pub fn del(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::DELETE, options, units)
    }

    pub fn head(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::HEAD, options, units)
    }

    /// Register an explicit OPTIONS route, replacing the synthesized `Allow` answer for its path
    pub fn opts(
        &self,
        options: impl Into<RouteOptions>,
        units: impl Into<Chain>,
    ) -> Result<Arc<Route>, RegistrationError> {
        self.route(Method::OPTIONS, options, units)
    }

    /// Remove the first route matching `key` (a name or a route)
    ///
    /// Returns whether a route was removed.
    pub fn remove_route<'a>(&self, key: impl Into<RouteKey<'a>>) -> bool {
        let key = key.into();
        let _writer = self.lock_global();
        let mut table = RouteTable::clone(&self.routes.load());
        let removed = table.remove(key).is_some();
        if removed {
            self.routes.store(Arc::new(table));
        } else {
            debug!(key = ?key, "No route to remove");
        }
        removed
    }

    /// Override the not-found responder (once)
    ///
    /// # Errors
    ///
    /// [`RegistrationError::FallbackAlreadySet`] on a second call.
    pub fn on_not_found(&self, unit: HandlerUnit) -> Result<(), RegistrationError> {
        self.fallbacks.set(FallbackKind::NotFound, unit)
    }

    /// Override the method-not-allowed responder (once)
    ///
    /// The override also answers OPTIONS requests for paths without an OPTIONS route.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::FallbackAlreadySet`] on a second call.
    pub fn on_method_not_allowed(&self, unit: HandlerUnit) -> Result<(), RegistrationError> {
        self.fallbacks.set(FallbackKind::MethodNotAllowed, unit)
    }

    /// Override the version-not-allowed responder (once)
    ///
    /// # Errors
    ///
    /// [`RegistrationError::FallbackAlreadySet`] on a second call.
    pub fn on_version_not_allowed(&self, unit: HandlerUnit) -> Result<(), RegistrationError> {
        self.fallbacks.set(FallbackKind::VersionNotAllowed, unit)
    }

    /// Dispatch an `http` request and produce the `http` response
    pub async fn handle(&self, req: http::Request<Bytes>) -> http::Response<Bytes> {
        self.dispatch(Request::from_http(req)).await.into_http()
    }

    /// Dispatch one request: pre chain, resolution, then route chain or fallback
    ///
    /// A chain that stalls, runs out of units without writing, or exceeds the
    /// configured timeout is answered 500. Only a request aborted through its
    /// [`AbortHandle`](crate::AbortHandle) comes back unsent.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let mut res = Response::for_request(
            &req,
            Arc::clone(&self.formatters),
            self.config.strict_negotiation,
        );
        let span = info_span!(
            "request",
            request_id = %req.id(),
            method = %req.method(),
            path = %req.path(),
        );

        let work = async {
            let outcome = match self.config.chain_timeout() {
                Some(limit) => tokio::time::timeout(limit, self.run(&mut req, &mut res))
                    .await
                    .ok(),
                None => Some(self.run(&mut req, &mut res).await),
            };
            self.finish(outcome, &req, &mut res);
        };
        work.instrument(span).await;

        res
    }

    async fn run(&self, req: &mut Request, res: &mut Response) -> ChainOutcome {
        let pre = self.pre.load_full();
        if !pre.is_empty() {
            match execute(pre.units(), req, res).await {
                ChainOutcome::Exhausted => {}
                stopped => return stopped,
            }
        }

        let resolution = {
            let table = self.routes.load();
            table.resolve(req.method(), req.path(), req.versions())
        };

        let err = match resolution {
            Resolution::Matched(matched) => {
                req.bind_route(matched.route.name(), matched.params);
                return execute(matched.route.chain().units(), req, res).await;
            }
            Resolution::NotFound => RoutingError::NotFound {
                method: req.method().clone(),
                path: req.path().to_string(),
            },
            Resolution::MethodNotAllowed(allowed) => RoutingError::MethodNotAllowed {
                method: req.method().clone(),
                path: req.path().to_string(),
                allowed,
            },
            Resolution::VersionNotAllowed(acceptable) => RoutingError::VersionNotAllowed {
                path: req.path().to_string(),
                requested: req.versions().to_vec(),
                acceptable,
            },
        };
        self.fallbacks.respond(err, req, res).await;
        if res.is_sent() {
            ChainOutcome::Completed { index: 0 }
        } else {
            ChainOutcome::Exhausted
        }
    }

    fn finish(&self, outcome: Option<ChainOutcome>, req: &Request, res: &mut Response) {
        let route = req.route_name().unwrap_or("-");
        match outcome {
            Some(ChainOutcome::Aborted { index }) => {
                debug!(route_name = %route, index, "Request aborted by transport");
                return;
            }
            _ if res.is_sent() => {}
            None => {
                error!(
                    route_name = %route,
                    timeout_ms = self.config.chain_timeout_ms,
                    "Handler chain timed out"
                );
            }
            Some(ChainOutcome::Stalled { index }) => {
                error!(
                    route_name = %route,
                    index,
                    "Handler chain stalled without a response"
                );
            }
            Some(other) => {
                error!(
                    route_name = %route,
                    outcome = ?other,
                    "Handler chain ended without a response"
                );
            }
        }
        if !res.is_sent() {
            let _ = res.send_error(&HandlerError::internal(
                "handler chain produced no response",
            ));
        }

        info!(
            route_name = %route,
            status = res.status().as_u16(),
            duration_us = req.received_at().elapsed().as_micros(),
            "Request completed"
        );
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("formatters", &self.formatters)
            .field("routes", &self.routes.load().len())
            .field("pre", &*self.pre.load())
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::sync_handler;
    use http::StatusCode;

    #[test]
    fn test_derive_name() {
        assert_eq!(derive_name(&Method::GET, "/users/:id", &[]), "getusersid");
        assert_eq!(
            derive_name(&Method::POST, "/x", &["1.0.0".to_string()]),
            "postx100"
        );
    }

    #[test]
    fn test_derived_names_are_unique() {
        let server = Server::new(ServerConfig::default());
        let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
        let a = server.get("/x", Arc::clone(&unit)).unwrap();
        let b = server.get("/x", unit).unwrap();
        assert_eq!(a.name(), "getx");
        assert_eq!(b.name(), "getx-1");
    }

    #[test]
    fn test_explicit_duplicate_name_is_rejected() {
        let server = Server::new(ServerConfig::default());
        let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
        server
            .get(RouteOptions::new("/a").name("same"), Arc::clone(&unit))
            .unwrap();
        let err = server
            .get(RouteOptions::new("/b").name("same"), unit)
            .unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateName("same".to_string()));
    }

    #[test]
    fn test_default_version_applies_to_unversioned_routes() {
        let config = ServerConfig {
            default_version: Some("1.0".to_string()),
            ..ServerConfig::default()
        };
        let server = Server::new(config);
        let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
        let defaulted = server.get("/a", Arc::clone(&unit)).unwrap();
        let explicit = server.get(RouteOptions::new("/b").version("2.0"), unit).unwrap();
        assert_eq!(defaulted.versions().versions(), &["1.0".to_string()]);
        assert_eq!(explicit.versions().versions(), &["2.0".to_string()]);
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let server = Server::new(ServerConfig::default());
        let unit = sync_handler(|_, res| res.send_status(StatusCode::OK));
        assert!(matches!(
            server.get("/a/*/b/*", unit),
            Err(RegistrationError::Pattern(_))
        ));
        assert!(server.routes().is_empty());
    }
}

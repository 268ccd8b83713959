use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::{Extensions, HeaderMap, Method};
use smallvec::SmallVec;

use crate::content::{parse_accept, MediaRange};
use crate::error::RoutingError;
use crate::ids::RequestId;
use crate::router::ParamVec;
use crate::router::ANY_VERSION;

/// Headers consulted, in order, for the client's acceptable versions
pub const VERSION_HEADERS: [&str; 2] = ["accept-version", "x-api-version"];

/// Inline capacity for the requested-version list
pub type VersionVec = SmallVec<[String; 4]>;

/// Cancellation flag shared between a request and its transport
///
/// The transport calls [`AbortHandle::abort`] when the connection drops; the
/// chain executor checks it before every unit.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-request context
///
/// Owned by one request for its whole lifetime. Path parameters and the
/// route name are only populated once a route has matched; the pre-routing
/// chain sees them empty.
#[derive(Debug)]
pub struct Request {
    id: RequestId,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: ParamVec,
    route_name: Option<String>,
    versions: VersionVec,
    accept: Vec<MediaRange>,
    routing_error: Option<RoutingError>,
    extensions: Extensions,
    abort: AbortHandle,
    received_at: Instant,
}

fn parse_versions(headers: &HeaderMap) -> VersionVec {
    let raw = VERSION_HEADERS
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()));
    let mut versions: VersionVec = raw
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if versions.is_empty() {
        versions.push(ANY_VERSION.to_string());
    }
    versions
}

impl Request {
    /// Build a request with no headers or body
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (uri.to_string(), None),
        };
        Self::from_parts(method, path, query, HeaderMap::new(), Bytes::new())
    }

    /// Build the context from an `http::Request` handed over by the transport
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        let path = parts.uri.path().to_string();
        let query = parts.uri.query().map(str::to_string);
        let mut req = Self::from_parts(parts.method, path, query, parts.headers, body);
        req.extensions = parts.extensions;
        req
    }

    fn from_parts(
        method: Method,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let accept = headers
            .get(http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(parse_accept)
            .unwrap_or_default();
        Self {
            id: RequestId::from_headers(&headers),
            versions: parse_versions(&headers),
            accept,
            method,
            path: if path.is_empty() { "/".to_string() } else { path },
            query,
            headers,
            body,
            params: ParamVec::new(),
            route_name: None,
            routing_error: None,
            extensions: Extensions::new(),
            abort: AbortHandle::default(),
            received_at: Instant::now(),
        }
    }

    /// Builder-style header insertion; recomputes the derived accept and version lists
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self.refresh_derived();
        self
    }

    /// Builder-style body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    fn refresh_derived(&mut self) {
        self.versions = parse_versions(&self.headers);
        self.accept = self
            .headers
            .get(http::header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(parse_accept)
            .unwrap_or_default();
        self.id = RequestId::from_headers(&self.headers);
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Rewrite the path. Only meaningful in the pre-routing chain.
    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// First value of a query-string parameter, percent-decoded
    ///
    /// Uses "first write wins": `?limit=10&limit=20` yields `10`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            if k != name {
                return None;
            }
            let plus_decoded = v.replace('+', " ");
            Some(match urlencoding::decode(&plus_decoded) {
                Ok(decoded) => Cow::Owned(decoded.into_owned()),
                Err(_) => Cow::Borrowed(v),
            })
        })
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Header value as a string (case-insensitive name per RFC 7230)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Path parameter by name
    ///
    /// Returns `None` before routing and for names the matched pattern does not bind.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Name of the matched route, once routing has succeeded
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    pub(crate) fn bind_route(&mut self, name: &str, params: ParamVec) {
        self.route_name = Some(name.to_string());
        self.params = params;
    }

    /// Client-acceptable versions in preference order; `["*"]` when none were sent
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    /// Replace the acceptable-version list (e.g. from a URL prefix in a pre handler)
    pub fn set_versions<I, S>(&mut self, versions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = versions.into_iter().map(Into::into).collect();
        if self.versions.is_empty() {
            self.versions.push(ANY_VERSION.to_string());
        }
    }

    /// Parsed `Accept` preferences, ordered by descending weight
    #[must_use]
    pub fn accept(&self) -> &[MediaRange] {
        &self.accept
    }

    /// The fallback outcome being answered, visible to fallback responders
    #[must_use]
    pub fn routing_error(&self) -> Option<&RoutingError> {
        self.routing_error.as_ref()
    }

    pub(crate) fn set_routing_error(&mut self, err: RoutingError) {
        self.routing_error = Some(err);
    }

    /// Typed per-request state for handler units
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Handle the transport keeps to cancel this request's chain
    #[must_use]
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.abort.is_aborted()
    }

    #[must_use]
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    #[test]
    fn test_from_http_splits_path_and_query() {
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("http://example.com/users/42?limit=10&limit=20&q=a+b%21")
            .header("accept", "text/plain")
            .body(Bytes::new())
            .unwrap();
        let req = Request::from_http(req);
        assert_eq!(req.path(), "/users/42");
        assert_eq!(req.query_param("limit").as_deref(), Some("10"));
        assert_eq!(req.query_param("q").as_deref(), Some("a b!"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.accept()[0].mime, mime::TEXT_PLAIN);
    }

    #[test]
    fn test_versions_default_to_any() {
        let req = Request::new(Method::GET, "/");
        assert_eq!(req.versions(), &["*".to_string()]);
    }

    #[test]
    fn test_versions_from_header() {
        let req = Request::new(Method::GET, "/").with_header(
            HeaderName::from_static("accept-version"),
            HeaderValue::from_static("2.0, 1.0"),
        );
        assert_eq!(req.versions(), &["2.0".to_string(), "1.0".to_string()]);
    }

    #[test]
    fn test_params_empty_before_routing() {
        let req = Request::new(Method::GET, "/users/1");
        assert!(req.params().is_empty());
        assert_eq!(req.param("id"), None);
        assert_eq!(req.route_name(), None);
    }

    #[test]
    fn test_abort_handle_is_shared() {
        let req = Request::new(Method::GET, "/");
        let handle = req.abort_handle();
        assert!(!req.is_aborted());
        handle.abort();
        assert!(req.is_aborted());
    }
}

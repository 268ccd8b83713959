//! # Error Kinds
//!
//! Every failure the routing core can report is a concrete type here:
//!
//! - [`PatternError`] - a URL template could not be compiled (registration time)
//! - [`RegistrationError`] - a route or fallback registration was rejected
//! - [`RoutingError`] - one of the three fallback outcomes (404 / 405 / version mismatch)
//! - [`NotAcceptableError`] - strict content negotiation found no formatter
//! - [`HandlerError`] - an application error raised by a handler unit
//!
//! Matching-phase errors never escape [`Server::handle`](crate::Server::handle);
//! they are converted into fallback outcomes. Chain errors are delivered to
//! [`Response::send_error`](crate::Response::send_error), which is the only place
//! an error is mapped to a status code and body.

use std::fmt;

use http::{Method, StatusCode};

/// URL template compilation error
///
/// Returned by [`UrlPattern::compile`](crate::router::UrlPattern::compile) and
/// surfaced through [`RegistrationError::Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The template was empty or did not start with `/`
    Empty,
    /// More than one wildcard segment was declared
    MultipleWildcards,
    /// A wildcard segment appeared before the last segment
    WildcardNotLast,
    /// A parameter token (`:name` / `{name}`) was malformed
    MalformedParam {
        /// The offending segment as written
        segment: String,
    },
    /// The same parameter name was bound twice in one template
    DuplicateParam {
        /// The repeated name
        name: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Empty => write!(f, "URL pattern must be non-empty and start with '/'"),
            PatternError::MultipleWildcards => {
                write!(f, "URL pattern may contain at most one wildcard")
            }
            PatternError::WildcardNotLast => {
                write!(f, "URL pattern wildcard must be the last segment")
            }
            PatternError::MalformedParam { segment } => {
                write!(
                    f,
                    "URL pattern has a malformed parameter token '{}'. \
                    Expected ':name' or '{{name}}' with name matching [A-Za-z_][A-Za-z0-9_]*",
                    segment
                )
            }
            PatternError::DuplicateParam { name } => {
                write!(f, "URL pattern binds parameter '{}' more than once", name)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Which fallback outcome a responder is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackKind {
    /// No route matched the path
    NotFound,
    /// The path matched but no route accepted the method
    MethodNotAllowed,
    /// Path and method matched but no route accepted the version
    VersionNotAllowed,
}

impl fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FallbackKind::NotFound => "NotFound",
            FallbackKind::MethodNotAllowed => "MethodNotAllowed",
            FallbackKind::VersionNotAllowed => "VersionNotAllowed",
        };
        f.write_str(name)
    }
}

/// Route or fallback registration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The URL template failed to compile
    Pattern(PatternError),
    /// An explicit route name is already taken
    DuplicateName(String),
    /// A version constraint could not be parsed (range versioning only)
    InvalidVersion(String),
    /// The fallback responder for this outcome was already overridden
    FallbackAlreadySet(FallbackKind),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Pattern(err) => write!(f, "invalid route pattern: {}", err),
            RegistrationError::DuplicateName(name) => {
                write!(f, "a route named '{}' is already registered", name)
            }
            RegistrationError::InvalidVersion(version) => {
                write!(f, "invalid version constraint '{}'", version)
            }
            RegistrationError::FallbackAlreadySet(kind) => {
                write!(f, "the {} responder can only be overridden once", kind)
            }
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::Pattern(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatternError> for RegistrationError {
    fn from(err: PatternError) -> Self {
        RegistrationError::Pattern(err)
    }
}

/// Fallback outcome of route resolution
///
/// Produced by the dispatcher when the route table yields no full match, and
/// handed to the matching fallback responder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route's URL pattern matched the path
    NotFound {
        /// Request method
        method: Method,
        /// Request path
        path: String,
    },
    /// Some routes matched the path, none accepted the method
    MethodNotAllowed {
        /// Request method
        method: Method,
        /// Request path
        path: String,
        /// Methods registered for this path, deduplicated, in registration order
        allowed: Vec<Method>,
    },
    /// Path and method matched, none accepted the requested version(s)
    VersionNotAllowed {
        /// Request path
        path: String,
        /// Versions the client declared acceptable
        requested: Vec<String>,
        /// Versions the matching routes would have accepted
        acceptable: Vec<String>,
    },
}

impl RoutingError {
    /// The fallback slot this outcome is delivered to
    #[must_use]
    pub fn kind(&self) -> FallbackKind {
        match self {
            RoutingError::NotFound { .. } => FallbackKind::NotFound,
            RoutingError::MethodNotAllowed { .. } => FallbackKind::MethodNotAllowed,
            RoutingError::VersionNotAllowed { .. } => FallbackKind::VersionNotAllowed,
        }
    }

    /// Value for an `Allow` header, if this is a method mismatch
    #[must_use]
    pub fn allow_header(&self) -> Option<String> {
        match self {
            RoutingError::MethodNotAllowed { allowed, .. } => Some(
                allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::NotFound { path, .. } => write!(f, "{} does not exist", path),
            RoutingError::MethodNotAllowed { method, path, .. } => {
                write!(f, "{} is not allowed on {}", method, path)
            }
            RoutingError::VersionNotAllowed {
                path,
                requested,
                acceptable,
            } => write!(
                f,
                "{} is not supported by {}; acceptable versions: {}",
                requested.join(", "),
                path,
                acceptable.join(", ")
            ),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Strict content negotiation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAcceptableError {
    /// The client's `Accept` header as received (empty if absent)
    pub accept: String,
    /// Types the server can produce, in server preference order
    pub supported: Vec<String>,
}

impl fmt::Display for NotAcceptableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server accepts: {}; client asked for: {}",
            self.supported.join(", "),
            self.accept
        )
    }
}

impl std::error::Error for NotAcceptableError {}

/// Application error raised by a handler unit
///
/// The core treats it as opaque: it is forwarded verbatim to
/// [`Response::send_error`](crate::Response::send_error), which renders
/// `status` and a `{"code", "message"}` body. Extra headers (e.g. `Allow`)
/// travel with the error so the renderer can emit them.
#[derive(Debug)]
pub struct HandlerError {
    status: StatusCode,
    code: String,
    message: String,
    headers: Vec<(http::HeaderName, String)>,
    source: Option<anyhow::Error>,
}

impl HandlerError {
    /// Create an error with an explicit status and machine-readable code
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            headers: Vec::new(),
            source: None,
        }
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BadRequest", message)
    }

    /// 401 Unauthorized
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", message)
    }

    /// 403 Forbidden
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden", message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "ResourceNotFound", message)
    }

    /// 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal", message)
    }

    /// Attach an extra response header rendered alongside the error body
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn headers(&self) -> &[(http::HeaderName, String)] {
        &self.headers
    }

    /// JSON body used by the default error renderer
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "code": self.code, "message": self.message })
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.code,
            self.status.as_u16(),
            self.message
        )
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

impl From<RoutingError> for HandlerError {
    fn from(err: RoutingError) -> Self {
        let message = err.to_string();
        match &err {
            RoutingError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "ResourceNotFound", message)
            }
            RoutingError::MethodNotAllowed { .. } => {
                let allow = err.allow_header().unwrap_or_default();
                Self::new(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", message)
                    .with_header(http::header::ALLOW, allow)
            }
            RoutingError::VersionNotAllowed { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "InvalidVersion", message)
            }
        }
    }
}

impl From<NotAcceptableError> for HandlerError {
    fn from(err: NotAcceptableError) -> Self {
        Self::new(StatusCode::NOT_ACCEPTABLE, "NotAcceptable", err.to_string())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string()).with_source(err)
    }
}

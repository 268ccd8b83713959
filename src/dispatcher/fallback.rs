use std::sync::OnceLock;

use http::header::ALLOW;
use http::{Method, StatusCode};
use tracing::debug;

use crate::error::{FallbackKind, HandlerError, RegistrationError, RoutingError};
use crate::middleware::{HandlerUnit, Next};
use crate::server::{Request, Response};

/// Per-server responders for the three routing fallback outcomes
///
/// Each outcome may be overridden exactly once. An override sees the outcome
/// through [`Request::routing_error`]; if it continues without writing a
/// response, the built-in responder answers instead.
#[derive(Default)]
pub struct Fallbacks {
    not_found: OnceLock<HandlerUnit>,
    method_not_allowed: OnceLock<HandlerUnit>,
    version_not_allowed: OnceLock<HandlerUnit>,
}

impl Fallbacks {
    fn slot(&self, kind: FallbackKind) -> &OnceLock<HandlerUnit> {
        match kind {
            FallbackKind::NotFound => &self.not_found,
            FallbackKind::MethodNotAllowed => &self.method_not_allowed,
            FallbackKind::VersionNotAllowed => &self.version_not_allowed,
        }
    }

    /// Install the override for `kind`
    ///
    /// # Errors
    ///
    /// [`RegistrationError::FallbackAlreadySet`] if an override is already installed.
    pub fn set(&self, kind: FallbackKind, unit: HandlerUnit) -> Result<(), RegistrationError> {
        self.slot(kind)
            .set(unit)
            .map_err(|_| RegistrationError::FallbackAlreadySet(kind))
    }

    #[must_use]
    pub fn get(&self, kind: FallbackKind) -> Option<&HandlerUnit> {
        self.slot(kind).get()
    }

    /// Answer a routing outcome: the override first (if any), then the default
    pub async fn respond(&self, err: RoutingError, req: &mut Request, res: &mut Response) {
        let kind = err.kind();
        req.set_routing_error(err.clone());

        if let Some(unit) = self.get(kind) {
            debug!(kind = %kind, unit = unit.name(), "Running fallback override");
            if let Next::Error(handler_err) = unit.call(req, res).await {
                let _ = res.send_error(&handler_err);
            }
            if res.is_sent() {
                return;
            }
        }
        default_response(&err, req, res);
    }
}

impl std::fmt::Debug for Fallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallbacks")
            .field("not_found", &self.not_found.get().is_some())
            .field(
                "method_not_allowed",
                &self.method_not_allowed.get().is_some(),
            )
            .field(
                "version_not_allowed",
                &self.version_not_allowed.get().is_some(),
            )
            .finish()
    }
}

/// Built-in answers: 404, 405 with `Allow` (bare 200 for OPTIONS), 400 with the acceptable versions
fn default_response(err: &RoutingError, req: &Request, res: &mut Response) {
    if let RoutingError::MethodNotAllowed { .. } = err {
        if req.method() == Method::OPTIONS {
            if let Some(allow) = err.allow_header() {
                res.set_header(ALLOW, &allow);
            }
            let _ = res.send_status(StatusCode::OK);
            return;
        }
    }
    let _ = res.send_error(&HandlerError::from(err.clone()));
}

use futures::future::BoxFuture;
use std::sync::Arc;

use tracing::info;

use super::{Handler, HandlerUnit, Next};
use crate::server::{Request, Response};

/// Logs each request that reaches it, then continues
///
/// The dispatcher already wraps every request in a `request` span carrying the
/// request id, so this unit only emits the event.
pub struct RequestLogger;

impl Handler for RequestLogger {
    fn call<'a>(&'a self, req: &'a mut Request, _res: &'a mut Response) -> BoxFuture<'a, Next> {
        info!(
            request_id = %req.id(),
            method = %req.method(),
            path = %req.path(),
            route = req.route_name().unwrap_or("-"),
            versions = ?req.versions(),
            "Request received"
        );
        Box::pin(futures::future::ready(Next::Continue))
    }

    fn name(&self) -> &str {
        "request_logger"
    }
}

/// Shared [`RequestLogger`] unit
#[must_use]
pub fn request_logger() -> HandlerUnit {
    Arc::new(RequestLogger)
}

use futures::future::BoxFuture;
use std::sync::Arc;

use tracing::debug;

use super::{Handler, HandlerUnit, Next};
use crate::server::{Request, Response};

/// Pre-routing unit that normalises the request path
///
/// Collapses runs of `/` and strips a trailing `/` (except for the root), so
/// `//users///42/` routes like `/users/42`.
pub struct SanitizePath;

pub(crate) fn sanitize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

impl Handler for SanitizePath {
    fn call<'a>(&'a self, req: &'a mut Request, _res: &'a mut Response) -> BoxFuture<'a, Next> {
        let clean = sanitize(req.path());
        if clean != req.path() {
            debug!(from = %req.path(), to = %clean, "Path sanitized");
            req.set_path(clean);
        }
        Box::pin(futures::future::ready(Next::Continue))
    }

    fn name(&self) -> &str {
        "sanitize_path"
    }
}

/// Shared [`SanitizePath`] unit, intended for [`Server::pre`](crate::Server::pre)
#[must_use]
pub fn sanitize_path() -> HandlerUnit {
    Arc::new(SanitizePath)
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("//users///42/"), "/users/42");
        assert_eq!(sanitize("/"), "/");
        assert_eq!(sanitize(""), "/");
        assert_eq!(sanitize("/a/b"), "/a/b");
    }
}

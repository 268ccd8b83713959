use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use mime::Mime;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::Request;
use crate::content::{negotiate, Formatter, Formatters, JsonFormatter, MediaRange};
use crate::error::{HandlerError, NotAcceptableError};
use crate::middleware::Next;

/// Response sink handed to every handler unit
///
/// Exactly one write is honoured per request: the first `send*` call marks
/// the response as sent and any later write is dropped with a warning. The
/// content type is negotiated on the first write (or on an explicit call to
/// [`Response::content_type`]) and cached.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
    content_type: Option<Mime>,
    formatters: Arc<Formatters>,
    accept: Vec<MediaRange>,
    strict: bool,
}

impl Response {
    /// Create a sink negotiating over `formatters` for the given preferences
    #[must_use]
    pub fn new(formatters: Arc<Formatters>, accept: Vec<MediaRange>, strict: bool) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
            content_type: None,
            formatters,
            accept,
            strict,
        }
    }

    /// Create the sink for a request
    #[must_use]
    pub fn for_request(req: &Request, formatters: Arc<Formatters>, strict: bool) -> Self {
        Self::new(formatters, req.accept().to_vec(), strict)
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Add or replace a header. Invalid values are logged and skipped.
    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(_) => warn!(header = %name, "Dropping invalid response header value"),
        }
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether a terminal response has been written
    #[must_use]
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// The negotiated content type, negotiating now if needed
    ///
    /// A `Content-Type` set explicitly by a handler wins when a formatter
    /// exists for it.
    ///
    /// # Errors
    ///
    /// [`NotAcceptableError`] under strict negotiation when nothing matches.
    pub fn content_type(&mut self) -> Result<&Mime, NotAcceptableError> {
        if self.content_type.is_none() {
            let explicit = self
                .header(CONTENT_TYPE.as_str())
                .and_then(|v| v.parse::<Mime>().ok())
                .filter(|m| self.formatters.get(m).is_some());
            let chosen = match explicit {
                Some(m) => m,
                None => negotiate(&self.formatters, &self.accept, self.strict)?,
            };
            self.content_type = Some(chosen);
        }
        match &self.content_type {
            Some(m) => Ok(m),
            None => Err(NotAcceptableError {
                accept: String::new(),
                supported: self.formatters.acceptable(),
            }),
        }
    }

    fn formatter_for(&self, content_type: &Mime) -> Arc<dyn Formatter> {
        match self.formatters.get(content_type) {
            Some(f) => Arc::clone(f),
            None => Arc::new(JsonFormatter),
        }
    }

    fn commit(&mut self, status: StatusCode, content_type: Option<&str>, body: Bytes) {
        self.status = status;
        if let Some(ct) = content_type {
            self.set_header(CONTENT_TYPE, ct);
        }
        self.set_header(CONTENT_LENGTH, &body.len().to_string());
        self.body = body;
        self.sent = true;
    }

    fn already_sent(&self, attempted: StatusCode) -> bool {
        if self.sent {
            warn!(
                status = self.status.as_u16(),
                attempted = attempted.as_u16(),
                "Response already sent; ignoring second write"
            );
        }
        self.sent
    }

    /// Serialize `body` with the negotiated formatter and write it
    ///
    /// Negotiation or formatting failures are rendered through
    /// [`send_error`](Self::send_error) instead. Always resolves to
    /// [`Next::Done`] so a handler can `return res.send(..)`.
    pub fn send(&mut self, status: StatusCode, body: &Value) -> Next {
        if self.already_sent(status) {
            return Next::Done;
        }
        let content_type = match self.content_type() {
            Ok(m) => m.clone(),
            Err(err) => return self.send_error(&HandlerError::from(err)),
        };
        match self.formatter_for(&content_type).format(body) {
            Ok(bytes) => {
                self.commit(status, Some(content_type.as_ref()), bytes);
                Next::Done
            }
            Err(err) => {
                error!(error = %err, "Response formatting failed");
                self.send_error(&HandlerError::internal(err.to_string()))
            }
        }
    }

    /// Write pre-serialized bytes with an explicit content type, bypassing negotiation
    pub fn send_raw(
        &mut self,
        status: StatusCode,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Next {
        if self.already_sent(status) {
            return Next::Done;
        }
        self.commit(status, Some(content_type), body.into());
        Next::Done
    }

    /// Write a bare status with an empty body
    pub fn send_status(&mut self, status: StatusCode) -> Next {
        if self.already_sent(status) {
            return Next::Done;
        }
        self.commit(status, None, Bytes::new());
        Next::Done
    }

    /// Error rendering path: status from the error, `{"code","message"}` body
    ///
    /// Errors are always rendered. If the negotiated formatter cannot express
    /// the body (or strict negotiation failed), JSON is used instead.
    pub fn send_error(&mut self, err: &HandlerError) -> Next {
        if self.already_sent(err.status()) {
            return Next::Done;
        }
        for (name, value) in err.headers() {
            self.set_header(name.clone(), value);
        }
        let body = err.to_body();
        let negotiated = self.content_type().ok().cloned();
        let formatted = negotiated.and_then(|m| {
            self.formatter_for(&m)
                .format(&body)
                .ok()
                .map(|bytes| (m, bytes))
        });
        let (content_type, bytes) = match formatted {
            Some(pair) => pair,
            None => {
                let bytes = JsonFormatter
                    .format(&body)
                    .unwrap_or_else(|_| Bytes::from_static(b"{}"));
                (mime::APPLICATION_JSON, bytes)
            }
        };
        debug!(
            status = err.status().as_u16(),
            code = err.code(),
            "Rendering error response"
        );
        self.commit(err.status(), Some(content_type.as_ref()), bytes);
        Next::Done
    }

    /// Convert into the `http` response handed back to the transport
    #[must_use]
    pub fn into_http(self) -> http::Response<Bytes> {
        let mut res = http::Response::new(self.body);
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use mime::Mime;
use serde_json::Value;

/// A body could not be serialized by the selected formatter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// Media type of the formatter that failed
    pub content_type: String,
    /// Why it failed
    pub reason: String,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot format response body as {}: {}",
            self.content_type, self.reason
        )
    }
}

impl std::error::Error for FormatError {}

/// Serializer for one media type
pub trait Formatter: Send + Sync + 'static {
    fn format(&self, body: &Value) -> Result<Bytes, FormatError>;
}

impl<F> Formatter for F
where
    F: Fn(&Value) -> Result<Bytes, FormatError> + Send + Sync + 'static,
{
    fn format(&self, body: &Value) -> Result<Bytes, FormatError> {
        self(body)
    }
}

/// `application/json`
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, body: &Value) -> Result<Bytes, FormatError> {
        serde_json::to_vec(body)
            .map(Bytes::from)
            .map_err(|e| FormatError {
                content_type: mime::APPLICATION_JSON.to_string(),
                reason: e.to_string(),
            })
    }
}

/// `text/plain`: strings verbatim, anything else as JSON text
pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format(&self, body: &Value) -> Result<Bytes, FormatError> {
        match body {
            Value::String(s) => Ok(Bytes::from(s.clone())),
            Value::Null => Ok(Bytes::new()),
            other => Ok(Bytes::from(other.to_string())),
        }
    }
}

/// `application/octet-stream`: only strings (as raw bytes) are representable
pub struct BinaryFormatter;

impl Formatter for BinaryFormatter {
    fn format(&self, body: &Value) -> Result<Bytes, FormatError> {
        match body {
            Value::String(s) => Ok(Bytes::from(s.clone())),
            Value::Null => Ok(Bytes::new()),
            _ => Err(FormatError {
                content_type: mime::APPLICATION_OCTET_STREAM.to_string(),
                reason: "only string bodies can be sent as octet-stream".into(),
            }),
        }
    }
}

/// Formatters every server falls back to, in preference order
pub(crate) fn builtin() -> Vec<(Mime, Arc<dyn Formatter>)> {
    vec![
        (mime::APPLICATION_JSON, Arc::new(JsonFormatter) as Arc<dyn Formatter>),
        (mime::TEXT_PLAIN, Arc::new(TextFormatter) as Arc<dyn Formatter>),
        (
            mime::APPLICATION_OCTET_STREAM,
            Arc::new(BinaryFormatter) as Arc<dyn Formatter>,
        ),
    ]
}

/// Ordered table of response formatters keyed by media type
///
/// Registration order is the server's preference order and breaks every
/// negotiation tie. [`Formatters::default`] holds the built-in JSON, text and
/// octet-stream formatters; a table built with [`Formatters::empty`] negotiates
/// only over what is registered into it.
#[derive(Clone)]
pub struct Formatters {
    entries: Vec<(Mime, Arc<dyn Formatter>)>,
}

impl Default for Formatters {
    fn default() -> Self {
        Self { entries: builtin() }
    }
}

impl fmt::Debug for Formatters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(m, _)| m.essence_str()))
            .finish()
    }
}

fn same_type(a: &Mime, b: &Mime) -> bool {
    a.type_() == b.type_() && a.subtype() == b.subtype()
}

impl Formatters {
    /// A table with no formatters registered
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register (or replace in place) the formatter for a media type
    ///
    /// # Errors
    ///
    /// Returns the `mime` parse error if `content_type` is not a valid media type.
    pub fn register(
        &mut self,
        content_type: &str,
        formatter: impl Formatter,
    ) -> Result<&mut Self, mime::FromStrError> {
        let key: Mime = content_type.parse()?;
        let formatter: Arc<dyn Formatter> = Arc::new(formatter);
        match self.entries.iter_mut().find(|(m, _)| same_type(m, &key)) {
            Some(entry) => entry.1 = formatter,
            None => self.entries.push((key, formatter)),
        }
        Ok(self)
    }

    /// Builder-style [`register`](Self::register)
    ///
    /// # Errors
    ///
    /// Returns the `mime` parse error if `content_type` is not a valid media type.
    pub fn with(
        mut self,
        content_type: &str,
        formatter: impl Formatter,
    ) -> Result<Self, mime::FromStrError> {
        self.register(content_type, formatter)?;
        Ok(self)
    }

    /// Formatter registered for exactly this type/subtype
    #[must_use]
    pub fn get(&self, content_type: &Mime) -> Option<&Arc<dyn Formatter>> {
        self.entries
            .iter()
            .find(|(m, _)| same_type(m, content_type))
            .map(|(_, f)| f)
    }

    /// Registered types in server preference order
    pub fn types(&self) -> impl Iterator<Item = &Mime> {
        self.entries.iter().map(|(m, _)| m)
    }

    /// The first-registered type, used whenever negotiation falls back
    #[must_use]
    pub fn default_type(&self) -> Option<&Mime> {
        self.entries.first().map(|(m, _)| m)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Types the server can produce: declared formatters first, then any
    /// built-in fallback not already declared
    #[must_use]
    pub fn acceptable(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .entries
            .iter()
            .map(|(m, _)| m.essence_str().to_string())
            .collect();
        for (m, _) in builtin() {
            let essence = m.essence_str().to_string();
            if !types.contains(&essence) {
                types.push(essence);
            }
        }
        types
    }
}

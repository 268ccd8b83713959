//! URL template compilation and matching
//!
//! A template is split into `/`-separated segments, each of which is one of:
//!
//! - a literal (`users`) matched byte-for-byte, case-sensitive
//! - a named parameter (`:id` or `{id}`) consuming exactly one non-empty path segment
//! - a trailing wildcard (`*` or `*rest`) consuming every remaining segment, including none
//!
//! Matching walks template and path segments pairwise. No regex is involved and
//! no segment is ever partially matched. Parameter values are percent-decoded
//! individually after a successful match; a wildcard residual keeps encoded
//! slashes as `%2F`.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::PatternError;

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch path.
///
/// Param names are `Arc<str>` shared with the compiled pattern, values are
/// per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Name under which an anonymous `*` wildcard binds its residual path
pub const WILDCARD_PARAM: &str = "*";

static PARAM_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Failed to compile param-name regex")
});

fn is_valid_param_name(name: &str) -> bool {
    PARAM_NAME.is_match(name)
}

/// One compiled template segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly
    Literal(String),
    /// Binds one path segment under the given name
    Param(Arc<str>),
    /// Binds all remaining segments under the given name
    Wildcard(Arc<str>),
}

/// A compiled URL template
///
/// Produced once at route registration and immutable afterwards.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    segments: Vec<Segment>,
}

/// Split a path into segments, dropping the leading `/` and one trailing `/`.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    // "/" and "" have zero segments
    let empty = trimmed.is_empty();
    trimmed.split('/').filter(move |_| !empty)
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| raw.to_string())
}

impl UrlPattern {
    /// Compile a URL template
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for an empty template, more than one wildcard,
    /// a wildcard that is not the last segment, a malformed parameter token or
    /// a parameter name bound twice.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chainrouter::router::UrlPattern;
    ///
    /// let pattern = UrlPattern::compile("/users/:id/files/*path").unwrap();
    /// let params = pattern.matches("/users/42/files/a/b.txt").unwrap();
    /// assert_eq!(params[0].1, "42");
    /// assert_eq!(params[1].1, "a/b.txt");
    /// ```
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::Empty);
        }

        let raw: Vec<&str> = split_path(pattern).collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut names: Vec<Arc<str>> = Vec::new();
        let mut wildcard_seen = false;

        for (idx, seg) in raw.iter().enumerate() {
            let compiled = if let Some(rest) = seg.strip_prefix('*') {
                if wildcard_seen {
                    return Err(PatternError::MultipleWildcards);
                }
                wildcard_seen = true;
                let name = if rest.is_empty() { WILDCARD_PARAM } else { rest };
                if rest.contains('*') {
                    return Err(PatternError::MultipleWildcards);
                }
                if name != WILDCARD_PARAM && !is_valid_param_name(name) {
                    return Err(PatternError::MalformedParam {
                        segment: (*seg).to_string(),
                    });
                }
                Segment::Wildcard(Arc::from(name))
            } else if let Some(name) = seg.strip_prefix(':') {
                Self::param_segment(seg, name)?
            } else if seg.starts_with('{') || seg.ends_with('}') {
                let name = seg
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .ok_or_else(|| PatternError::MalformedParam {
                        segment: (*seg).to_string(),
                    })?;
                Self::param_segment(seg, name)?
            } else if seg.contains(|c: char| matches!(c, '{' | '}' | '*')) {
                return Err(PatternError::MalformedParam {
                    segment: (*seg).to_string(),
                });
            } else {
                Segment::Literal((*seg).to_string())
            };

            if wildcard_seen && idx + 1 != raw.len() {
                // A second wildcard later on is reported before the ordering problem
                if raw[idx + 1..].iter().any(|s| s.starts_with('*')) {
                    return Err(PatternError::MultipleWildcards);
                }
                return Err(PatternError::WildcardNotLast);
            }

            if let Segment::Param(name) | Segment::Wildcard(name) = &compiled {
                if names.iter().any(|n| n == name) {
                    return Err(PatternError::DuplicateParam {
                        name: name.to_string(),
                    });
                }
                names.push(Arc::clone(name));
            }

            segments.push(compiled);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    fn param_segment(segment: &str, name: &str) -> Result<Segment, PatternError> {
        if is_valid_param_name(name) {
            Ok(Segment::Param(Arc::from(name)))
        } else {
            Err(PatternError::MalformedParam {
                segment: segment.to_string(),
            })
        }
    }

    /// The template text this pattern was compiled from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the pattern ends in a wildcard
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Parameter names in template order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(n) | Segment::Wildcard(n) => Some(n.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete request path
    ///
    /// Returns the bound parameters on success, `None` otherwise. Parameters
    /// are returned in template order with percent-escapes decoded.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<ParamVec> {
        let mut params = ParamVec::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => {
                    if parts.next()? != lit.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.next()?;
                    if value.is_empty() {
                        return None;
                    }
                    params.push((Arc::clone(name), decode(value)));
                }
                Segment::Wildcard(name) => {
                    // Decoded per segment; a decoded `/` is re-encoded as `%2F`
                    let rest: Vec<String> = parts
                        .by_ref()
                        .map(|seg| decode(seg).replace('/', "%2F"))
                        .collect();
                    params.push((Arc::clone(name), rest.join("/")));
                    return Some(params);
                }
            }
        }

        // Without a wildcard the segment counts must agree
        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Structural equality: same literals, parameters and wildcard in the same
    /// positions. Parameter names are ignored.
    #[must_use]
    pub fn same_shape(&self, other: &UrlPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| match (a, b) {
                    (Segment::Literal(x), Segment::Literal(y)) => x == y,
                    (Segment::Param(_), Segment::Param(_)) => true,
                    (Segment::Wildcard(_), Segment::Wildcard(_)) => true,
                    _ => false,
                })
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

use mime::Mime;
use tracing::debug;

use super::Formatters;
use crate::error::NotAcceptableError;

/// One entry of a parsed `Accept` header
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub mime: Mime,
    /// Quality weight in `0.0..=1.0`; `0` means "not acceptable"
    pub q: f32,
}

impl MediaRange {
    /// How specifically this range names `target`, or `None` if it does not match.
    /// `type/subtype` = 2, `type/*` = 1, `*/*` = 0.
    #[must_use]
    pub fn specificity_for(&self, target: &Mime) -> Option<u8> {
        let range_type = self.mime.type_();
        let range_sub = self.mime.subtype();
        if range_type == mime::STAR && range_sub == mime::STAR {
            Some(0)
        } else if range_type == target.type_() && range_sub == mime::STAR {
            Some(1)
        } else if range_type == target.type_() && range_sub == target.subtype() {
            Some(2)
        } else {
            None
        }
    }
}

/// Parse an `Accept` header into media ranges ordered by descending `q`
///
/// Entries that do not parse are skipped. Equal weights keep header order.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<Mime>().ok())
        .map(|mime| {
            let q = mime
                .get_param("q")
                .and_then(|v| v.as_str().parse::<f32>().ok())
                .map(|q| q.clamp(0.0, 1.0))
                .unwrap_or(1.0);
            MediaRange { mime, q }
        })
        .collect();
    ranges.sort_by(|a, b| b.q.total_cmp(&a.q));
    ranges
}

/// Select the response media type
///
/// For every server formatter, the most specific client range that names it
/// supplies its weight. The formatter with the best `(q, specificity)` wins;
/// ties go to the formatter registered first. With no client preference, or
/// none that matches, the first registered formatter is used unless `strict`
/// is set, in which case [`NotAcceptableError`] is returned.
///
/// # Errors
///
/// Only in strict mode, when no formatter satisfies any client preference.
pub fn negotiate(
    formatters: &Formatters,
    accept: &[MediaRange],
    strict: bool,
) -> Result<Mime, NotAcceptableError> {
    let fallback = formatters
        .default_type()
        .cloned()
        .unwrap_or(mime::APPLICATION_JSON);

    if accept.is_empty() {
        return Ok(fallback);
    }

    let mut best: Option<(&Mime, f32, u8)> = None;
    for candidate in formatters.types() {
        let mut chosen: Option<(u8, f32)> = None;
        for range in accept {
            if let Some(spec) = range.specificity_for(candidate) {
                if chosen.map_or(true, |(s, _)| spec > s) {
                    chosen = Some((spec, range.q));
                }
            }
        }
        let Some((spec, q)) = chosen else { continue };
        if q <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, bq, bs)| (q, spec) > (bq, bs)) {
            best = Some((candidate, q, spec));
        }
    }

    match best {
        Some((mime, q, spec)) => {
            debug!(content_type = %mime, q, specificity = spec, "Content type negotiated");
            Ok(mime.clone())
        }
        None if strict => Err(NotAcceptableError {
            accept: accept
                .iter()
                .map(|r| r.mime.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            supported: formatters.acceptable(),
        }),
        None => {
            debug!(content_type = %fallback, "No acceptable formatter, using default");
            Ok(fallback)
        }
    }
}

//! Route version constraints
//!
//! A constraint is a set of version strings attached to a route. Empty means
//! the route serves every version. Requests declare an ordered list of
//! acceptable versions (`accept-version: 2.0, 1.0`), where `*` accepts anything.
//!
//! In exact mode a request version matches when it equals one of the route's
//! strings. In range mode both sides are interpreted with `semver`: a concrete
//! request version must satisfy one of the route's requirements (`^1.2.0`), or
//! a request range (`~1`) must be satisfied by one of the route's concrete
//! versions. Partial versions such as `1` or `1.2` are padded with zeros.

use semver::{Version, VersionReq};

use crate::error::RegistrationError;

/// Version that matches any constraint
pub const ANY_VERSION: &str = "*";

#[derive(Debug, Clone)]
struct RangeEntry {
    req: VersionReq,
    version: Option<Version>,
}

/// Compiled version constraint of a route
#[derive(Debug, Clone, Default)]
pub struct VersionConstraint {
    raw: Vec<String>,
    ranges: Option<Vec<RangeEntry>>,
}

/// Parse `1`, `1.2` or `1.2.3` (optionally `v`-prefixed) as a full semver version
pub(crate) fn parse_loose_version(input: &str) -> Option<Version> {
    let trimmed = input.trim().trim_start_matches('v');
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut nums = [0u64; 3];
    for (slot, part) in nums.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(Version::new(nums[0], nums[1], nums[2]))
}

impl VersionConstraint {
    /// Constraint that accepts every version
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Compile a set of version strings
    ///
    /// # Errors
    ///
    /// In range mode every string must parse as a semver requirement, otherwise
    /// [`RegistrationError::InvalidVersion`] is returned.
    pub fn new<I, S>(versions: I, range_mode: bool) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut raw: Vec<String> = Vec::new();
        for v in versions {
            let v = v.into().trim().to_string();
            if !v.is_empty() && !raw.contains(&v) {
                raw.push(v);
            }
        }

        let ranges = if range_mode {
            let mut entries = Vec::with_capacity(raw.len());
            for v in &raw {
                let req = VersionReq::parse(v.trim_start_matches('v'))
                    .map_err(|_| RegistrationError::InvalidVersion(v.clone()))?;
                entries.push(RangeEntry {
                    req,
                    version: parse_loose_version(v),
                });
            }
            Some(entries)
        } else {
            None
        };

        Ok(Self { raw, ranges })
    }

    /// Whether the constraint is empty (matches any version)
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.raw.is_empty()
    }

    /// Version strings as registered
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.raw
    }

    /// True iff at least one requested version falls inside the constraint
    #[must_use]
    pub fn matches(&self, requested: &[String]) -> bool {
        if self.raw.is_empty() {
            return true;
        }
        requested.iter().any(|r| self.matches_one(r))
    }

    fn matches_one(&self, requested: &str) -> bool {
        let requested = requested.trim();
        if requested == ANY_VERSION {
            return true;
        }
        match &self.ranges {
            None => self.raw.iter().any(|v| v == requested),
            Some(entries) => {
                if let Some(version) = parse_loose_version(requested) {
                    return entries.iter().any(|e| e.req.matches(&version));
                }
                match VersionReq::parse(requested.trim_start_matches('v')) {
                    Ok(req) => entries
                        .iter()
                        .filter_map(|e| e.version.as_ref())
                        .any(|v| req.matches(v)),
                    Err(_) => false,
                }
            }
        }
    }
}

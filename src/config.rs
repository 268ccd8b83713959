//! # Server Configuration Module
//!
//! [`ServerConfig`] carries the server-wide switches that affect routing and
//! dispatch. It can be built programmatically, loaded from environment
//! variables, or parsed from TOML.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `CHAINROUTER_NAME` | `name` | `chainrouter` |
//! | `CHAINROUTER_DEFAULT_VERSION` | `default_version` | none |
//! | `CHAINROUTER_RANGE_VERSIONING` | `range_versioning` | `false` |
//! | `CHAINROUTER_STRICT_NEGOTIATION` | `strict_negotiation` | `false` |
//! | `CHAINROUTER_CHAIN_TIMEOUT_MS` | `chain_timeout_ms` | none |
//!
//! Invalid values are ignored and the default is kept.
//!
//! ## Usage
//!
//! ```rust
//! use chainrouter::ServerConfig;
//!
//! let config = ServerConfig::from_toml_str(r#"
//!     name = "pets"
//!     default_version = "1.0.0"
//!     range_versioning = true
//!     chain_timeout_ms = 5000
//! "#).unwrap();
//! assert_eq!(config.name, "pets");
//! assert_eq!(config.chain_timeout().unwrap().as_millis(), 5000);
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default server name
pub const DEFAULT_NAME: &str = "chainrouter";

/// Server-wide routing and dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Name reported by [`Server::name`](crate::Server::name)
    pub name: String,
    /// Version constraint applied to routes registered without one
    pub default_version: Option<String>,
    /// Interpret version constraints as semver ranges instead of exact strings
    pub range_versioning: bool,
    /// Answer 406 instead of falling back to the default formatter
    pub strict_negotiation: bool,
    /// Completion timeout for one request's chains, in milliseconds
    pub chain_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            default_version: None,
            range_versioning: false,
            strict_negotiation: false,
            chain_timeout_ms: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(name) = lookup("CHAINROUTER_NAME").filter(|v| !v.trim().is_empty()) {
            config.name = name;
        }
        config.default_version =
            lookup("CHAINROUTER_DEFAULT_VERSION").filter(|v| !v.trim().is_empty());
        let range = lookup("CHAINROUTER_RANGE_VERSIONING");
        if let Some(flag) = range.as_deref().and_then(parse_bool) {
            config.range_versioning = flag;
        }
        let strict = lookup("CHAINROUTER_STRICT_NEGOTIATION");
        if let Some(flag) = strict.as_deref().and_then(parse_bool) {
            config.strict_negotiation = flag;
        }
        config.chain_timeout_ms = lookup("CHAINROUTER_CHAIN_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0);
        config
    }

    /// Parse configuration from a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, unknown keys or mistyped values.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("invalid server configuration")
    }

    /// The chain completion timeout, if configured
    #[must_use]
    pub fn chain_timeout(&self) -> Option<Duration> {
        self.chain_timeout_ms.map(Duration::from_millis)
    }
}

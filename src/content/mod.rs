//! # Content Negotiation
//!
//! Responses carry a `serde_json::Value` body that is serialized by a
//! [`Formatter`] chosen from the server's ordered [`Formatters`] table. The
//! choice is made lazily, on the first response write, from the request's
//! `Accept` preferences (see [`negotiate`]).

mod formatter;
mod negotiate;

pub use self::formatter::{
    BinaryFormatter, FormatError, Formatter, Formatters, JsonFormatter, TextFormatter,
};
pub use self::negotiate::{negotiate, parse_accept, MediaRange};

//! # Handler Units
//!
//! A route, the global chain and the pre-routing chain are all flat
//! [`Chain`]s of [`Handler`] units. Each unit resolves to a [`Next`] signal
//! telling the executor whether to continue, abort with an error, or stop
//! because a response was written.
//!
//! Closures become units through [`handler`] (async) and [`sync_handler`].
//! A few built-in units ship with the crate:
//!
//! - [`request_logger`] - logs every request entering the chain
//! - [`sanitize_path`] - pre-routing unit that collapses duplicate and trailing slashes

mod core;
mod logger;
mod sanitize;

pub use self::core::{handler, sync_handler, Chain, Handler, HandlerUnit, Next};
pub use self::logger::{request_logger, RequestLogger};
pub use self::sanitize::{sanitize_path, SanitizePath};

//! # Dispatcher Module
//!
//! The dispatcher module runs handler chains and answers fallback outcomes.
//!
//! ## Overview
//!
//! - [`execute`] runs a flat chain of handler units strictly in order. Each
//!   unit resolves to a [`Next`](crate::Next) signal: continue, abort with an
//!   error (rendered by the response's error path), or stop because a response
//!   was written.
//! - [`Fallbacks`] holds the per-server, set-once overrides for the not-found,
//!   method-not-allowed and version-not-allowed outcomes, plus the default
//!   responders used when no override is installed.
//!
//! ## Request Flow
//!
//! 1. The server runs the pre-routing chain through [`execute`]
//! 2. The route table resolves the request
//! 3. A full match runs the route's effective chain through [`execute`]
//! 4. Anything else is delivered to the matching fallback responder
//!
//! ## Suspension and Cancellation
//!
//! Units are async: a unit awaiting I/O suspends only its own request. The
//! executor checks the request's [`AbortHandle`](crate::AbortHandle) before
//! each unit and stops early once the transport has given up on the request.
//! Dropping the dispatch future has the same effect.

mod core;
mod fallback;

pub use self::core::{execute, ChainOutcome};
pub use self::fallback::Fallbacks;

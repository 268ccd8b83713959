//! # Server Module
//!
//! The server module holds the request context, the response sink and the
//! [`Server`] that ties routing, chains and fallbacks together.
//!
//! ## Key Components
//!
//! - [`Server`] - route registration, pre/global chains, fallback overrides and dispatch
//! - [`Request`] - per-request context (method, path, headers, params, versions, accept)
//! - [`Response`] - single-write response sink with lazy content negotiation
//! - [`RouteOptions`] - path, name and versions for a registration call
//! - [`AbortHandle`] - lets the transport cancel an in-flight chain
//!
//! ## Transport Boundary
//!
//! The server does not own a listener. A transport hands each request over as
//! an `http::Request<Bytes>` through [`Server::handle`] (or builds a
//! [`Request`] itself to keep its [`AbortHandle`]) and writes back the
//! returned `http::Response<Bytes>`:
//!
//! ```rust
//! use chainrouter::{Request, Server, ServerConfig};
//! use http::Method;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let server = Server::new(ServerConfig::default());
//! let req = Request::new(Method::GET, "/missing");
//! let abort = req.abort_handle();
//! let res = server.dispatch(req).await;
//! assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
//! # let _ = abort;
//! # }
//! ```

mod core;
mod options;
mod request;
mod response;

pub use self::core::Server;
pub use self::options::RouteOptions;
pub use self::request::{AbortHandle, Request, VersionVec, VERSION_HEADERS};
pub use self::response::Response;

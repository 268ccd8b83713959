//! # Router Module
//!
//! The router module compiles URL templates and resolves requests against an
//! ordered table of routes.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling URL templates (`/users/:id`, `/users/{id}`, `/files/*path`) into [`UrlPattern`]s
//! - Holding routes in registration order, which is also match priority
//! - Matching path, method and version independently and aggregating partial
//!   matches into fallback outcomes (404 / 405 / version mismatch)
//! - Maintaining, per route, the methods registered on structurally identical
//!   patterns so 405 responses can list them
//!
//! ## Architecture
//!
//! 1. **Compilation**: at registration the template is split into literal,
//!    parameter and wildcard segments; malformed templates are rejected with
//!    [`PatternError`](crate::PatternError).
//!
//! 2. **Matching**: for each request, [`RouteTable::resolve`] walks the
//!    routes once, in order, and returns a [`Resolution`].
//!
//! ## Example
//!
//! ```rust
//! use chainrouter::{sync_handler, Next, Server, ServerConfig};
//! use chainrouter::router::Resolution;
//! use http::Method;
//!
//! let server = Server::new(ServerConfig::default());
//! server.get("/users/:id", sync_handler(|_, _| Next::Continue)).unwrap();
//! server.post("/users/:id", sync_handler(|_, _| Next::Continue)).unwrap();
//!
//! let table = server.routes();
//! let any = vec!["*".to_string()];
//! match table.resolve(&Method::DELETE, "/users/7", &any) {
//!     Resolution::MethodNotAllowed(allowed) => {
//!         assert_eq!(allowed, vec![Method::GET, Method::POST]);
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Performance
//!
//! Resolution is a single O(n) scan over the routes with no allocation for
//! routes whose path does not match; parameters are stored inline for up to
//! [`MAX_INLINE_PARAMS`] values.

mod pattern;
mod route;
mod table;
mod version;

pub use self::pattern::{ParamVec, Segment, UrlPattern, MAX_INLINE_PARAMS, WILDCARD_PARAM};
pub use self::route::Route;
pub use self::table::{Resolution, RouteKey, RouteMatch, RouteTable};
pub use self::version::{VersionConstraint, ANY_VERSION};

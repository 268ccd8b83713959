//! # chainrouter
//!
//! **chainrouter** is an ordered, middleware-chained HTTP request router. For
//! every inbound request it decides which chain of handler units runs,
//! enforces method and version compatibility, and negotiates the response
//! representation.
//!
//! ## Overview
//!
//! Routes bind an HTTP method, a URL template, an optional version constraint
//! and an ordered handler chain. Registration order is match priority: the
//! first route whose path, method and version all match wins. Partial matches
//! are not discarded; they are aggregated into the allowed-method and
//! acceptable-version sets that drive the 405 and version-mismatch answers.
//!
//! ## Architecture
//!
//! - **[`router`]** - URL patterns, version constraints, routes and the ordered route table
//! - **[`middleware`]** - handler units, the [`Next`] signal and flat [`Chain`]s
//! - **[`dispatcher`]** - the chain executor and the fallback responders
//! - **[`server`]** - the [`Server`], the [`Request`] context and the [`Response`] sink
//! - **[`content`]** - formatters and `Accept` negotiation
//! - **[`config`]** - [`ServerConfig`] from code, environment or TOML
//! - **[`telemetry`]** - `tracing` subscriber setup
//! - **[`error`]** - pattern, registration, routing, negotiation and handler errors
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Transport
//!     participant Server
//!     participant Pre as Pre Chain
//!     participant Table as RouteTable
//!     participant Chain as Route Chain
//!     participant Fallback
//!     participant Negotiator
//!
//!     Transport->>Server: http::Request<Bytes>
//!     Server->>Pre: execute(pre units)
//!     alt a pre unit errors or responds
//!         Pre-->>Transport: response (no routing)
//!     end
//!     Server->>Table: resolve(method, path, versions)
//!     alt full match
//!         Table-->>Server: Route + params
//!         Server->>Chain: execute(global prefix + route units)
//!         Chain->>Negotiator: res.send(status, body)
//!     else partial or no match
//!         Table-->>Server: NotFound / MethodNotAllowed / VersionNotAllowed
//!         Server->>Fallback: override or default responder
//!     end
//!     Server-->>Transport: http::Response<Bytes>
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use chainrouter::{
//!     handler, request_logger, sync_handler, HandlerError, Next, Server, ServerConfig,
//! };
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let server = Server::new(ServerConfig::default());
//! server.add_middleware(request_logger());
//! server.add_middleware(sync_handler(|req, _| {
//!     match req.header("authorization") {
//!         Some(_) => Next::Continue,
//!         None => Next::Error(HandlerError::unauthorized("missing credentials")),
//!     }
//! }));
//! server
//!     .get("/pets/:id", handler(|req, res| {
//!         Box::pin(async move {
//!             let id = req.param("id").unwrap_or_default().to_string();
//!             res.send(StatusCode::OK, &json!({ "id": id }))
//!         })
//!     }))
//!     .unwrap();
//!
//! let req = http::Request::builder()
//!     .method(Method::GET)
//!     .uri("/pets/7")
//!     .body(bytes::Bytes::new())
//!     .unwrap();
//! let res = server.handle(req).await;
//! assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The route table and the pre chain are published as copy-on-write snapshots
//! through `arc-swap`. A resolution in progress always sees one consistent
//! table, and any number of requests can be dispatched concurrently against
//! a shared `Arc<Server>`.

pub mod config;
pub mod content;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod router;
pub mod server;
pub mod telemetry;

pub use config::ServerConfig;
pub use content::{Formatter, Formatters};
pub use error::{
    FallbackKind, HandlerError, NotAcceptableError, PatternError, RegistrationError, RoutingError,
};
pub use ids::RequestId;
pub use middleware::{
    handler, request_logger, sanitize_path, sync_handler, Chain, Handler, HandlerUnit, Next,
};
pub use router::{Route, RouteKey, RouteTable};
pub use server::{AbortHandle, Request, Response, RouteOptions, Server};

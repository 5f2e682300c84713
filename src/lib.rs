//! # roster
//!
//! A tiny HTTP service: an ordered-rule router in front of a JSON-file record
//! store.
//!
//! - **Routing**: rules are `(method, template, handler)` triples tried in
//!   registration order; the first match wins. Templates use `/literal/:param`
//!   syntax and are compiled into anchored matchers ([`Pattern`]).
//! - **Query strings**: decoded into a map and handed to the handler next to
//!   the path parameters ([`query::parse`]).
//! - **Storage**: named tables of schema-less JSON records, loaded once at
//!   startup and rewritten in full after every mutation ([`Store`]).
//! - **Serving**: hyper over tokio, HTTP/1.1 and HTTP/2, graceful shutdown on
//!   SIGTERM / Ctrl-C ([`Server`]).
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roster::{users, Server, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), roster::Error> {
//!     let store = Arc::new(Store::open("db.json").await);
//!     let app = users::routes(store);
//!     Server::bind("0.0.0.0:3333".parse().unwrap()).serve(app).await
//! }
//! ```
//!
//! Custom routes are plain async functions:
//!
//! ```rust
//! use roster::{Method, Request, Router, StatusCode};
//!
//! async fn hello(req: Request) -> String {
//!     format!("hello {}", req.param("name").unwrap_or("stranger"))
//! }
//!
//! async fn gone(_req: Request) -> StatusCode {
//!     StatusCode::GONE
//! }
//!
//! let app = Router::new()
//!     .on(Method::Get,    "/hello/:name", hello)
//!     .on(Method::Delete, "/hello/:name", gone);
//! ```

mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod store;

pub mod config;
pub mod query;
pub mod users;

pub use http::StatusCode;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use pattern::{Captures, Pattern};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{RouteMatch, Router};
pub use server::{Server, DEFAULT_MAX_BODY};
pub use store::{Filter, Record, Store};

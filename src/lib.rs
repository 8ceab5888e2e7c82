//! # waymark
//!
//! Correlation ids and request logs for Rust services behind a reverse
//! proxy, on a minimal hyper-based HTTP framework.
//!
//! ## What it does
//!
//! Two pipeline stages, each a pass-through wrapper around the rest of the
//! request pipeline:
//!
//! - [`TraceHeaderStage`](middleware::TraceHeaderStage): stamps every
//!   response with `X-RequestId: <id>`. The id is the ambient trace context
//!   (continued from an inbound `traceparent`) or, outside one, the request's
//!   own id.
//! - [`RequestLoggingStage`](middleware::RequestLoggingStage): logs
//!   `GET request received for URL http://host/path?q=1` and, optionally,
//!   `Response returned after 12 ms`.
//!
//! Stages run in the order they are registered on a [`Pipeline`]; the
//! [`Router`] always runs last.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use waymark::{Environment, Pipeline, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), waymark::Error> {
//!     let router = Router::new()
//!         .get("/users/{id}", get_user)
//!         .post("/users",     create_user);
//!
//!     let app = Pipeline::new(router)
//!         .environment(Environment::from_env()?)
//!         .add_request_logging_capability(None)
//!         .use_trace_header_stage()
//!         .use_request_logging_stage();
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .json(br#"{"id":"99"}"#.to_vec())
//! }
//! ```

mod config;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;
mod trace_context;

pub mod middleware;

pub use config::{
    Environment, ENV_VAR, LOG_DEBUG_ONLY_VAR, LOG_DURATION_VAR, LOG_LEVEL_VAR,
};
pub use error::{BoxError, Error};
pub use handler::{Handler, HandlerOutput, HandlerResult};
pub use pipeline::Pipeline;
pub use request::{Request, RequestBuilder};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use trace_context::{TRACEPARENT_HEADER, TraceContext};

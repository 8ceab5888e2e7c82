//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: request logging, correlation-id injection,
//! authentication-header inspection.
//!
//! A stage receives the request and a [`Next`], the rest of the pipeline.
//! `Next::run` takes `self` by value, so a stage can invoke downstream at
//! most once; a stage that never calls it answers the request itself.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use waymark::middleware::{Middleware, Next};
//! use waymark::{HandlerResult, Request};
//!
//! struct Powered;
//!
//! #[async_trait]
//! impl Middleware for Powered {
//!     async fn handle(&self, req: Request, next: Next<'_>) -> HandlerResult {
//!         let mut res = next.run(req).await?;
//!         res.append_header("x-powered-by", "waymark");
//!         Ok(res)
//!     }
//! }
//! ```
//!
//! Built-in stages:
//! - [`TraceHeaderStage`]: stamps each response with a correlation id
//! - [`RequestLoggingStage`]: logs method, URL and processing time

mod request_logging;
mod trace_header;

use std::sync::Arc;

use async_trait::async_trait;

use crate::handler::HandlerResult;
use crate::request::Request;
use crate::router::Router;

pub use request_logging::{
    LOG_TARGET, RequestLogger, RequestLoggingOptions, RequestLoggingStage, RequestLoggingStageBuilder,
    TracingLogger,
};
pub use trace_header::{TraceHeaderStage, TraceIdOptions};

/// One stage of a request pipeline.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, req: Request, next: Next<'_>) -> HandlerResult;
}

/// A stage shared across concurrent requests.
pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

/// The remainder of the pipeline after the current stage.
pub struct Next<'a> {
    stages: &'a [BoxedMiddleware],
    endpoint: &'a Router,
}

impl<'a> Next<'a> {
    pub(crate) fn new(stages: &'a [BoxedMiddleware], endpoint: &'a Router) -> Self {
        Self { stages, endpoint }
    }

    /// Runs the remaining stages and then the router.
    ///
    /// Response headers staged on the request are applied once, ahead of the
    /// response's own headers, by the innermost stage boundary the request
    /// reached. A stage that answers without calling downstream still gets
    /// the headers staged before it.
    pub async fn run(self, mut req: Request) -> HandlerResult {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let staged = req.response_headers().to_vec();
                let mut res = stage.handle(req, Next::new(rest, self.endpoint)).await?;
                res.merge_staged(staged);
                Ok(res)
            }
            None => {
                let staged = req.take_response_headers();
                let mut res = self.endpoint.dispatch(req).await?;
                res.merge_staged(staged);
                Ok(res)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::response::Response;

    struct Record {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Middleware for Record {
        async fn handle(&self, req: Request, next: Next<'_>) -> HandlerResult {
            self.log.lock().unwrap().push(format!("{} in", self.name));
            let res = next.run(req).await;
            self.log.lock().unwrap().push(format!("{} out", self.name));
            res
        }
    }

    struct Stamp;

    #[async_trait]
    impl Middleware for Stamp {
        async fn handle(&self, mut req: Request, next: Next<'_>) -> HandlerResult {
            req.append_response_header("x-staged", "1");
            next.run(req).await
        }
    }

    struct ShortCircuit;

    #[async_trait]
    impl Middleware for ShortCircuit {
        async fn handle(&self, _req: Request, _next: Next<'_>) -> HandlerResult {
            Ok(Response::text("stopped"))
        }
    }

    #[tokio::test]
    async fn stages_wrap_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<BoxedMiddleware> = vec![
            Arc::new(Record { name: "a", log: Arc::clone(&log) }),
            Arc::new(Record { name: "b", log: Arc::clone(&log) }),
        ];
        let router = Router::new().get("/", |_req: Request| async { "ok" });

        let res = Next::new(&stages, &router).run(Request::builder().build()).await.unwrap();

        assert_eq!(res.body(), b"ok");
        assert_eq!(*log.lock().unwrap(), ["a in", "b in", "b out", "a out"]);
    }

    #[tokio::test]
    async fn a_stage_can_answer_without_downstream() {
        let stages: Vec<BoxedMiddleware> = vec![Arc::new(Stamp), Arc::new(ShortCircuit)];
        let router = Router::new().get("/", |_req: Request| async { "router" });

        let res = Next::new(&stages, &router).run(Request::builder().build()).await.unwrap();
        assert_eq!(res.body(), b"stopped");
        assert_eq!(res.header("x-staged"), Some("1"));
    }

    #[tokio::test]
    async fn staged_headers_are_applied_once_across_stages() {
        let stages: Vec<BoxedMiddleware> = vec![
            Arc::new(Stamp),
            Arc::new(Record { name: "a", log: Arc::default() }),
            Arc::new(Record { name: "b", log: Arc::default() }),
        ];
        let router = Router::new().get("/", |_req: Request| async { "ok" });

        let res = Next::new(&stages, &router).run(Request::builder().build()).await.unwrap();
        assert_eq!(res.header_values("x-staged").count(), 1);
    }

    #[tokio::test]
    async fn staged_headers_reach_the_response() {
        let router = Router::new().get("/", |_req: Request| async { "ok" });
        let mut req = Request::builder().build();
        req.append_response_header("x-staged", "1");

        let res = Next::new(&[], &router).run(req).await.unwrap();
        assert_eq!(res.header("x-staged"), Some("1"));
    }
}

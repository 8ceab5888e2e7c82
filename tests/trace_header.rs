mod common;

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use http::StatusCode;
use waymark::middleware::{Middleware, Next, TraceHeaderStage, TraceIdOptions};
use waymark::{HandlerResult, Pipeline, Request, Response, Router, TraceContext};

use common::counting_router;

fn request() -> Request {
    Request::builder().path("/path").id("My Identifier").build()
}

#[tokio::test]
async fn default_key_carries_the_request_id() {
    let (router, hits) = counting_router();
    let app = Pipeline::new(router).use_trace_header_stage();

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.header_values("X-RequestId").collect::<Vec<_>>(), ["My Identifier"]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn configured_key_is_used() {
    let (router, _hits) = counting_router();
    let app = Pipeline::new(router)
        .use_trace_header_stage_with(|options| options.header_key = "My-Header".into());

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.header("My-Header"), Some("My Identifier"));
    assert_eq!(res.header("X-RequestId"), None);
}

#[tokio::test]
async fn ambient_trace_context_wins() {
    let (router, _hits) = counting_router();
    let app = Pipeline::new(router).use_trace_header_stage();
    let ctx = TraceContext::new_root();

    let res = ctx.scope(app.handle(request())).await.unwrap();

    assert_eq!(res.header("X-RequestId"), Some(ctx.to_string().as_str()));
}

#[tokio::test]
async fn header_is_visible_before_the_handler_runs() {
    let router = Router::new().get("/path", |req: Request| async move {
        req.response_headers()
            .iter()
            .find(|(k, _)| k == "X-RequestId")
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    });
    let app = Pipeline::new(router).use_trace_header_stage();

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.body(), b"My Identifier");
}

#[tokio::test]
async fn header_is_added_to_not_found_responses_too() {
    let app = Pipeline::new(Router::new()).use_trace_header_stage();

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.status_code(), http::StatusCode::NOT_FOUND);
    assert_eq!(res.header("X-RequestId"), Some("My Identifier"));
}

#[tokio::test]
async fn registering_twice_appends_twice() {
    let (router, hits) = counting_router();
    let app = Pipeline::new(router)
        .use_trace_header_stage()
        .use_stage(TraceHeaderStage::new(TraceIdOptions { header_key: "X-Correlation-Id".into() }))
        .use_trace_header_stage();

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.header_values("X-RequestId").count(), 2);
    assert_eq!(res.header("X-Correlation-Id"), Some("My Identifier"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_request_gets_its_own_id() {
    let (router, _hits) = counting_router();
    let app = Pipeline::new(router).use_trace_header_stage();

    let a = app.handle(Request::builder().path("/path").build()).await.unwrap();
    let b = app.handle(Request::builder().path("/path").build()).await.unwrap();

    assert_ne!(a.header("X-RequestId"), b.header("X-RequestId"));
}

/// Answers 401 to everything without calling downstream.
struct Deny;

#[async_trait]
impl Middleware for Deny {
    async fn handle(&self, _req: Request, _next: Next<'_>) -> HandlerResult {
        Ok(Response::status(StatusCode::UNAUTHORIZED))
    }
}

#[tokio::test]
async fn header_survives_a_later_stage_answering_early() {
    let (router, hits) = counting_router();
    let app = Pipeline::new(router).use_trace_header_stage().use_stage(Deny);

    let res = app.handle(request()).await.unwrap();

    assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.header_values("X-RequestId").collect::<Vec<_>>(), ["My Identifier"]);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
#[should_panic(expected = "invalid trace header key")]
fn invalid_header_key_fails_at_registration() {
    let _ = Pipeline::new(Router::new())
        .use_trace_header_stage_with(|options| options.header_key = "My Header".into());
}

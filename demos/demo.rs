//! Demo host: two routes behind the trace-header and request-logging stages.
//!
//! Run with:
//!   WAYMARK_ENV=development RUST_LOG=info cargo run --example demo
//!
//! Try:
//!   curl -i http://localhost:3000/
//!   curl -i 'http://localhost:3000/hello?name=alice'
//!   curl -i -H 'traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01' \
//!        http://localhost:3000/

use http::StatusCode;
use tracing_subscriber::EnvFilter;
use waymark::middleware::RequestLoggingOptions;
use waymark::{Environment, Pipeline, Request, Response, Router, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let environment = Environment::from_env()?;
    let options = RequestLoggingOptions::from_env()?;
    tracing::info!(%environment, ?options, "starting demo");

    let router = Router::new()
        .get("/",      root)
        .get("/hello", say_hello);

    let app = Pipeline::new(router)
        .environment(environment)
        .add_request_logging_capability(Some(options))
        .use_trace_header_stage()
        .use_request_logging_stage();

    Server::bind("0.0.0.0:3000").serve(app).await?;
    Ok(())
}

// GET / → 200, empty body
async fn root(_req: Request) -> StatusCode {
    StatusCode::OK
}

// GET /hello?name=X → "Hello X" as a JSON string; 400 without `name`
async fn say_hello(req: Request) -> Result<Response, serde_json::Error> {
    let Some(name) = req.query_param("name") else {
        return Ok(Response::status(StatusCode::BAD_REQUEST));
    };
    let body = serde_json::to_vec(&format!("Hello {name}"))?;
    Ok(Response::json(body))
}

//! Correlation-id response header.

use async_trait::async_trait;
use http::HeaderName;

use super::{Middleware, Next};
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::trace_context::TraceContext;

/// Configuration for [`TraceHeaderStage`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraceIdOptions {
    /// Name of the response header carrying the identifier.
    pub header_key: String,
}

impl Default for TraceIdOptions {
    fn default() -> Self {
        Self { header_key: "X-RequestId".to_owned() }
    }
}

/// Adds `{header_key}: {trace id}` to every response.
///
/// The id is the ambient [`TraceContext`] when the request runs inside one,
/// otherwise the request's own [`id`](Request::id). The header is staged
/// before downstream runs, so later stages and the handler already see it.
/// It is appended, never replaced.
#[derive(Clone, Debug, Default)]
pub struct TraceHeaderStage {
    options: TraceIdOptions,
}

impl TraceHeaderStage {
    /// # Panics
    ///
    /// Panics if `options.header_key` is not a valid HTTP header name.
    pub fn new(options: TraceIdOptions) -> Self {
        if let Err(e) = HeaderName::try_from(options.header_key.as_str()) {
            panic!("invalid trace header key `{}`: {e}", options.header_key);
        }
        Self { options }
    }

    /// Default options with `configure` applied once.
    pub fn configure(configure: impl FnOnce(&mut TraceIdOptions)) -> Self {
        let mut options = TraceIdOptions::default();
        configure(&mut options);
        Self::new(options)
    }

    pub fn options(&self) -> &TraceIdOptions {
        &self.options
    }
}

/// The identifier [`TraceHeaderStage`] would stamp on `req` right now.
pub(crate) fn trace_identifier(req: &Request) -> String {
    TraceContext::current()
        .map(|ctx| ctx.to_string())
        .unwrap_or_else(|| req.id().to_owned())
}

#[async_trait]
impl Middleware for TraceHeaderStage {
    async fn handle(&self, mut req: Request, next: Next<'_>) -> HandlerResult {
        let id = trace_identifier(&req);
        req.append_response_header(self.options.header_key.as_str(), id);
        next.run(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_header_key() {
        assert_eq!(TraceIdOptions::default().header_key, "X-RequestId");
    }

    #[test]
    fn configure_applies_the_mutator() {
        let stage = TraceHeaderStage::configure(|o| o.header_key = "X-Correlation-Id".into());
        assert_eq!(stage.options().header_key, "X-Correlation-Id");
    }

    #[test]
    #[should_panic(expected = "invalid trace header key `My Header`")]
    fn header_key_must_be_a_header_name() {
        let _ = TraceHeaderStage::configure(|o| o.header_key = "My Header".into());
    }

    #[test]
    #[should_panic(expected = "invalid trace header key")]
    fn empty_header_key_is_rejected() {
        let _ = TraceHeaderStage::new(TraceIdOptions { header_key: String::new() });
    }

    #[test]
    fn identifier_falls_back_to_request_id() {
        let req = Request::builder().id("My Identifier").build();
        assert_eq!(trace_identifier(&req), "My Identifier");
    }

    #[tokio::test]
    async fn identifier_prefers_the_ambient_trace() {
        let req = Request::builder().id("My Identifier").build();
        let ctx = TraceContext::new_root();
        let id = ctx.scope(async { trace_identifier(&req) }).await;
        assert_eq!(id, ctx.to_string());
    }
}

//! Ordered stage list in front of a router.
//!
//! Stages run in registration order, the first registered outermost. Shared
//! pieces (the logger, the logging stage and its options) are built once
//! here at startup and handed to the stages by `Arc`; nothing is looked up
//! at request time. The logging stage is built on its first
//! `use_request_logging_stage`, from the environment and logger set by then.
//!
//! ```rust,no_run
//! use waymark::{Environment, Pipeline, Request, Router, Server};
//!
//! # async fn hello(_: Request) -> &'static str { "hi" }
//! #[tokio::main]
//! async fn main() -> Result<(), waymark::Error> {
//!     let router = Router::new().get("/hello", hello);
//!
//!     let app = Pipeline::new(router)
//!         .environment(Environment::from_env()?)
//!         .add_request_logging_capability(None)
//!         .use_trace_header_stage()
//!         .use_request_logging_stage();
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//! ```

use std::sync::Arc;

use crate::config::Environment;
use crate::handler::HandlerResult;
use crate::middleware::{
    BoxedMiddleware, Middleware, Next, RequestLogger, RequestLoggingOptions, RequestLoggingStage,
    TraceHeaderStage, TraceIdOptions, TracingLogger,
};
use crate::request::Request;
use crate::router::Router;

/// Where the request logging capability stands.
enum RequestLogging {
    /// Added, not yet placed in the pipeline.
    Added(Option<RequestLoggingOptions>),
    /// Built and placed at least once.
    InUse(Arc<RequestLoggingStage>),
}

/// A router plus the stages every request passes through first.
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    router: Router,
    environment: Environment,
    logger: Arc<dyn RequestLogger>,
    request_logging: Option<RequestLogging>,
}

impl Pipeline {
    /// No stages, [`Environment::Production`], logging through `tracing`.
    pub fn new(router: Router) -> Self {
        Self {
            stages: Vec::new(),
            router,
            environment: Environment::default(),
            logger: Arc::new(TracingLogger),
            request_logging: None,
        }
    }

    /// Sets the runtime mode.
    ///
    /// # Panics
    ///
    /// Panics once the request logging stage is in use: it resolved its
    /// on/off switch from the earlier mode.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.assert_logging_not_built("environment");
        self.environment = environment;
        self
    }

    /// Replaces the sink the request logging stage writes to.
    ///
    /// # Panics
    ///
    /// Panics once the request logging stage is in use.
    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.assert_logging_not_built("logger");
        self.logger = logger;
        self
    }

    /// Registers the one request logging stage this pipeline will use, with
    /// `options` or the defaults. It takes effect where
    /// [`use_request_logging_stage`](Self::use_request_logging_stage) is called.
    pub fn add_request_logging_capability(mut self, options: Option<RequestLoggingOptions>) -> Self {
        self.request_logging = Some(RequestLogging::Added(options));
        self
    }

    /// Inserts the request logging stage at this position. Every call
    /// inserts the same shared stage.
    ///
    /// # Panics
    ///
    /// Panics if [`add_request_logging_capability`](Self::add_request_logging_capability)
    /// was not called first.
    pub fn use_request_logging_stage(mut self) -> Self {
        let stage = match self.request_logging.take() {
            Some(RequestLogging::Added(options)) => Arc::new(RequestLoggingStage::new(
                Arc::clone(&self.logger),
                options,
                self.environment,
            )),
            Some(RequestLogging::InUse(stage)) => stage,
            None => panic!("use_request_logging_stage called before add_request_logging_capability"),
        };
        self.request_logging = Some(RequestLogging::InUse(Arc::clone(&stage)));
        self.stages.push(stage);
        self
    }

    fn assert_logging_not_built(&self, setting: &str) {
        if matches!(self.request_logging, Some(RequestLogging::InUse(_))) {
            panic!("{setting} must be set before use_request_logging_stage");
        }
    }

    /// Inserts a [`TraceHeaderStage`] with the default header key.
    pub fn use_trace_header_stage(self) -> Self {
        self.use_stage(TraceHeaderStage::new(TraceIdOptions::default()))
    }

    /// Inserts a [`TraceHeaderStage`] whose options `configure` may change.
    /// The options are fixed from here on.
    pub fn use_trace_header_stage_with(self, configure: impl FnOnce(&mut TraceIdOptions)) -> Self {
        self.use_stage(TraceHeaderStage::configure(configure))
    }

    /// Inserts any stage at this position.
    pub fn use_stage(mut self, stage: impl Middleware) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Number of stages in front of the router.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs one request through every stage and the router.
    pub async fn handle(&self, req: Request) -> HandlerResult {
        Next::new(&self.stages, &self.router).run(req).await
    }
}

impl From<Router> for Pipeline {
    fn from(router: Router) -> Self {
        Self::new(router)
    }
}

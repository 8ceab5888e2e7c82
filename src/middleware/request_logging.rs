//! Request logging.
//!
//! Logs `"{METHOD} request received for URL {url}"` when a request enters
//! the stage and, optionally, `"Response returned after {N} ms"` when the
//! rest of the pipeline has answered. Both lines use the configured level.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Level;

use super::{Middleware, Next};
use crate::config::Environment;
use crate::error::Error;
use crate::handler::HandlerResult;
use crate::request::Request;

/// Target used by [`TracingLogger`] events.
pub const LOG_TARGET: &str = "waymark::request";

/// Where the logging stage writes its lines.
pub trait RequestLogger: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Forwards lines to `tracing` under the [`LOG_TARGET`] target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        // The event macros need the level at compile time.
        if level == Level::ERROR {
            tracing::error!(target: LOG_TARGET, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: LOG_TARGET, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: LOG_TARGET, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: LOG_TARGET, "{message}");
        } else {
            tracing::trace!(target: LOG_TARGET, "{message}");
        }
    }
}

/// Configuration for [`RequestLoggingStage`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RequestLoggingOptions {
    /// Level of both lines. Default: `INFO`.
    pub log_level: Level,
    /// Log the processing time after downstream returns. Default: `true`.
    pub log_duration: bool,
    /// Only log in [`Environment::Development`]. Default: `true`.
    pub debug_only: bool,
}

impl Default for RequestLoggingOptions {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            log_duration: true,
            debug_only: true,
        }
    }
}

/// Logs each request and, optionally, how long it took.
///
/// Whether it logs at all is decided once, at construction: always in
/// development, otherwise only when `debug_only` is off. Disabled or not,
/// downstream runs exactly once and its result comes back untouched.
pub struct RequestLoggingStage {
    logger: Arc<dyn RequestLogger>,
    options: Arc<RequestLoggingOptions>,
    enabled: bool,
}

impl RequestLoggingStage {
    /// `None` options means [`RequestLoggingOptions::default`].
    pub fn new(
        logger: Arc<dyn RequestLogger>,
        options: Option<RequestLoggingOptions>,
        environment: Environment,
    ) -> Self {
        let options = options.unwrap_or_default();
        let enabled = environment.is_development() || !options.debug_only;
        Self { logger, options: Arc::new(options), enabled }
    }

    pub fn builder() -> RequestLoggingStageBuilder {
        RequestLoggingStageBuilder::default()
    }

    pub fn options(&self) -> &RequestLoggingOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn log_request(&self, req: &Request) {
        self.logger.log(
            self.options.log_level,
            &format!("{} request received for URL {}", req.method(), req.display_url()),
        );
    }

    fn log_duration(&self, elapsed: Duration) {
        self.logger.log(
            self.options.log_level,
            &format!("Response returned after {} ms", whole_millis(elapsed)),
        );
    }
}

impl fmt::Debug for RequestLoggingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestLoggingStage")
            .field("options", &self.options)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Middleware for RequestLoggingStage {
    async fn handle(&self, req: Request, next: Next<'_>) -> HandlerResult {
        if !self.enabled {
            return next.run(req).await;
        }

        let started = self.options.log_duration.then(Instant::now);
        self.log_request(&req);

        let res = next.run(req).await?;

        if let Some(started) = started {
            self.log_duration(started.elapsed());
        }
        Ok(res)
    }
}

/// Milliseconds rounded half away from zero, no digit grouping.
fn whole_millis(elapsed: Duration) -> u128 {
    (elapsed.as_nanos() + 500_000) / 1_000_000
}

/// Builder for [`RequestLoggingStage`] where the logger may be missing.
#[derive(Default)]
pub struct RequestLoggingStageBuilder {
    logger: Option<Arc<dyn RequestLogger>>,
    options: Option<RequestLoggingOptions>,
    environment: Environment,
}

impl RequestLoggingStageBuilder {
    pub fn logger(mut self, logger: Arc<dyn RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn options(mut self, options: RequestLoggingOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Fails with [`Error::MissingArgument`] naming `logger` when none was set.
    pub fn build(self) -> Result<RequestLoggingStage, Error> {
        let logger = self.logger.ok_or(Error::MissingArgument {
            name: "logger",
            reason: "the request logging stage needs a logger to work",
        })?;
        Ok(RequestLoggingStage::new(logger, self.options, self.environment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(debug_only: bool) -> Option<RequestLoggingOptions> {
        Some(RequestLoggingOptions { debug_only, ..Default::default() })
    }

    #[test]
    fn defaults() {
        let options = RequestLoggingOptions::default();
        assert_eq!(options.log_level, Level::INFO);
        assert!(options.log_duration);
        assert!(options.debug_only);
    }

    #[test]
    fn enable_gate() {
        let logger: Arc<dyn RequestLogger> = Arc::new(TracingLogger);
        let stage = |opts, env| RequestLoggingStage::new(Arc::clone(&logger), opts, env);

        assert!(stage(options(true), Environment::Development).is_enabled());
        assert!(stage(options(false), Environment::Development).is_enabled());
        assert!(!stage(options(true), Environment::Production).is_enabled());
        assert!(stage(options(false), Environment::Production).is_enabled());
        assert!(!stage(None, Environment::Production).is_enabled());
    }

    #[test]
    fn missing_options_are_defaulted() {
        let stage = RequestLoggingStage::new(Arc::new(TracingLogger), None, Environment::Production);
        assert_eq!(*stage.options(), RequestLoggingOptions::default());
    }

    #[test]
    fn builder_requires_a_logger() {
        let err = RequestLoggingStage::builder().build().unwrap_err();
        assert!(matches!(err, Error::MissingArgument { name: "logger", .. }));

        let stage = RequestLoggingStage::builder()
            .logger(Arc::new(TracingLogger))
            .environment(Environment::Development)
            .build()
            .unwrap();
        assert!(stage.is_enabled());
    }

    #[test]
    fn millis_round_half_away_from_zero() {
        assert_eq!(whole_millis(Duration::ZERO), 0);
        assert_eq!(whole_millis(Duration::from_micros(499)), 0);
        assert_eq!(whole_millis(Duration::from_micros(500)), 1);
        assert_eq!(whole_millis(Duration::from_micros(1_234_567)), 1235);
        assert_eq!(whole_millis(Duration::from_secs(12)), 12000);
    }
}

//! Runtime configuration.
//!
//! Everything here is resolved once at startup and never re-read. The
//! "debug build" switch other stacks bake in at compile time is an explicit
//! [`Environment`] value instead, so both modes are testable from one binary.

use std::fmt;
use std::str::FromStr;

use tracing::Level;

use crate::error::Error;
use crate::middleware::RequestLoggingOptions;

/// Selects the runtime mode.
pub const ENV_VAR: &str = "WAYMARK_ENV";
pub const LOG_LEVEL_VAR: &str = "WAYMARK_REQUEST_LOG_LEVEL";
pub const LOG_DURATION_VAR: &str = "WAYMARK_REQUEST_LOG_DURATION";
pub const LOG_DEBUG_ONLY_VAR: &str = "WAYMARK_REQUEST_LOG_DEBUG_ONLY";

/// The mode the process runs in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Reads [`ENV_VAR`]. Unset means [`Environment::Production`].
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var(ENV_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(Error::Config { key: ENV_VAR, value: s.to_owned() }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Development => "development",
            Self::Production => "production",
        })
    }
}

impl RequestLoggingOptions {
    /// Reads the `WAYMARK_REQUEST_LOG_*` variables on top of the defaults.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds options from an arbitrary key lookup. Missing keys keep their
    /// defaults; present keys must parse.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut options = Self::default();

        if let Some(value) = lookup(LOG_LEVEL_VAR) {
            options.log_level = value
                .trim()
                .parse::<Level>()
                .map_err(|_| Error::Config { key: LOG_LEVEL_VAR, value })?;
        }
        if let Some(value) = lookup(LOG_DURATION_VAR) {
            options.log_duration = parse_flag(LOG_DURATION_VAR, value)?;
        }
        if let Some(value) = lookup(LOG_DEBUG_ONLY_VAR) {
            options.debug_only = parse_flag(LOG_DEBUG_ONLY_VAR, value)?;
        }

        Ok(options)
    }
}

fn parse_flag(key: &'static str, value: String) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::Config { key, value }),
    }
}

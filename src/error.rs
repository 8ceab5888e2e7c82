//! Unified error type.

/// A boxed error raised by a route handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by waymark's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// misconfiguration at startup, handler failures travelling back through the
/// pipeline, and infrastructure failures (binding, accepting, reading bodies).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required constructor argument was not supplied.
    #[error("missing argument `{name}`: {reason}")]
    MissingArgument {
        name: &'static str,
        reason: &'static str,
    },

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },

    /// A handler returned `Err`. Stages pass this through untouched; the
    /// original error is reachable with [`Error::handler_error`].
    #[error("{0}")]
    Handler(BoxError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("hyper: {0}")]
    Hyper(#[from] hyper::Error),
}

impl Error {
    /// The error a handler failed with, if this is a handler failure.
    pub fn handler_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

//! Everything that can go wrong while shuffling, and how bad it is.
use axum::http::StatusCode;
use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A GIF backend failed to hand us a candidate. Always recoverable: the user
/// can shuffle again or rerun the command.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ProviderError {
    cause: String,
    #[source]
    source: Option<BoxedError>,
}

impl ProviderError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            source: None,
        }
    }

    pub fn with_source(cause: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self {
            cause: cause.into(),
            source: Some(source.into()),
        }
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }
}

/// The action payload the host round-tripped to us is missing something.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedContextError {
    #[error("missing `{0}` from action request context")]
    Missing(&'static str),
    #[error("`{key}` in action request context is not {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
}

/// The chat host refused to create, update, or delete a post.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct HostOperationError {
    cause: String,
    #[source]
    source: Option<BoxedError>,
}

impl HostOperationError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            source: None,
        }
    }

    pub fn with_source(cause: impl Into<String>, source: impl Into<BoxedError>) -> Self {
        Self {
            cause: cause.into(),
            source: Some(source.into()),
        }
    }
}

/// Why a button handler did not finish. Each variant maps to exactly one
/// transport status.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Malformed action request: {0}")]
    Malformed(#[from] MalformedContextError),
    #[error("Unable to fetch a new GIF for shuffling: {0}")]
    Provider(#[source] ProviderError),
    #[error("{context}: {source}")]
    Host {
        context: &'static str,
        #[source]
        source: HostOperationError,
    },
}

impl ActionError {
    pub fn host(context: &'static str, source: HostOperationError) -> Self {
        ActionError::Host { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Malformed(_) => StatusCode::BAD_REQUEST,
            ActionError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
            ActionError::Host { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

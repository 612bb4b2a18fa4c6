//! Error Types
//!
//! Standardized error taxonomy for the Tessera SDK.
//!
//! Variants split into the classes the rest of the SDK cares about:
//! fail-fast caller mistakes (`UnsupportedOperation`, `ValueOutOfRange`,
//! `UnsupportedType`, `InvalidConfig`), server-reported failures
//! (`Resource`), transient transport failures (`Transport`, retried by the
//! request executor), and cancellation (never retried).

use thiserror::Error;

/// Error type used across all Tessera crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A query operator, expansion selector, or execution path is not
    /// implemented. Always raised before any I/O occurs.
    #[error("unsupported operation: {message}")]
    UnsupportedOperation { message: String },

    /// Caller attempted to set a reserved key or a non-primitive
    /// custom-data value.
    #[error("value out of range for '{field}': {message}")]
    ValueOutOfRange { field: String, message: String },

    /// The requested resource type has no concrete mapping.
    #[error("unsupported resource type: {type_name}")]
    UnsupportedType { type_name: String },

    /// Server-reported failure: a non-2xx HTTP response, or a save/create
    /// response that violated the empty-body contract.
    #[error("resource error (HTTP {status}): {developer_message}")]
    Resource {
        /// HTTP status code of the failing response.
        status: u16,
        /// Server-assigned error code, when the body carried one.
        code: Option<u64>,
        /// Developer-facing message.
        developer_message: String,
    },

    /// The operation was cancelled. Distinct from generic failures and
    /// short-circuits any retry budget.
    #[error("operation cancelled")]
    Cancelled,

    /// A result operator requiring at least one element ran against an
    /// empty collection.
    #[error("the collection contained no elements")]
    NoElements,

    /// A single-element operator found more than one element.
    #[error("the collection contained more than one element")]
    MultipleElements,

    /// Network-level failure before an HTTP status was obtained.
    /// Retryable under the default backoff strategy.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON encode/decode failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Builder or configuration input was invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl Error {
    /// Shorthand for an [`Error::UnsupportedOperation`].
    pub fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedOperation {
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::ValueOutOfRange`].
    pub fn out_of_range(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ValueOutOfRange {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`Error::Transport`] without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error is retryable by the request executor.
    ///
    /// Only transport-level failures qualify; HTTP-status-driven retries
    /// (429/5xx) are classified on the response, not the error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// Whether this error is a cancellation signal.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Type alias for Results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

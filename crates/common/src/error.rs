use std::error::Error as StdError;

/// Crate-wide result type for atypica operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared across the atypica crates.
///
/// Validation, auth, and forbidden errors are decided before any side
/// effect; the HTTP layer maps each variant to a status code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field is missing or empty after trimming.
    #[error("invalid request: {message}")]
    Validation { message: String },

    /// The inbound API key is missing or does not match.
    #[error("unauthorized: {message}")]
    Auth { message: String },

    /// The sender is not on the allow-list, or the account is disabled.
    #[error("forbidden: {message}")]
    Forbidden { message: String },

    /// No session exists for the resolved key.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// Agent creation failed; carries the underlying tool's error text.
    #[error("agent provisioning failed: {context}: {detail}")]
    Provision { context: String, detail: String },

    /// The agent turn exceeded the configured bound.
    #[error("agent turn timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Webhook delivery failed. Logged, never retried, never surfaced to
    /// the original caller on the async path.
    #[error("reply delivery failed: {message}")]
    Delivery { message: String },

    /// Wrapped error from a host gateway interface.
    #[error("host operation failed: {context}: {source}")]
    Host {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn auth(message: impl std::fmt::Display) -> Self {
        Self::Auth {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn forbidden(message: impl std::fmt::Display) -> Self {
        Self::Forbidden {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl std::fmt::Display) -> Self {
        Self::NotFound {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn provision(context: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::Provision {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    #[must_use]
    pub fn delivery(message: impl std::fmt::Display) -> Self {
        Self::Delivery {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn host(
        context: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Host {
            context: context.into(),
            source: source.into(),
        }
    }
}

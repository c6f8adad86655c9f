//! Unified error type for provider and engine operations.
//!
//! Every adapter maps its native failures into [`LlmError`], so callers
//! match on one type regardless of the vendor. Nothing in the core
//! retries: a caller that wants backoff wraps
//! [`Engine::run_turn`](crate::engine::Engine::run_turn) itself.
//!
//! Tool failures are deliberately absent. A tool's own error becomes the
//! text of its answer (see [`ToolError`](crate::tool::ToolError)) so the
//! model can react to it.

/// The unified error type returned by provider and engine operations.
///
/// Variants are `#[non_exhaustive]`; always include a wildcard arm.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// A vendor answered with a non-success status, or the request never
    /// got an answer at all (`status` is `None`).
    ///
    /// `body` is the vendor's raw error payload, kept verbatim for
    /// diagnostics and for the user-facing error notification.
    #[error("upstream error (status={status:?}): {body}")]
    Upstream {
        /// The HTTP status code, if one was received.
        status: Option<http::StatusCode>,
        /// Raw response body or transport failure description.
        body: String,
    },

    /// The vendor refused to answer on safety or policy grounds.
    #[error("content policy rejection: {reason}")]
    ContentPolicy {
        /// The vendor's stated reason (e.g. `"SAFETY"`).
        reason: String,
    },

    /// A frame or body could not be decoded.
    ///
    /// An incomplete JSON fragment in the middle of a stream is not a
    /// decode error; only data that can never become valid is.
    #[error("decode error: {message}")]
    Decode {
        /// What went wrong during parsing.
        message: String,
        /// The offending input, for diagnostics.
        raw: String,
    },

    /// The model kept requesting tools past the configured round limit.
    #[error("tool loop exceeded {rounds} rounds")]
    ToolLoopExceeded {
        /// The configured limit that was hit.
        rounds: u32,
    },

    /// The request exceeded its deadline.
    #[error("request timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before the timeout fired.
        elapsed_ms: u64,
    },

    /// No adapter is registered under this name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider settings are unusable.
    #[error("invalid provider configuration: {0}")]
    Config(String),

    /// A partial-message consumer stopped the stream.
    #[error("delivery aborted: {0}")]
    Delivery(String),

    /// The persistence collaborator failed.
    #[error("store error: {0}")]
    Store(String),
}

impl LlmError {
    /// The upstream HTTP status, when the error carries one.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Shorthand for a transport failure that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            body: message.into(),
        }
    }

    /// Shorthand for a decode failure with the offending input attached.
    pub fn decode(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

impl LlmError {
    /// Maps a `reqwest` failure that produced no usable response.
    ///
    /// A timeout becomes [`LlmError::Timeout`] reporting `timeout` (the
    /// deadline the client was configured with); everything else is an
    /// [`LlmError::Upstream`] carrying whatever status reqwest saw.
    pub fn from_reqwest(err: &reqwest::Error, timeout: Option<std::time::Duration>) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                elapsed_ms: timeout.map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            };
        }
        Self::Upstream {
            status: err.status(),
            body: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
            raw: String::new(),
        }
    }
}

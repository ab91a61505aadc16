//! Transport types
//!
//! Common types shared across transport implementations: the normalized
//! adapter error taxonomy, the cancel/deadline context threaded through
//! every streaming call, and the `SyncTransport` trait that lets tests
//! swap in a fake transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Canonical classification of a failed provider call
///
/// Everything user-correctable gets its own class; the rest collapses to
/// `Other` carrying the original message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    InsufficientCredit,
    InvalidCredential,
    RateLimited,
    ModelUnavailable,
    Other,
}

/// Adapter errors
///
/// The first five variants are the normalized provider taxonomy; the
/// remainder are internal shapes (raw HTTP before classification,
/// transport failures, cancellation, deadline expiry).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Provider refused for billing reasons
    #[error("Insufficient credit: {0}")]
    InsufficientCredit(String),

    /// Credential rejected by the provider
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Provider is rate limiting this credential
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Requested model does not exist or is not accessible
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Network error (connection refused, DNS, TLS, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error before classification (body kept for normalization)
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Provider responded with something unparseable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local configuration problem — no external call was made
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Wall-clock ceiling for the turn expired
    #[error("Turn exceeded the {limit_secs}s time limit")]
    Timeout { limit_secs: u64 },

    /// Caller went away; not a user-visible error
    #[error("Stream cancelled by caller")]
    Cancelled,

    /// IO error while reading a stream
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error while building or parsing a body
    #[error("JSON error: {0}")]
    Json(String),
}

impl AdapterError {
    /// Canonical classification for user-facing handling
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            AdapterError::InsufficientCredit(_) => ProviderErrorKind::InsufficientCredit,
            AdapterError::InvalidCredential(_) => ProviderErrorKind::InvalidCredential,
            AdapterError::RateLimited(_) => ProviderErrorKind::RateLimited,
            AdapterError::ModelUnavailable(_) => ProviderErrorKind::ModelUnavailable,
            _ => ProviderErrorKind::Other,
        }
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Json(err.to_string())
    }
}

/// Shared cancellation flag
///
/// Set once by the owning handle (caller disconnect or shutdown); checked
/// by the transport between stream lines so stopping iteration actually
/// stops upstream work.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-turn streaming context: cancel flag plus wall-clock deadline
///
/// The deadline is measured from turn start, not first token.
#[derive(Debug, Clone)]
pub struct StreamContext {
    cancel: CancelFlag,
    deadline: Option<Instant>,
    timeout_secs: u64,
}

impl StreamContext {
    pub fn new(cancel: CancelFlag, timeout_secs: u64) -> Self {
        Self {
            cancel,
            deadline: Some(Instant::now() + std::time::Duration::from_secs(timeout_secs)),
            timeout_secs,
        }
    }

    /// Context with no deadline (model listing, tests)
    pub fn unbounded(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            deadline: None,
            timeout_secs: 0,
        }
    }

    /// Check cancel flag and deadline; call between stream chunks
    pub fn check(&self) -> Result<(), AdapterError> {
        if self.cancel.is_cancelled() {
            return Err(AdapterError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(AdapterError::Timeout {
                    limit_secs: self.timeout_secs,
                });
            }
        }
        Ok(())
    }
}

impl Default for StreamContext {
    fn default() -> Self {
        Self::unbounded(CancelFlag::new())
    }
}

/// Synchronous HTTP transport
///
/// Abstraction over the HTTP client to enable testing with FakeTransport.
/// Streaming calls receive the turn's `StreamContext` and must observe it
/// between lines.
pub trait SyncTransport: Send + Sync {
    /// POST JSON request and return response body
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> Result<String, AdapterError>;

    /// GET request and return response body
    fn get_json(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, AdapterError>;

    /// POST JSON request and process streaming response line-by-line
    ///
    /// Calls `on_line` for each line of the response body; checks the
    /// context between lines and aborts with `Cancelled`/`Timeout`.
    fn post_stream<F>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &str,
        ctx: &StreamContext,
        on_line: F,
    ) -> Result<(), AdapterError>
    where
        F: FnMut(&str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            AdapterError::InsufficientCredit("x".into()).kind(),
            ProviderErrorKind::InsufficientCredit
        );
        assert_eq!(
            AdapterError::InvalidCredential("x".into()).kind(),
            ProviderErrorKind::InvalidCredential
        );
        assert_eq!(
            AdapterError::RateLimited("x".into()).kind(),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            AdapterError::ModelUnavailable("x".into()).kind(),
            ProviderErrorKind::ModelUnavailable
        );
        assert_eq!(
            AdapterError::Network("x".into()).kind(),
            ProviderErrorKind::Other
        );
        assert_eq!(
            AdapterError::Timeout { limit_secs: 300 }.kind(),
            ProviderErrorKind::Other
        );
    }

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_context_check_cancelled() {
        let flag = CancelFlag::new();
        let ctx = StreamContext::unbounded(flag.clone());
        assert!(ctx.check().is_ok());
        flag.cancel();
        assert_eq!(ctx.check(), Err(AdapterError::Cancelled));
    }

    #[test]
    fn test_context_check_deadline_expired() {
        let ctx = StreamContext::new(CancelFlag::new(), 0);
        assert!(matches!(
            ctx.check(),
            Err(AdapterError::Timeout { limit_secs: 0 })
        ));
    }

    #[test]
    fn test_cancel_takes_precedence_over_timeout() {
        let flag = CancelFlag::new();
        flag.cancel();
        let ctx = StreamContext::new(flag, 0);
        assert_eq!(ctx.check(), Err(AdapterError::Cancelled));
    }
}

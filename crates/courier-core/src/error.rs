// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier notification controller.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across Courier crates.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Resource store errors other than not-found and conflict.
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The requested resource does not exist in the store.
    #[error("resource not found: {namespace}/{name}")]
    NotFound { namespace: String, name: String },

    /// Optimistic-concurrency violation on a status write.
    #[error("status write conflict: {namespace}/{name}")]
    Conflict { namespace: String, name: String },

    /// The notification spec is missing required fields or is otherwise malformed.
    /// This is a permanent condition; the reconciler never retries it.
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// Contract violation in a pure helper (empty channel name, etc.).
    #[error("contract violation: {0}")]
    Contract(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classification of a channel delivery failure.
///
/// The retry handler consults [`DeliveryErrorKind::is_retryable`] to decide
/// between backoff-and-retry and fail-fast. TLS failures are permanent:
/// they signal a security misconfiguration, and retrying would mask it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryErrorKind {
    /// The per-attempt timeout elapsed.
    #[error("timeout")]
    Timeout,

    /// The transport could not establish a connection.
    #[error("connection refused")]
    ConnectionRefused,

    /// The remote end returned a server error (5xx).
    #[error("server error")]
    ServerError,

    /// The remote end asked us to slow down (429).
    #[error("rate limited")]
    RateLimited,

    /// The remote end rejected the request (4xx other than 429).
    #[error("client error")]
    ClientError,

    /// TLS or certificate validation failed. Never retried.
    #[error("tls certificate failure")]
    TlsCertificate,

    /// The payload could not be serialized or was rejected as malformed.
    #[error("malformed payload")]
    MalformedPayload,

    /// The circuit breaker rejected the call without a network attempt.
    #[error("circuit open")]
    CircuitOpen,

    /// The requested channel has no registered delivery service.
    #[error("unknown channel")]
    UnknownChannel,

    /// The delivery task itself failed (panicked) before producing a
    /// result. A bug in the service implementation; never retried.
    #[error("delivery task failure")]
    TaskFailure,
}

impl DeliveryErrorKind {
    /// Whether the retry handler may attempt this delivery again.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionRefused | Self::ServerError | Self::RateLimited
        )
    }
}

/// A classified channel delivery failure.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DeliveryError {
    /// Construct an error with the given classification and message.
    pub fn new(kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying transport error.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the retry handler may attempt this delivery again.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(DeliveryErrorKind::Timeout.is_retryable());
        assert!(DeliveryErrorKind::ConnectionRefused.is_retryable());
        assert!(DeliveryErrorKind::ServerError.is_retryable());
        assert!(DeliveryErrorKind::RateLimited.is_retryable());

        assert!(!DeliveryErrorKind::ClientError.is_retryable());
        assert!(!DeliveryErrorKind::TlsCertificate.is_retryable());
        assert!(!DeliveryErrorKind::MalformedPayload.is_retryable());
        assert!(!DeliveryErrorKind::CircuitOpen.is_retryable());
        assert!(!DeliveryErrorKind::UnknownChannel.is_retryable());
        assert!(!DeliveryErrorKind::TaskFailure.is_retryable());
    }

    #[test]
    fn delivery_error_display_includes_kind() {
        let err = DeliveryError::new(DeliveryErrorKind::ServerError, "502 from webhook");
        assert_eq!(err.to_string(), "server error: 502 from webhook");
    }

    #[test]
    fn delivery_error_carries_source() {
        let io = std::io::Error::other("boom");
        let err = DeliveryError::new(DeliveryErrorKind::ConnectionRefused, "connect").with_source(io);
        assert!(std::error::Error::source(&err).is_some());
    }
}

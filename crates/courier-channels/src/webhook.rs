// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-webhook delivery channel.
//!
//! Posts a JSON payload to a chat platform's incoming-webhook URL and
//! classifies failures for the retry handler. TLS failures are surfaced as
//! [`DeliveryErrorKind::TlsCertificate`] so they are never retried.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use courier_core::error::{DeliveryError, DeliveryErrorKind};
use courier_core::traits::DeliveryService;
use courier_core::types::OutboundNotification;

/// Delivers notifications to a chat incoming-webhook endpoint.
pub struct WebhookChannel {
    name: String,
    client: Client,
    url: String,
}

impl WebhookChannel {
    pub fn new(name: impl Into<String>, client: Client, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DeliveryService for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, msg: &OutboundNotification) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "text": format!("*{}*\n{}", msg.subject, msg.body),
            "priority": msg.priority.to_string(),
            "recipients": msg.recipients,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(channel = %self.name, %status, "webhook accepted notification");
            return Ok(());
        }

        Err(classify_status(status))
    }
}

/// Map an HTTP status to a delivery error classification.
fn classify_status(status: StatusCode) -> DeliveryError {
    let kind = if status == StatusCode::TOO_MANY_REQUESTS {
        DeliveryErrorKind::RateLimited
    } else if status.is_server_error() {
        DeliveryErrorKind::ServerError
    } else {
        DeliveryErrorKind::ClientError
    };
    DeliveryError::new(kind, format!("webhook returned {status}"))
}

/// Map a reqwest transport error to a delivery error classification.
///
/// TLS problems hide behind the connect error, so the source chain is
/// inspected before falling back to the connection-refused class.
fn classify_transport_error(err: reqwest::Error) -> DeliveryError {
    let kind = if err.is_timeout() {
        DeliveryErrorKind::Timeout
    } else if is_tls_error(&err) {
        DeliveryErrorKind::TlsCertificate
    } else if err.is_connect() {
        DeliveryErrorKind::ConnectionRefused
    } else if err.is_body() || err.is_request() {
        DeliveryErrorKind::MalformedPayload
    } else {
        DeliveryErrorKind::ServerError
    };
    DeliveryError::new(kind, err.to_string()).with_source(err)
}

fn is_tls_error(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        let text = current.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return true;
        }
        source = current.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    use courier_core::types::Priority;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn msg() -> OutboundNotification {
        OutboundNotification {
            subject: "deploy failed".into(),
            body: "rollback initiated".into(),
            priority: Priority::High,
            notification_type: "alert".into(),
            recipients: vec!["#ops".into()],
        }
    }

    async fn channel_for(server: &MockServer) -> WebhookChannel {
        WebhookChannel::new("chat", Client::new(), server.uri())
    }

    #[tokio::test]
    async fn posts_formatted_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("deploy failed"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let channel = channel_for(&server).await;
        channel.deliver(&msg()).await.unwrap();
    }

    #[tokio::test]
    async fn rate_limit_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = channel_for(&server).await.deliver(&msg()).await.unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::RateLimited);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = channel_for(&server).await.deliver(&msg()).await.unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::ServerError);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn client_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = channel_for(&server).await.deliver(&msg()).await.unwrap_err();
        assert_eq!(err.kind, DeliveryErrorKind::ClientError);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn refused_connection_is_retryable() {
        let channel = WebhookChannel::new("chat", Client::new(), "http://127.0.0.1:9/hook");
        let err = channel.deliver(&msg()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS).kind,
            DeliveryErrorKind::RateLimited
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY).kind,
            DeliveryErrorKind::ServerError
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN).kind,
            DeliveryErrorKind::ClientError
        );
    }
}

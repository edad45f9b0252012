//! HTTP reporting transport.
//!
//! The transport is deliberately thin: one POST per call, no retry, no
//! interpretation of the status code. Retry policy belongs to the callers
//! (the match workflow retries, the command dispatcher does not).
//!
//! Any HTTP response, whatever its status code, counts as delivered. Only
//! the absence of a response is a [`TransportError`].

use std::future::Future;
use std::time::Duration;

use fingerlink_core::constants::{DEFAULT_REPORT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_MS};
use serde::Deserialize;
use tracing::{debug, trace, warn};

use crate::error::TransportError;

/// Response of a delivered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// JSON-over-HTTP POST capability.
pub trait HttpTransport: Send + Sync {
    /// POST `body` as JSON to `path`, relative to the reporting server.
    fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// Configuration of the reporting server connection.
///
/// # Example
///
/// ```
/// use fingerlink_network::TransportConfig;
///
/// let config = TransportConfig {
///     base_url: "http://10.0.0.2:8080".to_string(),
///     ..TransportConfig::default()
/// };
/// assert_eq!(config.url("/enroll/status"), "http://10.0.0.2:8080/enroll/status");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Scheme, host and port of the reporting server.
    pub base_url: String,

    /// Timeout of one request; an expired request counts as no response.
    pub request_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REPORT_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl TransportConfig {
    /// Join the base URL and an absolute path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the base URL is not
    /// `http`/`https`, or [`TransportError::Client`] if the client cannot be
    /// built.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(TransportError::InvalidUrl(config.base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.config.url(path);
        trace!(%url, %body, "POST");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "POST got no response");
                TransportError::no_response(&url, e.to_string())
            })?;

        let status = response.status().as_u16();
        // A body that cannot be read still means the server answered.
        let body = response.text().await.unwrap_or_default();
        debug!(%url, status, "POST delivered");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join_trims_trailing_slash() {
        let config = TransportConfig {
            base_url: "http://host:8080/".to_string(),
            ..TransportConfig::default()
        };
        assert_eq!(config.url("/drivers/7"), "http://host:8080/drivers/7");
    }

    #[test]
    fn test_rejects_non_http_base() {
        let config = TransportConfig {
            base_url: "mqtt://host:1883".to_string(),
            ..TransportConfig::default()
        };
        assert!(matches!(
            ReqwestTransport::new(config),
            Err(TransportError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_no_response() {
        // Bind and drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(TransportConfig {
            base_url: format!("http://{addr}"),
            request_timeout_ms: 1_000,
        })
        .unwrap();

        let result = transport
            .post_json("/drivers/7", serde_json::json!({"id": 7}))
            .await;
        assert!(matches!(result, Err(TransportError::NoResponse { .. })));
    }

    #[tokio::test]
    async fn test_any_status_counts_as_delivered() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Headers and the JSON body end with the closing brace.
            while !request.ends_with(b"}") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let reply = "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\nconnection: close\r\n\r\noops";
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        let transport = ReqwestTransport::new(TransportConfig {
            base_url: format!("http://{addr}"),
            request_timeout_ms: 2_000,
        })
        .unwrap();

        let response = transport
            .post_json("/drivers/7", serde_json::json!({"id": 7}))
            .await
            .unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.body, "oops");
    }
}

use fingerlink_core::RestartReason;
use thiserror::Error;

/// Errors from the connectivity lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// Recovery gave up and a restart is pending.
    #[error("Connectivity escalated: {0}")]
    Escalated(RestartReason),

    /// The link could not be brought up at boot.
    #[error("Provisioning failed")]
    ProvisioningFailed,
}

/// Errors from the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request got no HTTP response at all (connect error, reset, timeout).
    #[error("No response from {url}: {message}")]
    NoResponse { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The configured base URL is unusable.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    pub fn no_response(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NoResponse {
            url: url.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = NetworkError::Escalated(RestartReason::ConnectivityEscalation);
        assert_eq!(
            error.to_string(),
            "Connectivity escalated: connectivity escalation"
        );

        let error = TransportError::no_response("http://host/drivers/7", "connection refused");
        assert_eq!(
            error.to_string(),
            "No response from http://host/drivers/7: connection refused"
        );
    }
}

use std::sync::Arc;

use fingerlink_hardware::Notifier;
use fingerlink_network::{
    ConnectivityGuard, HttpResponse, HttpTransport, StatusEndpoint, StatusReport, WifiLink,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::ReportError;

/// Network access shared by the match loop and the command dispatcher.
///
/// Every request first goes through
/// [`ConnectivityGuard::ensure_connected`], so nothing is posted while the
/// link is down.
pub struct Reporter<L, N, T> {
    guard: Arc<ConnectivityGuard<L, N>>,
    transport: T,
}

impl<L: WifiLink, N: Notifier, T: HttpTransport> Reporter<L, N, T> {
    pub fn new(guard: Arc<ConnectivityGuard<L, N>>, transport: T) -> Self {
        Self { guard, transport }
    }

    pub fn guard(&self) -> &Arc<ConnectivityGuard<L, N>> {
        &self.guard
    }

    /// Make sure the link is up, then POST once.
    pub async fn post(&self, path: &str, body: Value) -> Result<HttpResponse, ReportError> {
        self.guard.ensure_connected().await?;
        Ok(self.transport.post_json(path, body).await?)
    }

    /// Post a status report once; a lost report is logged, not retried.
    pub async fn send_status(&self, endpoint: StatusEndpoint, report: &StatusReport) -> bool {
        match self.post(endpoint.path(), report.body()).await {
            Ok(response) => {
                info!(
                    path = endpoint.path(),
                    id = %report.id,
                    status = response.status,
                    "Status report delivered"
                );
                true
            }
            Err(e) => {
                warn!(path = endpoint.path(), id = %report.id, error = %e, "Status report lost");
                false
            }
        }
    }
}

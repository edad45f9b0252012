//! Network layer for the Fingerlink node.
//!
//! This crate owns everything that talks to the outside world over the
//! network link: the connectivity lifecycle with its bounded recovery and
//! destructive escalation, the boot barrier that holds the other units back
//! until the first connection, and the HTTP reporting transport.
//!
//! # Components
//!
//! - **ConnectivityGuard**: connects at boot, re-associates dropped links and
//!   escalates to a credential wipe plus restart after repeated failures.
//! - **BootBarrier**: one-shot gate opened after the first connection.
//! - **HttpTransport**: POSTs JSON reports; [`ReqwestTransport`] is the real
//!   implementation.
//! - **Reports**: payloads and endpoints of status and match reports.
//!
//! # Example
//!
//! ```no_run
//! use fingerlink_network::{ReqwestTransport, TransportConfig, HttpTransport, MatchReport};
//! use fingerlink_core::{ReportVariant, TemplateId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::new(TransportConfig::default())?;
//! let report = MatchReport::new(TemplateId::new(7), ReportVariant::Normal);
//! let response = transport.post_json(&report.path(), report.body()).await?;
//! println!("server answered {}", response.status);
//! # Ok(())
//! # }
//! ```

mod connectivity;
mod error;
mod http;
mod link;
pub mod mock;
mod report;

pub use connectivity::{
    BootBarrier, ConnectivityConfig, ConnectivityGuard, RestartListener, RestartRequester,
    restart_channel,
};
pub use error::{NetworkError, Result, TransportError};
pub use http::{HttpResponse, HttpTransport, ReqwestTransport, TransportConfig};
pub use link::WifiLink;
pub use report::{DriverResponse, MatchReport, ReportStatus, StatusEndpoint, StatusReport};

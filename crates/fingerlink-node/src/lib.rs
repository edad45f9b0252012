//! Coordination core of a Fingerlink access-control node.
//!
//! Three long-running units share one fingerprint sensor and one network
//! link:
//!
//! - the **connectivity unit** brings the link up at boot and keeps it up,
//!   escalating to a credential wipe and restart when it cannot;
//! - the **command unit** serves enroll, delete and reset commands from a
//!   publish/subscribe transport and reports their outcome over HTTP;
//! - the **match unit** scans continuously and reports every recognized
//!   finger, optionally as an "OFF" event armed by the toggle button.
//!
//! The command and match units start only once the first connection is up.
//! Both go through an [`OperationLock`] before touching the sensor, so
//! sensor protocols never interleave.
//!
//! # Example
//!
//! ```no_run
//! use fingerlink_hardware::LogNotifier;
//! use fingerlink_hardware::mock::{MockButton, MockSensor};
//! use fingerlink_network::mock::MockLink;
//! use fingerlink_network::{ReqwestTransport, TransportConfig};
//! use fingerlink_node::{InboundMessage, Node, NodeConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NodeConfig::load("fingerlink.toml")?;
//! let (sensor, _) = MockSensor::new();
//! let (button, _) = MockButton::new();
//! let (link, _) = MockLink::new();
//! let (_tx, commands) = tokio::sync::mpsc::channel::<InboundMessage>(16);
//!
//! let reason = Node::builder()
//!     .sensor(sensor)
//!     .button(button)
//!     .link(link)
//!     .notifier(LogNotifier::new())
//!     .transport(ReqwestTransport::new(config.endpoints.clone())?)
//!     .commands(commands)
//!     .config(config)
//!     .build()?
//!     .run()
//!     .await?;
//! println!("restart: {reason}");
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod deletion;
pub mod dispatcher;
pub mod enrollment;
pub mod error;
pub mod lock;
pub mod matcher;
pub mod phase;
pub mod reporter;
pub mod runtime;
pub mod toggle;

mod stage;

// Re-exports
pub use command::{CommandSource, InboundMessage, TopicMap};
pub use config::NodeConfig;
pub use deletion::DeletionWorkflow;
pub use dispatcher::{CommandConfig, CommandDispatcher};
pub use enrollment::{EnrollmentConfig, EnrollmentWorkflow};
pub use error::{NodeError, ReportError, Result};
pub use lock::{OperationLock, SensorGuard};
pub use matcher::{CycleOutcome, MatchConfig, MatchWorkflow};
pub use phase::{MatchPhase, PhaseTracker, PhaseTransition};
pub use reporter::Reporter;
pub use runtime::{Node, NodeBuilder};
pub use toggle::{Edge, EdgeDetector, OffToggle};

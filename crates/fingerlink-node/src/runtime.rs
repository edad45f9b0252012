//! Node supervisor.
//!
//! # Lifecycle
//!
//! 1. Check the sensor handshake and log its diagnostics
//! 2. Spawn the connectivity unit, which connects and then monitors the link
//! 3. Spawn the command and match units; both wait on the boot barrier
//! 4. Wait for a restart request, abort every unit and return the reason
//!
//! There is no graceful shutdown. The caller restarts by building a new
//! node from fresh devices.

use std::sync::Arc;

use fingerlink_core::{Error as CoreError, RestartReason};
use fingerlink_hardware::{BiometricDevice, ButtonInput, Notifier, Screen};
use fingerlink_network::{
    BootBarrier, ConnectivityGuard, HttpTransport, RestartListener, WifiLink, restart_channel,
};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::command::CommandSource;
use crate::config::NodeConfig;
use crate::deletion::DeletionWorkflow;
use crate::dispatcher::CommandDispatcher;
use crate::enrollment::EnrollmentWorkflow;
use crate::error::{NodeError, Result};
use crate::lock::OperationLock;
use crate::matcher::MatchWorkflow;
use crate::reporter::Reporter;
use crate::toggle::OffToggle;

/// Unit names, used in logs.
const CONNECTIVITY_UNIT: &str = "connectivity";
const COMMAND_UNIT: &str = "commands";
const MATCH_UNIT: &str = "match";

/// A fully wired node, ready to run.
///
/// # Examples
///
/// ```no_run
/// use fingerlink_hardware::mock::{MockButton, MockSensor};
/// use fingerlink_hardware::LogNotifier;
/// use fingerlink_network::mock::{MockLink, MockTransport};
/// use fingerlink_node::{InboundMessage, Node, NodeConfig};
///
/// # async fn example() -> fingerlink_node::Result<()> {
/// let (sensor, _) = MockSensor::new();
/// let (button, _) = MockButton::new();
/// let (link, _) = MockLink::new();
/// let (transport, _) = MockTransport::new();
/// let (_tx, commands) = tokio::sync::mpsc::channel::<InboundMessage>(16);
///
/// let node = Node::builder()
///     .sensor(sensor)
///     .button(button)
///     .link(link)
///     .notifier(LogNotifier::new())
///     .transport(transport)
///     .commands(commands)
///     .config(NodeConfig::default())
///     .build()?;
///
/// let reason = node.run().await?;
/// println!("restart requested: {reason}");
/// # Ok(())
/// # }
/// ```
pub struct Node<S, B, L, N, T, C> {
    sensor: S,
    button: B,
    link: L,
    notifier: Arc<N>,
    transport: T,
    commands: C,
    config: NodeConfig,
}

/// Collects the devices of a [`Node`].
pub struct NodeBuilder<S, B, L, N, T, C> {
    sensor: Option<S>,
    button: Option<B>,
    link: Option<L>,
    notifier: Option<Arc<N>>,
    transport: Option<T>,
    commands: Option<C>,
    config: NodeConfig,
}

impl<S, B, L, N, T, C> Node<S, B, L, N, T, C> {
    pub fn builder() -> NodeBuilder<S, B, L, N, T, C> {
        NodeBuilder {
            sensor: None,
            button: None,
            link: None,
            notifier: None,
            transport: None,
            commands: None,
            config: NodeConfig::default(),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

impl<S, B, L, N, T, C> NodeBuilder<S, B, L, N, T, C> {
    pub fn sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }

    pub fn button(mut self, button: B) -> Self {
        self.button = Some(button);
        self
    }

    pub fn link(mut self, link: L) -> Self {
        self.link = Some(link);
        self
    }

    pub fn notifier(self, notifier: N) -> Self {
        self.shared_notifier(Arc::new(notifier))
    }

    /// Use a notifier the caller keeps a handle to.
    pub fn shared_notifier(mut self, notifier: Arc<N>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn commands(mut self, commands: C) -> Self {
        self.commands = Some(commands);
        self
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the configuration and check every device was given.
    pub fn build(self) -> Result<Node<S, B, L, N, T, C>> {
        self.config.validate()?;
        Ok(Node {
            sensor: required(self.sensor, "sensor")?,
            button: required(self.button, "button")?,
            link: required(self.link, "link")?,
            notifier: required(self.notifier, "notifier")?,
            transport: required(self.transport, "transport")?,
            commands: required(self.commands, "command source")?,
            config: self.config,
        })
    }
}

fn required<X>(part: Option<X>, name: &str) -> std::result::Result<X, CoreError> {
    part.ok_or_else(|| CoreError::Config(format!("node built without a {name}")))
}

impl<S, B, L, N, T, C> Node<S, B, L, N, T, C>
where
    S: BiometricDevice + 'static,
    B: ButtonInput + 'static,
    L: WifiLink + 'static,
    N: Notifier + 'static,
    T: HttpTransport + 'static,
    C: CommandSource + 'static,
{
    /// Boot the node and supervise it until a restart is requested.
    ///
    /// # Errors
    ///
    /// [`NodeError::SensorUnavailable`] if the sensor fails its handshake;
    /// nothing is spawned in that case. [`NodeError::Stopped`] if every unit
    /// ended without asking for a restart.
    pub async fn run(self) -> Result<RestartReason> {
        let Node {
            mut sensor,
            button,
            link,
            notifier,
            transport,
            commands,
            config,
        } = self;

        check_sensor(&mut sensor, &*notifier).await?;

        let (requester, restarts) = restart_channel();
        let guard = Arc::new(ConnectivityGuard::new(
            link,
            Arc::clone(&notifier),
            requester,
            config.connectivity.clone(),
        ));
        let barrier = BootBarrier::new();
        let lock = Arc::new(OperationLock::new(sensor));
        let reporter = Arc::new(Reporter::new(Arc::clone(&guard), transport));
        let toggle = Arc::new(OffToggle::new());

        let dispatcher = CommandDispatcher::new(
            EnrollmentWorkflow::new(
                Arc::clone(&lock),
                Arc::clone(&notifier),
                config.enrollment.clone(),
            ),
            DeletionWorkflow::new(Arc::clone(&lock)),
            Arc::clone(&reporter),
            Arc::clone(&notifier),
            config.topics.clone(),
            config.commands.clone(),
        );
        let matcher = MatchWorkflow::new(
            lock,
            button,
            toggle,
            reporter,
            notifier,
            config.matching.clone(),
        );

        let mut units = JoinSet::new();

        let open = barrier.clone();
        units.spawn(async move {
            if guard.connect().await.is_ok() {
                open.open();
                guard.supervise().await;
            }
            CONNECTIVITY_UNIT
        });

        let gate = barrier.clone();
        units.spawn(async move {
            gate.wait().await;
            dispatcher.run(commands).await;
            COMMAND_UNIT
        });

        units.spawn(async move {
            barrier.wait().await;
            matcher.run().await;
            MATCH_UNIT
        });

        info!("Node units started");
        let reason = supervise(&mut units, restarts).await;

        units.abort_all();
        while units.join_next().await.is_some() {}

        match reason {
            Some(reason) => {
                warn!(%reason, "Node stopped for restart");
                Ok(reason)
            }
            None => Err(NodeError::Stopped),
        }
    }
}

/// Wait for a restart request while watching the units.
async fn supervise(
    units: &mut JoinSet<&'static str>,
    mut restarts: RestartListener,
) -> Option<RestartReason> {
    loop {
        tokio::select! {
            reason = restarts.wait() => return reason,
            joined = units.join_next() => match joined {
                Some(result) => log_unit_exit(result),
                // Everything ended; take a request raised on the way out.
                None => return restarts.try_take(),
            },
        }
    }
}

fn log_unit_exit(result: std::result::Result<&'static str, JoinError>) {
    match result {
        Ok(unit) => info!(unit, "Node unit finished"),
        Err(e) if e.is_panic() => error!(error = %e, "Node unit panicked"),
        Err(e) => warn!(error = %e, "Node unit cancelled"),
    }
}

/// Handshake with the sensor and log what it reports.
async fn check_sensor<S: BiometricDevice, N: Notifier>(sensor: &mut S, notifier: &N) -> Result<()> {
    if let Err(status) = sensor.verify_password().await {
        error!(%status, "Fingerprint sensor handshake failed");
        notifier.show(Screen::new(["Sensor FP error", "verifyPassword() fail"]));
        return Err(NodeError::SensorUnavailable(status));
    }
    info!("Fingerprint sensor found");

    match sensor.read_parameters().await {
        Ok(parameters) => info!(
            status_register = %format!("{:#06x}", parameters.status_register),
            system_id = %format!("{:#06x}", parameters.system_id),
            capacity = parameters.capacity,
            security_level = parameters.security_level,
            device_address = %format!("{:#010x}", parameters.device_address),
            packet_len = parameters.packet_len,
            baud_rate = parameters.baud_rate,
            "Sensor parameters"
        ),
        Err(status) => warn!(%status, "Could not read sensor parameters"),
    }

    match sensor.template_count().await {
        Ok(count) => info!(templates = count, "Sensor library loaded"),
        Err(status) => warn!(%status, "Could not read template count"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerlink_core::TemplateId;
    use fingerlink_hardware::StatusCode;
    use fingerlink_hardware::mock::{MockButton, MockSensor, MockSensorHandle, RecordingNotifier};
    use fingerlink_network::mock::{MockLink, MockLinkHandle, MockTransport, MockTransportHandle};
    use tokio::sync::mpsc;

    use crate::command::InboundMessage;

    type TestNode = Node<
        MockSensor,
        MockButton,
        MockLink,
        RecordingNotifier,
        MockTransport,
        mpsc::Receiver<InboundMessage>,
    >;

    struct Rig {
        node: TestNode,
        sensor: MockSensorHandle,
        link: MockLinkHandle,
        http: MockTransportHandle,
        notifier: Arc<RecordingNotifier>,
        tx: mpsc::Sender<InboundMessage>,
    }

    fn rig() -> Rig {
        let (sensor, sensor_handle) = MockSensor::new();
        let (button, _) = MockButton::new();
        let (link, link_handle) = MockLink::new();
        let (transport, http_handle) = MockTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let (tx, rx) = mpsc::channel(8);

        let node = Node::builder()
            .sensor(sensor)
            .button(button)
            .link(link)
            .shared_notifier(Arc::clone(&notifier))
            .transport(transport)
            .commands(rx)
            .build()
            .unwrap();

        Rig {
            node,
            sensor: sensor_handle,
            link: link_handle,
            http: http_handle,
            notifier,
            tx,
        }
    }

    #[test]
    fn test_build_requires_every_device() {
        let (sensor, _) = MockSensor::new();
        let result = Node::<
            MockSensor,
            MockButton,
            MockLink,
            RecordingNotifier,
            MockTransport,
            mpsc::Receiver<InboundMessage>,
        >::builder()
        .sensor(sensor)
        .build();

        let Err(error) = result else {
            panic!("node built without a button");
        };
        assert!(error.to_string().contains("button"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sensor_handshake_failure_stops_boot() {
        let rig = rig();
        rig.sensor.set_password_ok(false);

        let error = rig.node.run().await.unwrap_err();

        assert!(matches!(error, NodeError::SensorUnavailable(_)));
        assert!(rig.notifier.saw_screen("verifyPassword() fail"));
        assert_eq!(rig.link.auto_connect_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parameter_failure_is_not_fatal() {
        let rig = rig();
        rig.sensor.set_parameters(Err(StatusCode::PacketReceive));
        rig.link.queue_auto_connect(false);

        let reason = rig.node.run().await.unwrap();

        assert_eq!(reason, RestartReason::ProvisioningFailed);
        assert!(!rig.link.credentials_cleared());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_reset_returns_reason() {
        let rig = rig();
        let tx = rig.tx.clone();
        tokio::spawn(async move {
            tx.send(InboundMessage::new(
                "fingerprint/resetwifi",
                r#"{"command":"reset","id":0}"#,
            ))
            .await
            .unwrap();
        });

        let reason = rig.node.run().await.unwrap();

        assert_eq!(reason, RestartReason::RemoteReset);
        assert!(rig.link.credentials_cleared());
        assert!(rig.http.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_wait_for_first_connection() {
        let rig = rig();
        rig.sensor.insert_template(TemplateId::new(4));
        // Fails at boot, so the barrier never opens.
        rig.link.queue_auto_connect(false);
        rig.tx
            .send(InboundMessage::new(
                "fingerprint/delete",
                r#"{"command":"delete","id":4}"#,
            ))
            .await
            .unwrap();

        let reason = rig.node.run().await.unwrap();

        assert_eq!(reason, RestartReason::ProvisioningFailed);
        assert!(rig.sensor.has_template(TemplateId::new(4)));
        assert!(rig.http.requests().is_empty());
    }
}

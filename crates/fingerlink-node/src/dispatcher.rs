//! Command dispatcher.
//!
//! | Topic | Command | Action |
//! |-------|---------|--------|
//! | enroll | `enroll` | enroll, then POST `/enroll/status` |
//! | delete | `delete` | delete, then POST `/delete/status` |
//! | reset | `reset` | wait, then wipe credentials and restart |
//!
//! Messages on other topics, payloads that do not decode and commands sent
//! on the wrong topic are dropped. The transport has no way to answer them.

use std::sync::Arc;
use std::time::Duration;

use fingerlink_core::constants::{READY_SCREEN_HOLD_MS, RESET_OBSERVATION_DELAY_MS};
use fingerlink_core::{Command, CommandKind, RestartReason, TemplateId};
use fingerlink_hardware::{BeepPattern, BiometricDevice, Notifier, Screen, SensorResult};
use fingerlink_network::{HttpTransport, StatusEndpoint, StatusReport, WifiLink};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::command::{CommandSource, InboundMessage, TopicMap};
use crate::deletion::DeletionWorkflow;
use crate::enrollment::EnrollmentWorkflow;
use crate::reporter::Reporter;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Pause between the reset notice and the wipe.
    pub reset_delay_ms: u64,

    /// How long `Ready` stays up after an enrollment.
    pub ready_hold_ms: u64,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            reset_delay_ms: RESET_OBSERVATION_DELAY_MS,
            ready_hold_ms: READY_SCREEN_HOLD_MS,
        }
    }
}

/// Turns inbound messages into workflow runs and status reports.
pub struct CommandDispatcher<S, L, N, T> {
    enrollment: EnrollmentWorkflow<S, N>,
    deletion: DeletionWorkflow<S>,
    reporter: Arc<Reporter<L, N, T>>,
    notifier: Arc<N>,
    topics: TopicMap,
    config: CommandConfig,
}

impl<S, L, N, T> CommandDispatcher<S, L, N, T>
where
    S: BiometricDevice,
    L: WifiLink,
    N: Notifier,
    T: HttpTransport,
{
    pub fn new(
        enrollment: EnrollmentWorkflow<S, N>,
        deletion: DeletionWorkflow<S>,
        reporter: Arc<Reporter<L, N, T>>,
        notifier: Arc<N>,
        topics: TopicMap,
        config: CommandConfig,
    ) -> Self {
        Self {
            enrollment,
            deletion,
            reporter,
            notifier,
            topics,
            config,
        }
    }

    pub fn topics(&self) -> &TopicMap {
        &self.topics
    }

    /// Serve messages until the source closes.
    pub async fn run<C: CommandSource>(&self, mut source: C) {
        info!(topics = ?self.topics.all(), "Command channel listening");
        while let Some(message) = source.next_message().await {
            self.handle(&message).await;
        }
        warn!("Command source closed");
    }

    /// Decode and execute one message.
    ///
    /// Returns the executed command, or `None` if the message was dropped.
    pub async fn handle(&self, message: &InboundMessage) -> Option<Command> {
        let Some(kind) = self.topics.route(&message.topic) else {
            debug!(topic = %message.topic, "Ignoring message on unknown topic");
            return None;
        };

        let command = match Command::decode(kind, &message.payload) {
            Ok(command) => command,
            Err(e) => {
                debug!(topic = %message.topic, error = %e, "Dropping command");
                return None;
            }
        };

        match command.kind {
            CommandKind::Enroll => {
                info!(command = %command.kind, id = %command.template_id, "Command received");
                self.enroll(command.template_id).await;
            }
            CommandKind::Delete => {
                info!(command = %command.kind, id = %command.template_id, "Command received");
                self.delete(command.template_id).await;
            }
            CommandKind::Reset => {
                info!(command = %command.kind, "Command received");
                self.reset().await;
            }
        }
        Some(command)
    }

    async fn enroll(&self, id: TemplateId) {
        self.notifier
            .show(Screen::new(["Enroll mode".to_string(), format!("ID: {id}")]));
        let result = self.enrollment.enroll(id).await;
        self.show_result(id, &result, "Fingerprint enrolled", "Enrollment failed");

        self.reporter
            .send_status(StatusEndpoint::Enroll, &StatusReport::from_outcome(id, &result))
            .await;

        let hold = Duration::from_millis(self.config.ready_hold_ms);
        self.notifier.show(Screen::new(["Ready"]).hold(hold));
        sleep(hold).await;
    }

    async fn delete(&self, id: TemplateId) {
        self.notifier
            .show(Screen::new(["Delete mode".to_string(), format!("ID: {id}")]));
        let result = self.deletion.delete(id).await;
        self.show_result(id, &result, "Fingerprint deleted", "Deletion failed");

        self.reporter
            .send_status(StatusEndpoint::Delete, &StatusReport::from_outcome(id, &result))
            .await;
    }

    async fn reset(&self) {
        warn!("Remote connectivity reset requested");
        self.notifier.show(Screen::new(["Reset WiFi via command"]));
        sleep(Duration::from_millis(self.config.reset_delay_ms)).await;
        self.reporter
            .guard()
            .escalate(RestartReason::RemoteReset)
            .await;
    }

    fn show_result(&self, id: TemplateId, result: &SensorResult<()>, ok: &str, failed: &str) {
        match result {
            Ok(()) => {
                self.notifier
                    .show(Screen::new([ok.to_string(), format!("ID: {id}")]));
            }
            Err(code) => {
                warn!(%id, status = %code, "{failed}");
                self.notifier
                    .show(Screen::new([failed.to_string(), format!("ID: {id}")]));
                self.notifier.beep(BeepPattern::Failure);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::EnrollmentConfig;
    use crate::lock::OperationLock;
    use fingerlink_core::ConnectivityState;
    use fingerlink_hardware::mock::{MockSensor, MockSensorHandle, RecordingNotifier};
    use fingerlink_network::mock::{MockLink, MockLinkHandle, MockTransport, MockTransportHandle};
    use fingerlink_network::{
        ConnectivityConfig, ConnectivityGuard, RestartListener, restart_channel,
    };
    use rstest::rstest;

    struct Rig {
        dispatcher: CommandDispatcher<MockSensor, MockLink, RecordingNotifier, MockTransport>,
        sensor: MockSensorHandle,
        link: MockLinkHandle,
        http: MockTransportHandle,
        notifier: Arc<RecordingNotifier>,
        restarts: RestartListener,
        guard: Arc<ConnectivityGuard<MockLink, RecordingNotifier>>,
    }

    async fn rig() -> Rig {
        let (sensor, sensor_handle) = MockSensor::new();
        let (link, link_handle) = MockLink::new();
        let (transport, http_handle) = MockTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let (requester, restarts) = restart_channel();

        let guard = Arc::new(ConnectivityGuard::new(
            link,
            Arc::clone(&notifier),
            requester,
            ConnectivityConfig::default(),
        ));
        guard.connect().await.unwrap();
        notifier.clear();

        let lock = Arc::new(OperationLock::new(sensor));
        let dispatcher = CommandDispatcher::new(
            EnrollmentWorkflow::new(
                Arc::clone(&lock),
                Arc::clone(&notifier),
                EnrollmentConfig::default(),
            ),
            DeletionWorkflow::new(lock),
            Arc::new(Reporter::new(Arc::clone(&guard), transport)),
            Arc::clone(&notifier),
            TopicMap::default(),
            CommandConfig::default(),
        );

        Rig {
            dispatcher,
            sensor: sensor_handle,
            link: link_handle,
            http: http_handle,
            notifier,
            restarts,
            guard,
        }
    }

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage::new(topic.to_string(), payload.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_enroll_reports_success() {
        let rig = rig().await;
        rig.sensor.present_finger();
        rig.sensor.present_finger();

        let handled = rig
            .dispatcher
            .handle(&message("fingerprint/enroll", r#"{"command":"enroll","id":5}"#))
            .await;

        assert_eq!(handled.map(|c| c.kind), Some(CommandKind::Enroll));
        assert_eq!(
            rig.http.requests(),
            vec![(
                "/enroll/status".to_string(),
                serde_json::json!({"id": 5, "status": "success"})
            )]
        );
        assert!(rig.notifier.saw_screen("Enroll mode"));
        assert!(rig.notifier.saw_screen("Fingerprint enrolled"));
        assert_eq!(
            rig.notifier.last_screen().unwrap().hold_duration(),
            Duration::from_secs(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_enroll_failure_reports_reason() {
        let rig = rig().await;
        rig.sensor.present_finger();

        rig.dispatcher
            .handle(&message("fingerprint/enroll", r#"{"command":"enroll","id":5}"#))
            .await;

        assert_eq!(
            rig.http.requests()[0].1,
            serde_json::json!({"id": 5, "status": "failed", "reason": "error"})
        );
        assert!(rig.notifier.saw_screen("Enrollment failed"));
        assert_eq!(rig.notifier.count_beeps(BeepPattern::Failure), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_empty_slot_reports_failure() {
        let rig = rig().await;

        rig.dispatcher
            .handle(&message("fingerprint/delete", r#"{"command":"delete","id":9}"#))
            .await;

        assert_eq!(
            rig.http.requests(),
            vec![(
                "/delete/status".to_string(),
                serde_json::json!({"id": 9, "status": "failed", "reason": "error"})
            )]
        );
        assert!(rig.notifier.saw_screen("Deletion failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_success() {
        let rig = rig().await;
        rig.sensor.insert_template(TemplateId::new(9));

        rig.dispatcher
            .handle(&message("fingerprint/delete", r#"{"command":"delete","id":9}"#))
            .await;

        assert!(!rig.sensor.has_template(TemplateId::new(9)));
        assert_eq!(rig.http.requests()[0].1["status"], "success");
        assert!(rig.notifier.saw_screen("Fingerprint deleted"));
    }

    #[rstest]
    #[case::unknown_topic("fingerprint/format", r#"{"command":"enroll","id":1}"#)]
    #[case::not_json("fingerprint/enroll", "enroll 1")]
    #[case::missing_id("fingerprint/enroll", r#"{"command":"enroll"}"#)]
    #[case::wrong_topic("fingerprint/delete", r#"{"command":"enroll","id":1}"#)]
    #[case::reset_on_enroll("fingerprint/enroll", r#"{"command":"reset","id":0}"#)]
    #[tokio::test(start_paused = true)]
    async fn test_malformed_messages_are_dropped(#[case] topic: &str, #[case] payload: &str) {
        let rig = rig().await;

        let handled = rig.dispatcher.handle(&message(topic, payload)).await;

        assert_eq!(handled, None);
        assert!(rig.sensor.calls().is_empty());
        assert!(rig.http.requests().is_empty());
        assert!(rig.notifier.feedback().is_empty());
    }

    #[rstest]
    #[case::bare(r#"{"command":"reset"}"#)]
    #[case::with_id(r#"{"command":"reset","id":0}"#)]
    #[tokio::test(start_paused = true)]
    async fn test_reset_escalates(#[case] payload: &str) {
        let mut rig = rig().await;

        let started = tokio::time::Instant::now();
        let handled = rig
            .dispatcher
            .handle(&message("fingerprint/resetwifi", payload))
            .await;

        assert_eq!(handled.map(|c| c.kind), Some(CommandKind::Reset));
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(rig.notifier.saw_screen("Reset WiFi via command"));
        assert!(rig.link.credentials_cleared());
        assert_eq!(rig.guard.state(), ConnectivityState::Escalated);
        assert_eq!(rig.restarts.try_take(), Some(RestartReason::RemoteReset));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_lost_when_offline() {
        let rig = rig().await;
        rig.http.queue_no_response();
        rig.sensor.insert_template(TemplateId::new(2));

        rig.dispatcher
            .handle(&message("fingerprint/delete", r#"{"command":"delete","id":2}"#))
            .await;

        // One attempt only.
        assert_eq!(rig.http.requests().len(), 1);
        assert!(!rig.sensor.has_template(TemplateId::new(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_source_closes() {
        let rig = rig().await;
        rig.sensor.insert_template(TemplateId::new(1));
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        tx.send(message("fingerprint/delete", r#"{"command":"delete","id":1}"#))
            .await
            .unwrap();
        tx.send(message("noise", "{}")).await.unwrap();
        drop(tx);

        rig.dispatcher.run(rx).await;

        assert_eq!(rig.http.paths(), vec!["/delete/status"]);
    }
}

//! Terminal-driven simulation of the node's peripherals.
//!
//! Each stdin line is one action:
//!
//! | Line | Effect |
//! |------|--------|
//! | `finger` | a finger on the window for the next capture |
//! | `finger <id>` | an enrolled finger matching slot `id` |
//! | `unknown` | a finger that matches nothing |
//! | `press` | press and release the toggle button |
//! | `drop` / `restore` | take the link down or bring it back |
//! | `<topic> <json>` | publish a command message |

use std::sync::Arc;

use fingerlink_core::TemplateId;
use fingerlink_hardware::mock::{MockButton, MockButtonHandle, MockSensor, MockSensorHandle};
use fingerlink_network::mock::{MockLink, MockLinkHandle};
use fingerlink_node::{CommandSource, InboundMessage};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Finger(Option<TemplateId>),
    Unknown,
    Press,
    DropLink,
    RestoreLink,
    Publish(InboundMessage),
}

impl Action {
    /// Parse one line. Blank lines and `#` comments give `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let action = match (word, rest) {
            ("finger", "") => Action::Finger(None),
            ("finger", id) => {
                let id: u8 = id
                    .parse()
                    .map_err(|_| format!("template id must be 0-255, got {id:?}"))?;
                Action::Finger(Some(TemplateId::new(id)))
            }
            ("unknown", "") => Action::Unknown,
            ("press", "") => Action::Press,
            ("drop", "") => Action::DropLink,
            ("restore", "") => Action::RestoreLink,
            (topic, payload) if topic.contains('/') => {
                Action::Publish(InboundMessage::new(topic.to_string(), payload.to_string()))
            }
            _ => return Err(format!("unrecognized input {line:?}")),
        };
        Ok(Some(action))
    }
}

/// Peripherals that outlive a node restart.
pub struct Simulation {
    sensor: MockSensorHandle,
    button: MockButtonHandle,
    link: MockLinkHandle,
    publish: mpsc::Sender<InboundMessage>,
    commands: SharedSource,
}

impl Simulation {
    pub fn new() -> Self {
        let (_, sensor) = MockSensor::new();
        let (_, button) = MockButton::new();
        let (_, link) = MockLink::new();
        let (publish, rx) = mpsc::channel(32);

        Self {
            sensor,
            button,
            link,
            publish,
            commands: SharedSource::new(rx),
        }
    }

    /// Fresh devices for the next boot, attached to the same state.
    pub fn devices(&self) -> (MockSensor, MockButton, MockLink, SharedSource) {
        (
            self.sensor.device(),
            self.button.device(),
            self.link.device(),
            self.commands.clone(),
        )
    }

    pub async fn apply(&self, action: Action) {
        debug!(?action, "Simulated input");
        match action {
            Action::Finger(Some(id)) => self.sensor.present_enrolled(id),
            Action::Finger(None) => self.sensor.present_finger(),
            Action::Unknown => self.sensor.present_unknown(),
            Action::Press => self.button.press(),
            Action::DropLink => self.link.drop_link(),
            Action::RestoreLink => self.link.restore_link(),
            Action::Publish(message) => {
                info!(topic = %message.topic, "Publishing command");
                // The receiver lives in `self`, so the channel stays open.
                let _ = self.publish.send(message).await;
            }
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Command source shared by every node generation.
#[derive(Clone)]
pub struct SharedSource {
    rx: Arc<Mutex<mpsc::Receiver<InboundMessage>>>,
}

impl SharedSource {
    fn new(rx: mpsc::Receiver<InboundMessage>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

impl CommandSource for SharedSource {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.rx.lock().await.recv().await
    }
}

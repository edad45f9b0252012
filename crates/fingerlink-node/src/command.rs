//! Inbound command messages.
//!
//! The node is fed by any publish/subscribe transport. The transport only
//! has to deliver `(topic, payload)` pairs through a [`CommandSource`];
//! routing and decoding happen here.

use std::future::Future;

use bytes::Bytes;
use fingerlink_core::CommandKind;
use fingerlink_core::constants::{DEFAULT_DELETE_TOPIC, DEFAULT_ENROLL_TOPIC, DEFAULT_RESET_TOPIC};
use serde::Deserialize;
use tokio::sync::mpsc;

/// One message received from the command transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Stream of inbound messages.
pub trait CommandSource: Send {
    /// Next message, or `None` once the transport is closed for good.
    fn next_message(&mut self) -> impl Future<Output = Option<InboundMessage>> + Send;
}

impl CommandSource for mpsc::Receiver<InboundMessage> {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.recv().await
    }
}

impl CommandSource for mpsc::UnboundedReceiver<InboundMessage> {
    async fn next_message(&mut self) -> Option<InboundMessage> {
        self.recv().await
    }
}

/// Topic subscribed for each command kind.
///
/// # Example
///
/// ```
/// use fingerlink_node::TopicMap;
/// use fingerlink_core::CommandKind;
///
/// let topics = TopicMap::default();
/// assert_eq!(topics.route("fingerprint/resetwifi"), Some(CommandKind::Reset));
/// assert_eq!(topics.route("fingerprint/other"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopicMap {
    pub enroll: String,
    pub delete: String,
    pub reset: String,
}

impl Default for TopicMap {
    fn default() -> Self {
        Self {
            enroll: DEFAULT_ENROLL_TOPIC.to_string(),
            delete: DEFAULT_DELETE_TOPIC.to_string(),
            reset: DEFAULT_RESET_TOPIC.to_string(),
        }
    }
}

impl TopicMap {
    /// Command kind carried by `topic`.
    pub fn route(&self, topic: &str) -> Option<CommandKind> {
        if topic == self.enroll {
            Some(CommandKind::Enroll)
        } else if topic == self.delete {
            Some(CommandKind::Delete)
        } else if topic == self.reset {
            Some(CommandKind::Reset)
        } else {
            None
        }
    }

    pub fn topic(&self, kind: CommandKind) -> &str {
        match kind {
            CommandKind::Enroll => &self.enroll,
            CommandKind::Delete => &self.delete,
            CommandKind::Reset => &self.reset,
        }
    }

    /// Topics to subscribe to.
    pub fn all(&self) -> [&str; 3] {
        [&self.enroll, &self.delete, &self.reset]
    }
}

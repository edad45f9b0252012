use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a template slot in the sensor's own store.
///
/// The node never owns the template itself; it only issues create and
/// delete operations against the slot. Range checks against the sensor
/// capacity are left to the sensor, which answers with a bad-location code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(u8);

impl TemplateId {
    pub const fn new(id: u8) -> Self {
        TemplateId(id)
    }

    /// Get the raw slot number.
    #[must_use]
    pub fn as_u8(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for TemplateId {
    fn from(id: u8) -> Self {
        TemplateId(id)
    }
}

/// Kind of inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Create a template at the given slot.
    Enroll,
    /// Delete the template at the given slot.
    Delete,
    /// Wipe connectivity credentials and restart into provisioning.
    Reset,
}

impl CommandKind {
    /// Wire name used in the `command` field of inbound payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Enroll => "enroll",
            CommandKind::Delete => "delete",
            CommandKind::Reset => "reset",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "enroll" => Ok(CommandKind::Enroll),
            "delete" => Ok(CommandKind::Delete),
            "reset" => Ok(CommandKind::Reset),
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

/// A decoded inbound command, consumed once by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub template_id: TemplateId,
}

impl Command {
    #[must_use]
    pub fn new(kind: CommandKind, template_id: TemplateId) -> Self {
        Self { kind, template_id }
    }

    /// Decode a JSON payload received on the topic routed to `kind`.
    ///
    /// The payload must name the same command as its topic. Unknown fields
    /// are ignored. `reset` needs no `id`; any id it carries is ignored and
    /// the command targets slot 0.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCommand`] if the payload is not a JSON object with a
    ///   string `command`, or if an `enroll`/`delete` lacks an `id` in
    ///   `0..=255`
    /// - [`Error::UnknownCommand`] if `command` names no known command
    /// - [`Error::TopicMismatch`] if `command` names another command
    ///
    /// # Example
    ///
    /// ```
    /// use fingerlink_core::{Command, CommandKind, TemplateId};
    ///
    /// let command = Command::decode(CommandKind::Enroll, br#"{"command":"enroll","id":5}"#).unwrap();
    /// assert_eq!(command, Command::new(CommandKind::Enroll, TemplateId::new(5)));
    ///
    /// assert!(Command::decode(CommandKind::Delete, br#"{"command":"enroll","id":5}"#).is_err());
    ///
    /// let reset = Command::decode(CommandKind::Reset, br#"{"command":"reset"}"#).unwrap();
    /// assert_eq!(reset.kind, CommandKind::Reset);
    /// ```
    pub fn decode(kind: CommandKind, payload: &[u8]) -> Result<Self> {
        let raw: RawCommand = serde_json::from_slice(payload)
            .map_err(|e| Error::InvalidCommand(e.to_string()))?;

        let named: CommandKind = raw.command.parse()?;
        if named != kind {
            return Err(Error::TopicMismatch {
                topic: kind.to_string(),
                command: raw.command,
            });
        }

        let template_id = match (kind, raw.id) {
            (CommandKind::Reset, _) => TemplateId::new(0),
            (_, Some(id)) => id,
            (_, None) => {
                return Err(Error::InvalidCommand(format!(
                    "`{kind}` requires an `id`"
                )));
            }
        };

        Ok(Self::new(kind, template_id))
    }
}

/// Wire shape of an inbound command payload.
#[derive(Debug, Deserialize)]
struct RawCommand {
    command: String,
    #[serde(default)]
    id: Option<TemplateId>,
}

/// Variant of a match report.
///
/// An `Off` report is produced when the user pressed the toggle button
/// before presenting the finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportVariant {
    #[default]
    Normal,
    Off,
}

impl ReportVariant {
    #[must_use]
    pub fn is_off(&self) -> bool {
        matches!(self, ReportVariant::Off)
    }
}

/// Connectivity state owned by the connectivity guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Recovery gave up; credentials are being wiped and a restart is pending.
    Escalated,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ConnectivityState::Disconnected => "Disconnected",
            ConnectivityState::Connecting => "Connecting",
            ConnectivityState::Connected => "Connected",
            ConnectivityState::Escalated => "Escalated",
        };
        f.write_str(s)
    }
}

/// Why the node asked to be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartReason {
    /// The boot connection failed and provisioning did not complete.
    ProvisioningFailed,
    /// Reconnection retries were exhausted; credentials were wiped.
    ConnectivityEscalation,
    /// A remote reset command wiped the credentials.
    RemoteReset,
}

impl RestartReason {
    /// Whether stored credentials are wiped before this restart.
    #[must_use]
    pub fn clears_credentials(&self) -> bool {
        !matches!(self, RestartReason::ProvisioningFailed)
    }
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RestartReason::ProvisioningFailed => "provisioning failed",
            RestartReason::ConnectivityEscalation => "connectivity escalation",
            RestartReason::RemoteReset => "remote reset",
        };
        f.write_str(s)
    }
}

/// Workflow currently holding the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Enrollment,
    Deletion,
    Match,
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Workflow::Enrollment => "enrollment",
            Workflow::Deletion => "deletion",
            Workflow::Match => "match",
        };
        f.write_str(s)
    }
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Command errors
    #[error("Invalid command payload: {0}")]
    InvalidCommand(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {command} does not belong on topic {topic}")]
    TopicMismatch { topic: String, command: String },

    // State errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = Error::TopicMismatch {
            topic: "fingerprint/delete".to_string(),
            command: "enroll".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Command enroll does not belong on topic fingerprint/delete"
        );

        let error = Error::InvalidStateTransition {
            from: "Idle".to_string(),
            to: "Reporting".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid state transition from Idle to Reporting"
        );
    }
}

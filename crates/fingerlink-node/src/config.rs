//! Node configuration.
//!
//! Every section is optional; a missing key takes the value of the matching
//! constant in [`fingerlink_core::constants`].
//!
//! ```toml
//! [endpoints]
//! base_url = "http://10.0.0.2:8080"
//!
//! [topics]
//! enroll = "door-3/enroll"
//!
//! [matching]
//! http_attempts = 5
//! ```

use std::path::Path;

use fingerlink_core::Error as CoreError;
use fingerlink_network::{ConnectivityConfig, TransportConfig};
use serde::Deserialize;

use crate::command::TopicMap;
use crate::dispatcher::CommandConfig;
use crate::enrollment::EnrollmentConfig;
use crate::error::{NodeError, Result};
use crate::matcher::MatchConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Reporting server.
    pub endpoints: TransportConfig,
    pub topics: TopicMap,
    pub connectivity: ConnectivityConfig,
    pub enrollment: EnrollmentConfig,
    pub matching: MatchConfig,
    pub commands: CommandConfig,
}

impl NodeConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: NodeConfig =
            toml::from_str(source).map_err(|e| CoreError::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject values the node cannot run with.
    pub fn validate(&self) -> std::result::Result<(), CoreError> {
        let base = &self.endpoints.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CoreError::Config(format!(
                "endpoints.base_url must be an http(s) URL, got {base:?}"
            )));
        }

        let bounds = [
            ("matching.http_attempts", self.matching.http_attempts),
            (
                "enrollment.second_capture_attempts",
                self.enrollment.second_capture_attempts,
            ),
            ("connectivity.max_retries", self.connectivity.max_retries),
        ];
        for (name, value) in bounds {
            if value == 0 {
                return Err(CoreError::Config(format!("{name} must be at least 1")));
            }
        }

        if self.connectivity.poll_interval_ms == 0 {
            return Err(CoreError::Config(
                "connectivity.poll_interval_ms must be at least 1".to_string(),
            ));
        }

        let [enroll, delete, reset] = self.topics.all();
        if enroll.is_empty() || delete.is_empty() || reset.is_empty() {
            return Err(CoreError::Config("topics must not be empty".to_string()));
        }
        if enroll == delete || enroll == reset || delete == reset {
            return Err(CoreError::Config(
                "each command needs its own topic".to_string(),
            ));
        }

        Ok(())
    }
}

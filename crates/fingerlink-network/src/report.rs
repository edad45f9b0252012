//! Outbound report payloads.
//!
//! ```text
//! status report  POST /enroll/status | /delete/status
//!                {"id": 5, "status": "success"}
//!                {"id": 5, "status": "failed", "reason": "error"}
//!
//! match report   POST /drivers/{id} | /drivers/{id}/OFF
//!                {"id": 7}
//!   response     {"driver_name": "...", "old_status": "...", "new_status": "..."}
//! ```

use fingerlink_core::constants::{
    DELETE_STATUS_PATH, DRIVERS_PATH, ENROLL_STATUS_PATH, OFF_SUFFIX, UNKNOWN_DRIVER_NAME,
    UNKNOWN_STATUS,
};
use fingerlink_core::{ReportVariant, TemplateId};
use serde::Serialize;
use serde_json::Value;

/// Reason attached to every failed status report.
const FAILURE_REASON: &str = "error";

/// Endpoint receiving a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEndpoint {
    Enroll,
    Delete,
}

impl StatusEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            StatusEndpoint::Enroll => ENROLL_STATUS_PATH,
            StatusEndpoint::Delete => DELETE_STATUS_PATH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Success,
    Failed,
}

/// Result of an enrollment or deletion, posted once to a status endpoint.
///
/// # Example
///
/// ```
/// use fingerlink_network::StatusReport;
/// use fingerlink_core::TemplateId;
///
/// let report = StatusReport::failed(TemplateId::new(5));
/// assert_eq!(
///     report.body().to_string(),
///     r#"{"id":5,"status":"failed","reason":"error"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub id: TemplateId,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl StatusReport {
    pub fn success(id: TemplateId) -> Self {
        Self {
            id,
            status: ReportStatus::Success,
            reason: None,
        }
    }

    pub fn failed(id: TemplateId) -> Self {
        Self {
            id,
            status: ReportStatus::Failed,
            reason: Some(FAILURE_REASON),
        }
    }

    /// Build the report from a workflow outcome.
    pub fn from_outcome<E>(id: TemplateId, outcome: &Result<(), E>) -> Self {
        match outcome {
            Ok(()) => Self::success(id),
            Err(_) => Self::failed(id),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReportStatus::Success
    }

    pub fn body(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Report of a positive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchReport {
    pub id: TemplateId,
    pub variant: ReportVariant,
}

impl MatchReport {
    pub fn new(id: TemplateId, variant: ReportVariant) -> Self {
        Self { id, variant }
    }

    /// Endpoint path for this report.
    ///
    /// ```
    /// use fingerlink_network::MatchReport;
    /// use fingerlink_core::{ReportVariant, TemplateId};
    ///
    /// assert_eq!(MatchReport::new(TemplateId::new(7), ReportVariant::Normal).path(), "/drivers/7");
    /// assert_eq!(MatchReport::new(TemplateId::new(7), ReportVariant::Off).path(), "/drivers/7/OFF");
    /// ```
    pub fn path(&self) -> String {
        match self.variant {
            ReportVariant::Normal => format!("{}/{}", DRIVERS_PATH, self.id),
            ReportVariant::Off => format!("{}/{}{}", DRIVERS_PATH, self.id, OFF_SUFFIX),
        }
    }

    pub fn body(&self) -> Value {
        serde_json::json!({ "id": self.id })
    }
}

/// Display data returned by the match endpoint.
///
/// Fields that are missing, not strings, or inside an unparsable body fall
/// back to `"Unknown"` / `"-"` / `"-"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverResponse {
    pub driver_name: String,
    pub old_status: String,
    pub new_status: String,
}

impl Default for DriverResponse {
    fn default() -> Self {
        Self {
            driver_name: UNKNOWN_DRIVER_NAME.to_string(),
            old_status: UNKNOWN_STATUS.to_string(),
            new_status: UNKNOWN_STATUS.to_string(),
        }
    }
}

impl DriverResponse {
    /// Decode a response body, never failing.
    pub fn parse(body: &str) -> Self {
        let value: Value = serde_json::from_str(body).unwrap_or(Value::Null);
        let field = |name: &str, fallback: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };

        Self {
            driver_name: field("driver_name", UNKNOWN_DRIVER_NAME),
            old_status: field("old_status", UNKNOWN_STATUS),
            new_status: field("new_status", UNKNOWN_STATUS),
        }
    }

    /// Status transition line, e.g. `ON -> OFF`.
    pub fn transition(&self) -> String {
        format!("{} -> {}", self.old_status, self.new_status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_success_report_has_no_reason() {
        let report = StatusReport::success(TemplateId::new(5));
        assert_eq!(report.body(), serde_json::json!({"id": 5, "status": "success"}));
        assert!(report.is_success());
    }

    #[test]
    fn test_from_outcome() {
        let ok: Result<(), u8> = Ok(());
        let err: Result<(), u8> = Err(2);
        assert!(StatusReport::from_outcome(TemplateId::new(1), &ok).is_success());
        assert_eq!(
            StatusReport::from_outcome(TemplateId::new(1), &err).reason,
            Some("error")
        );
    }

    #[test]
    fn test_status_endpoints() {
        assert_eq!(StatusEndpoint::Enroll.path(), "/enroll/status");
        assert_eq!(StatusEndpoint::Delete.path(), "/delete/status");
    }

    #[test]
    fn test_match_body_only_carries_id() {
        let report = MatchReport::new(TemplateId::new(7), ReportVariant::Off);
        assert_eq!(report.body(), serde_json::json!({"id": 7}));
    }

    #[test]
    fn test_driver_response_full() {
        let response = DriverResponse::parse(
            r#"{"driver_name":"Budi","old_status":"ON","new_status":"OFF"}"#,
        );
        assert_eq!(response.driver_name, "Budi");
        assert_eq!(response.transition(), "ON -> OFF");
    }

    #[rstest]
    #[case("")]
    #[case("not json")]
    #[case("{}")]
    #[case("[1,2,3]")]
    #[case(r#"{"driver_name":42,"old_status":null}"#)]
    fn test_driver_response_defaults(#[case] body: &str) {
        let response = DriverResponse::parse(body);
        assert_eq!(response, DriverResponse::default());
        assert_eq!(response.driver_name, "Unknown");
        assert_eq!(response.transition(), "- -> -");
    }

    #[test]
    fn test_driver_response_partial() {
        let response = DriverResponse::parse(r#"{"driver_name":"Sari"}"#);
        assert_eq!(response.driver_name, "Sari");
        assert_eq!(response.old_status, "-");
        assert_eq!(response.new_status, "-");
    }
}

//! Core constants for the Fingerlink node.
//!
//! Every bound in the node (retry counts, polling intervals, settle delays)
//! lives here so the workflows, the connectivity guard and the configuration
//! defaults agree on a single value. Durations are expressed in milliseconds
//! and converted with [`std::time::Duration::from_millis`] at the call site.
//!
//! # Usage
//!
//! ```
//! use fingerlink_core::constants::*;
//! use std::time::Duration;
//!
//! let window = Duration::from_millis(WIFI_REASSOCIATION_WINDOW_MS);
//! assert_eq!(window.as_secs(), 10);
//! assert_eq!(ENROLL_SECOND_CAPTURE_ATTEMPTS, 50);
//! ```

// ============================================================================
// Connectivity
// ============================================================================

/// How long the guard waits for the link to reassociate after a drop.
pub const WIFI_REASSOCIATION_WINDOW_MS: u64 = 10_000;

/// Polling interval while waiting for reassociation.
pub const WIFI_POLL_INTERVAL_MS: u64 = 500;

/// Failed reassociation windows tolerated before escalation.
///
/// Reaching this count wipes the stored credentials and restarts the node
/// into provisioning mode.
pub const WIFI_MAX_RETRIES: u32 = 3;

/// Pause between the "link lost" notice and re-association.
pub const WIFI_RECONNECT_SETTLE_MS: u64 = 1_000;

/// Pause after a failed reassociation window so the user can read the count.
pub const WIFI_FAILURE_NOTICE_MS: u64 = 3_000;

/// Pause after the escalation notice, before credentials are wiped.
pub const WIFI_ESCALATION_NOTICE_MS: u64 = 3_000;

/// Pause between the credential wipe and the restart request.
pub const WIFI_ESCALATION_SETTLE_MS: u64 = 1_000;

/// Pause after the boot connection result is shown.
pub const WIFI_BOOT_NOTICE_MS: u64 = 3_000;

/// Interval of the background link check once the node is online.
pub const WIFI_MONITOR_INTERVAL_MS: u64 = 5_000;

// ============================================================================
// Enrollment
// ============================================================================

/// Attempts allowed for the second capture of an enrollment.
///
/// The first capture is user-paced and unbounded; the second one is bounded
/// so a stuck sensor cannot hang the workflow.
pub const ENROLL_SECOND_CAPTURE_ATTEMPTS: u32 = 50;

/// Interval between capture attempts during enrollment.
pub const ENROLL_CAPTURE_POLL_MS: u64 = 100;

/// Settle delay after asking the user to lift the finger.
pub const ENROLL_LIFT_SETTLE_MS: u64 = 1_500;

// ============================================================================
// Matching
// ============================================================================

/// Back-off while another workflow owns the sensor.
pub const MATCH_BUSY_BACKOFF_MS: u64 = 200;

/// Interval between idle capture attempts of the match loop.
pub const MATCH_POLL_INTERVAL_MS: u64 = 100;

/// Total delivery attempts for one match report.
pub const MATCH_HTTP_ATTEMPTS: u32 = 3;

/// Pause between two delivery attempts of the same report.
pub const MATCH_HTTP_RETRY_PAUSE_MS: u64 = 1_000;

/// Pause after a match outcome before the loop shows the ready screen.
pub const MATCH_OUTCOME_PAUSE_MS: u64 = 2_000;

// ============================================================================
// Commands
// ============================================================================

/// Observation delay before a remote connectivity reset is carried out.
pub const RESET_OBSERVATION_DELAY_MS: u64 = 2_000;

/// Default topic carrying enrollment commands.
pub const DEFAULT_ENROLL_TOPIC: &str = "fingerprint/enroll";

/// Default topic carrying deletion commands.
pub const DEFAULT_DELETE_TOPIC: &str = "fingerprint/delete";

/// Default topic carrying connectivity reset commands.
pub const DEFAULT_RESET_TOPIC: &str = "fingerprint/resetwifi";

// ============================================================================
// Reporting
// ============================================================================

/// Default base URL of the reporting server.
pub const DEFAULT_REPORT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default timeout of one HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;

/// Endpoint receiving enrollment results.
pub const ENROLL_STATUS_PATH: &str = "/enroll/status";

/// Endpoint receiving deletion results.
pub const DELETE_STATUS_PATH: &str = "/delete/status";

/// Prefix of the match report endpoint (`/drivers/{id}`).
pub const DRIVERS_PATH: &str = "/drivers";

/// Suffix appended to the match endpoint for an "OFF" report.
pub const OFF_SUFFIX: &str = "/OFF";

/// Fallback display name when the match response omits `driver_name`.
pub const UNKNOWN_DRIVER_NAME: &str = "Unknown";

/// Fallback status text when the match response omits a status field.
pub const UNKNOWN_STATUS: &str = "-";

// ============================================================================
// Display
// ============================================================================

/// Number of text lines the display can show at once.
pub const DISPLAY_LINES: usize = 4;

/// Default hold duration of a screen.
pub const DEFAULT_SCREEN_HOLD_MS: u64 = 1_000;

/// Hold duration of the ready screen shown after a command completes.
pub const READY_SCREEN_HOLD_MS: u64 = 2_000;

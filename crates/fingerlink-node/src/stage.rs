use fingerlink_hardware::SensorResult;
use tracing::{debug, warn};

/// Log the outcome of one sensor stage and pass it through unchanged.
///
/// `subject` is the template slot for enrollment and deletion, or `scan`
/// for the match loop.
pub(crate) fn checked<T>(stage: &'static str, subject: &str, result: SensorResult<T>) -> SensorResult<T> {
    match &result {
        Ok(_) => debug!(stage, subject, status = "OK (0x00)", "Sensor stage done"),
        Err(code) => warn!(
            stage,
            subject,
            status = %code,
            class = ?code.class(),
            "Sensor stage failed"
        ),
    }
    result
}

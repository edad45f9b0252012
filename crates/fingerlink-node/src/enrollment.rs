//! Two-capture template enrollment.
//!
//! ```text
//! lock ─► capture #1 (until a finger) ─► extract 1 ─► lift, settle
//!      ─► capture #2 (bounded) ─► extract 2 ─► create model ─► store ─► unlock
//! ```
//!
//! Every stage failure returns the sensor's own [`StatusCode`].

use std::sync::Arc;
use std::time::Duration;

use fingerlink_core::constants::{
    ENROLL_CAPTURE_POLL_MS, ENROLL_LIFT_SETTLE_MS, ENROLL_SECOND_CAPTURE_ATTEMPTS,
};
use fingerlink_core::{TemplateId, Workflow};
use fingerlink_hardware::{
    BiometricDevice, FeatureBuffer, Notifier, Screen, SensorResult, StatusCode,
};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::lock::OperationLock;
use crate::stage::checked;

/// Pacing and bounds of the enrollment protocol.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    /// Captures tried for the second image before giving up.
    pub second_capture_attempts: u32,

    /// Pause between two capture attempts.
    pub capture_poll_ms: u64,

    /// Pause after asking the user to lift the finger.
    pub lift_settle_ms: u64,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            second_capture_attempts: ENROLL_SECOND_CAPTURE_ATTEMPTS,
            capture_poll_ms: ENROLL_CAPTURE_POLL_MS,
            lift_settle_ms: ENROLL_LIFT_SETTLE_MS,
        }
    }
}

impl EnrollmentConfig {
    pub fn capture_poll(&self) -> Duration {
        Duration::from_millis(self.capture_poll_ms)
    }
}

/// Creates templates in the sensor library.
pub struct EnrollmentWorkflow<S, N> {
    lock: Arc<OperationLock<S>>,
    notifier: Arc<N>,
    config: EnrollmentConfig,
}

impl<S: BiometricDevice, N: Notifier> EnrollmentWorkflow<S, N> {
    pub fn new(lock: Arc<OperationLock<S>>, notifier: Arc<N>, config: EnrollmentConfig) -> Self {
        Self {
            lock,
            notifier,
            config,
        }
    }

    /// Enroll a finger into slot `id`, overwriting whatever is stored there.
    ///
    /// Holds the sensor for the whole protocol. The first capture waits for
    /// the user without a bound; the second gives up after
    /// [`EnrollmentConfig::second_capture_attempts`] tries with the last
    /// capture status.
    pub async fn enroll(&self, id: TemplateId) -> SensorResult<()> {
        let mut sensor = self.lock.acquire(Workflow::Enrollment).await;
        let subject = id.to_string();
        info!(%id, "Enrollment started");

        self.notifier.show(Screen::new(["Place finger..."]));
        loop {
            match sensor.capture().await {
                Ok(()) => break,
                Err(code) => {
                    trace!(%id, status = %code, "Waiting for first capture");
                    sleep(self.config.capture_poll()).await;
                }
            }
        }
        debug!(%id, stage = "enroll:capture#1", "First capture taken");
        checked(
            "enroll:extract#1",
            &subject,
            sensor.extract(FeatureBuffer::One).await,
        )?;

        self.notifier.show(Screen::new(["Lift finger"]));
        sleep(Duration::from_millis(self.config.lift_settle_ms)).await;

        self.notifier.show(Screen::new(["Place finger again..."]));
        let second = self.second_capture(&mut *sensor, id).await;
        checked("enroll:capture#2", &subject, second)?;
        checked(
            "enroll:extract#2",
            &subject,
            sensor.extract(FeatureBuffer::Two).await,
        )?;
        checked("enroll:create_model", &subject, sensor.create_model().await)?;
        checked("enroll:store_model", &subject, sensor.store_model(id).await)?;

        info!(%id, "Enrollment stored");
        Ok(())
    }

    async fn second_capture(&self, sensor: &mut S, id: TemplateId) -> SensorResult<()> {
        let mut last = StatusCode::NoFinger;
        for attempt in 1..=self.config.second_capture_attempts {
            match sensor.capture().await {
                Ok(()) => return Ok(()),
                Err(code) => {
                    trace!(%id, attempt, status = %code, "Waiting for second capture");
                    last = code;
                    sleep(self.config.capture_poll()).await;
                }
            }
        }
        warn!(
            %id,
            attempts = self.config.second_capture_attempts,
            status = %last,
            "Second capture never succeeded"
        );
        Err(last)
    }
}

//! Continuous match loop.
//!
//! Each cycle samples the toggle button, then, if the sensor is free, takes
//! one image and searches the library. A match is reported to
//! `/drivers/{id}` (or `/drivers/{id}/OFF` when the toggle was armed) with a
//! bounded number of attempts.
//!
//! The sensor is released as soon as the search answers, so enrollment and
//! deletion commands never wait for a report to be delivered.

use std::sync::Arc;
use std::time::Duration;

use fingerlink_core::constants::{
    MATCH_BUSY_BACKOFF_MS, MATCH_HTTP_ATTEMPTS, MATCH_HTTP_RETRY_PAUSE_MS, MATCH_OUTCOME_PAUSE_MS,
    MATCH_POLL_INTERVAL_MS,
};
use fingerlink_core::{ReportVariant, Workflow};
use fingerlink_hardware::{
    BeepPattern, BiometricDevice, ButtonInput, FeatureBuffer, Notifier, Screen, StatusCode,
};
use fingerlink_network::{DriverResponse, HttpTransport, MatchReport, WifiLink};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, error, info, trace, warn};

use crate::error::ReportError;
use crate::lock::OperationLock;
use crate::phase::{MatchPhase, PhaseTracker};
use crate::reporter::Reporter;
use crate::stage::checked;
use crate::toggle::{Edge, EdgeDetector, OffToggle};

/// Pacing and retry bounds of the match loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Pause while another workflow holds the sensor.
    pub busy_backoff_ms: u64,

    /// Pause between two scans.
    pub poll_interval_ms: u64,

    /// POST attempts per match report.
    pub http_attempts: u32,

    /// Pause after a POST that got no response.
    pub http_retry_pause_ms: u64,

    /// How long the outcome stays on screen before the ready screen.
    pub outcome_pause_ms: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            busy_backoff_ms: MATCH_BUSY_BACKOFF_MS,
            poll_interval_ms: MATCH_POLL_INTERVAL_MS,
            http_attempts: MATCH_HTTP_ATTEMPTS,
            http_retry_pause_ms: MATCH_HTTP_RETRY_PAUSE_MS,
            outcome_pause_ms: MATCH_OUTCOME_PAUSE_MS,
        }
    }
}

/// What one pass of the match loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another workflow holds the sensor.
    Busy,

    /// No usable image; nothing was shown.
    Idle(StatusCode),

    /// An image was taken but features could not be extracted.
    ExtractFailed(StatusCode),

    /// The library search found nothing. The OFF toggle is left untouched.
    NoMatch(StatusCode),

    /// The match report was answered by the server.
    Reported {
        report: MatchReport,
        response: DriverResponse,
        attempts: u32,
    },

    /// Every attempt went unanswered, or the link escalated.
    ReportFailed { report: MatchReport, attempts: u32 },
}

/// The continuous scan-and-report loop.
pub struct MatchWorkflow<S, B, L, N, T> {
    lock: Arc<OperationLock<S>>,
    button: B,
    edges: EdgeDetector,
    toggle: Arc<OffToggle>,
    reporter: Arc<Reporter<L, N, T>>,
    notifier: Arc<N>,
    phases: PhaseTracker,
    config: MatchConfig,
}

impl<S, B, L, N, T> MatchWorkflow<S, B, L, N, T>
where
    S: BiometricDevice,
    B: ButtonInput,
    L: WifiLink,
    N: Notifier,
    T: HttpTransport,
{
    pub fn new(
        lock: Arc<OperationLock<S>>,
        button: B,
        toggle: Arc<OffToggle>,
        reporter: Arc<Reporter<L, N, T>>,
        notifier: Arc<N>,
        config: MatchConfig,
    ) -> Self {
        Self {
            lock,
            button,
            edges: EdgeDetector::new(),
            toggle,
            reporter,
            notifier,
            phases: PhaseTracker::new(),
            config,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phases.current()
    }

    pub fn phases(&self) -> &PhaseTracker {
        &self.phases
    }

    pub fn toggle(&self) -> &Arc<OffToggle> {
        &self.toggle
    }

    /// Run cycles forever.
    pub async fn run(mut self) {
        info!("Match loop started");
        loop {
            let outcome = self.run_cycle().await;
            trace!(?outcome, "Match cycle done");
        }
    }

    /// One pass: button, scan, search and, on a match, report.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.check_button();

        let lock = Arc::clone(&self.lock);
        let Some(mut sensor) = lock.try_acquire(Workflow::Match) else {
            trace!(holder = ?lock.holder(), "Sensor busy, backing off");
            sleep(Duration::from_millis(self.config.busy_backoff_ms)).await;
            return CycleOutcome::Busy;
        };

        self.enter(MatchPhase::Capturing);
        if let Err(code) = sensor.capture().await {
            drop(sensor);
            trace!(status = %code, "No finger");
            self.enter(MatchPhase::Idle);
            self.poll_pause().await;
            return CycleOutcome::Idle(code);
        }
        debug!(stage = "scan:capture", "Image taken");

        if let Err(code) = checked("scan:extract", "scan", sensor.extract(FeatureBuffer::One).await) {
            drop(sensor);
            self.enter(MatchPhase::Idle);
            self.poll_pause().await;
            return CycleOutcome::ExtractFailed(code);
        }

        self.enter(MatchPhase::Matching);
        let found = checked("scan:search", "scan", sensor.search().await);
        drop(sensor);

        let found = match found {
            Ok(found) => found,
            Err(code) => {
                info!(status = %code, "Fingerprint not found");
                self.notifier.show(Screen::new(["Fingerprint not", "found"]));
                self.notifier.beep(BeepPattern::Failure);
                self.enter(MatchPhase::Idle);
                self.finish().await;
                return CycleOutcome::NoMatch(code);
            }
        };
        info!(id = %found.id, confidence = found.confidence, "Fingerprint matched");

        self.enter(MatchPhase::Reporting);
        // Cleared before delivery: a report that never arrives does not
        // carry the toggle over to the next scan.
        let variant = if self.toggle.take() {
            ReportVariant::Off
        } else {
            ReportVariant::Normal
        };
        let outcome = self.deliver(MatchReport::new(found.id, variant)).await;

        self.enter(MatchPhase::Idle);
        self.finish().await;
        outcome
    }

    fn check_button(&mut self) {
        let level = self.button.level();
        if self.edges.update(level) == Some(Edge::Falling) {
            let was_armed = self.toggle.arm();
            info!(was_armed, "OFF toggle armed");
            self.notifier
                .show(Screen::new(["Scan fingerprint", "to switch status", "to OFF"]));
        }
    }

    async fn deliver(&self, report: MatchReport) -> CycleOutcome {
        let path = report.path();
        let body = report.body();
        let mut attempts = 0;

        while attempts < self.config.http_attempts {
            attempts += 1;
            match self.reporter.post(&path, body.clone()).await {
                Ok(response) => {
                    let driver = DriverResponse::parse(&response.body);
                    info!(
                        %path,
                        attempt = attempts,
                        status = response.status,
                        driver = %driver.driver_name,
                        transition = %driver.transition(),
                        "Match reported"
                    );
                    self.notifier
                        .show(Screen::new([driver.driver_name.clone(), driver.transition()]));
                    self.notifier.beep(if report.variant.is_off() {
                        BeepPattern::Toggled
                    } else {
                        BeepPattern::Success
                    });
                    return CycleOutcome::Reported {
                        report,
                        response: driver,
                        attempts,
                    };
                }
                Err(ReportError::Offline(e)) => {
                    warn!(%path, error = %e, "Link unavailable, giving up on report");
                    break;
                }
                Err(ReportError::Transport(e)) => {
                    warn!(%path, attempt = attempts, error = %e, "Match report got no response");
                    self.notifier
                        .show(Screen::new(["HTTP Error".to_string(), format!("Retry: {attempts}")]));
                    sleep(Duration::from_millis(self.config.http_retry_pause_ms)).await;
                }
            }
        }

        error!(%path, attempts, "Match report failed");
        self.notifier.show(Screen::new(["Report failed"]));
        self.notifier.beep(BeepPattern::Failure);
        CycleOutcome::ReportFailed { report, attempts }
    }

    fn enter(&mut self, phase: MatchPhase) {
        if let Err(e) = self.phases.transition_to(phase) {
            warn!(error = %e, "Match phase out of order, resetting");
            self.phases.reset();
        }
    }

    async fn finish(&self) {
        sleep(Duration::from_millis(self.config.outcome_pause_ms)).await;
        self.notifier.show(Screen::new(["Fingerprint Ready"]));
        self.poll_pause().await;
    }

    async fn poll_pause(&self) {
        sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
    }
}

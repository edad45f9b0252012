//! Connectivity lifecycle with bounded recovery.
//!
//! The [`ConnectivityGuard`] is the only owner of the link, the
//! [`ConnectivityState`] and the reconnection retry counter. Other units
//! reach the network through [`ConnectivityGuard::ensure_connected`], which
//! returns only once the link is actually up, or fails once recovery has
//! escalated.
//!
//! # Recovery ladder
//!
//! ```text
//! Connected ──drop──► Disconnected ──► Connecting ──reassociated──► Connected (retries = 0)
//!                         │
//!                    window expired
//!                         │
//!                  retries += 1 ──< max──► Connecting
//!                         │
//!                      >= max
//!                         ▼
//!                     Escalated ──► wipe credentials ──► restart request
//! ```
//!
//! Escalation wipes the stored credentials so the node comes back up in
//! provisioning mode. It happens at most once per guard; later callers get
//! [`NetworkError::Escalated`] with the reason of that first escalation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use fingerlink_core::constants::{
    WIFI_BOOT_NOTICE_MS, WIFI_ESCALATION_NOTICE_MS, WIFI_ESCALATION_SETTLE_MS,
    WIFI_FAILURE_NOTICE_MS, WIFI_MAX_RETRIES, WIFI_MONITOR_INTERVAL_MS, WIFI_POLL_INTERVAL_MS,
    WIFI_REASSOCIATION_WINDOW_MS, WIFI_RECONNECT_SETTLE_MS,
};
use fingerlink_core::{ConnectivityState, RestartReason};
use fingerlink_hardware::{BeepPattern, Notifier, Screen};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::error::{NetworkError, Result};
use crate::link::WifiLink;

/// Timing and retry bounds of the connectivity guard.
///
/// # Example
///
/// ```
/// use fingerlink_network::ConnectivityConfig;
/// use std::time::Duration;
///
/// let config = ConnectivityConfig::default();
/// assert_eq!(config.reassociation_window(), Duration::from_secs(10));
/// assert_eq!(config.max_retries, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// How long to wait for re-association after a drop.
    pub reassociation_window_ms: u64,

    /// Link polling interval inside the window.
    pub poll_interval_ms: u64,

    /// Failed windows tolerated before escalation.
    pub max_retries: u32,

    /// Pause between the "link lost" notice and re-association.
    pub reconnect_settle_ms: u64,

    /// Pause after each failed window.
    pub failure_notice_ms: u64,

    /// Pause after the escalation notice, before the wipe.
    pub escalation_notice_ms: u64,

    /// Pause between the wipe and the restart request.
    pub escalation_settle_ms: u64,

    /// Pause after the boot connection result.
    pub boot_notice_ms: u64,

    /// Interval of the background link check.
    pub monitor_interval_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            reassociation_window_ms: WIFI_REASSOCIATION_WINDOW_MS,
            poll_interval_ms: WIFI_POLL_INTERVAL_MS,
            max_retries: WIFI_MAX_RETRIES,
            reconnect_settle_ms: WIFI_RECONNECT_SETTLE_MS,
            failure_notice_ms: WIFI_FAILURE_NOTICE_MS,
            escalation_notice_ms: WIFI_ESCALATION_NOTICE_MS,
            escalation_settle_ms: WIFI_ESCALATION_SETTLE_MS,
            boot_notice_ms: WIFI_BOOT_NOTICE_MS,
            monitor_interval_ms: WIFI_MONITOR_INTERVAL_MS,
        }
    }
}

impl ConnectivityConfig {
    pub fn reassociation_window(&self) -> Duration {
        Duration::from_millis(self.reassociation_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }
}

/// Create the channel used to ask the supervisor for a restart.
pub fn restart_channel() -> (RestartRequester, RestartListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RestartRequester { tx }, RestartListener { rx })
}

/// Sending side of the restart channel.
#[derive(Debug, Clone)]
pub struct RestartRequester {
    tx: mpsc::UnboundedSender<RestartReason>,
}

impl RestartRequester {
    /// Ask for a restart. Never blocks.
    pub fn request(&self, reason: RestartReason) {
        warn!(%reason, "Restart requested");
        if self.tx.send(reason).is_err() {
            error!(%reason, "Restart listener is gone; restart request dropped");
        }
    }
}

/// Receiving side of the restart channel, held by the supervisor.
#[derive(Debug)]
pub struct RestartListener {
    rx: mpsc::UnboundedReceiver<RestartReason>,
}

impl RestartListener {
    /// Wait for the next restart request.
    ///
    /// Returns `None` once every requester is dropped.
    pub async fn wait(&mut self) -> Option<RestartReason> {
        self.rx.recv().await
    }

    /// Take a pending request without waiting.
    pub fn try_take(&mut self) -> Option<RestartReason> {
        self.rx.try_recv().ok()
    }
}

/// One-shot gate between "first connection" and the dependent units.
///
/// # Example
///
/// ```
/// use fingerlink_network::BootBarrier;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let barrier = BootBarrier::new();
/// let waiter = barrier.clone();
///
/// let task = tokio::spawn(async move { waiter.wait().await });
/// barrier.open();
/// task.await.unwrap();
/// assert!(barrier.is_open());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BootBarrier {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for BootBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl BootBarrier {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Release every current and future waiter.
    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the barrier is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|open| *open).await;
    }
}

struct GuardInner<L> {
    link: L,
    escalation: Option<RestartReason>,
}

/// Owner of the network link lifecycle.
///
/// Shared between units behind an `Arc`. Concurrent callers of
/// [`ensure_connected`](Self::ensure_connected) are serialized: one of them
/// runs the recovery while the others wait and then observe its outcome.
pub struct ConnectivityGuard<L, N> {
    inner: Mutex<GuardInner<L>>,
    state: watch::Sender<ConnectivityState>,
    retries: AtomicU32,
    notifier: Arc<N>,
    restart: RestartRequester,
    config: ConnectivityConfig,
}

impl<L: WifiLink, N: Notifier> ConnectivityGuard<L, N> {
    pub fn new(
        link: L,
        notifier: Arc<N>,
        restart: RestartRequester,
        config: ConnectivityConfig,
    ) -> Self {
        let (state, _rx) = watch::channel(ConnectivityState::Disconnected);
        Self {
            inner: Mutex::new(GuardInner {
                link,
                escalation: None,
            }),
            state,
            retries: AtomicU32::new(0),
            notifier,
            restart,
            config,
        }
    }

    /// Last state recorded by the guard.
    ///
    /// Use [`is_connected`](Self::is_connected) to look at the link itself.
    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    /// Whether the link is up right now.
    ///
    /// Checks the link when no recovery is running and records a drop as
    /// [`ConnectivityState::Disconnected`]. While a recovery holds the link
    /// the answer follows the recorded state, which is then not `Connected`.
    pub fn is_connected(&self) -> bool {
        let Ok(inner) = self.inner.try_lock() else {
            return self.state() == ConnectivityState::Connected;
        };
        self.observe(&inner)
    }

    /// Mirror the link into the state. Escalation is never overwritten.
    fn observe(&self, inner: &GuardInner<L>) -> bool {
        if inner.escalation.is_some() {
            return false;
        }
        let up = inner.link.is_connected();
        match (up, self.state()) {
            (true, _) => self.set_state(ConnectivityState::Connected),
            (false, ConnectivityState::Connected) => {
                self.set_state(ConnectivityState::Disconnected)
            }
            _ => {}
        }
        up
    }

    /// Failed re-association windows since the last successful connection.
    pub fn retry_count(&self) -> u32 {
        self.retries.load(Ordering::Acquire)
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &ConnectivityConfig {
        &self.config
    }

    fn set_state(&self, next: ConnectivityState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!(from = %previous, to = %next, "Connectivity state changed");
        }
    }

    /// Callers hold the inner lock, which orders every write.
    fn set_retries(&self, _inner: &mut GuardInner<L>, retries: u32) {
        self.retries.store(retries, Ordering::Release);
    }

    /// Bring the link up at boot.
    ///
    /// Blocks until the link is connected. When neither the stored
    /// credentials nor provisioning work, shows the failure, requests a
    /// restart with [`RestartReason::ProvisioningFailed`] and returns
    /// [`NetworkError::ProvisioningFailed`].
    pub async fn connect(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        self.set_state(ConnectivityState::Connecting);
        self.notifier.show(Screen::new(["Connecting to WiFi..."]));
        info!("Connecting to WiFi");

        if inner.link.auto_connect().await {
            self.set_retries(&mut inner, 0);
            self.set_state(ConnectivityState::Connected);
            info!("WiFi connected");
            self.notifier.show(Screen::new(["WiFi connected"]));
            sleep(Duration::from_millis(self.config.boot_notice_ms)).await;
            self.notifier.show(Screen::new(["Fingerprint Ready"]));
            return Ok(());
        }

        error!("WiFi connection failed at boot");
        inner.escalation = Some(RestartReason::ProvisioningFailed);
        self.set_state(ConnectivityState::Escalated);
        self.notifier.show(Screen::new(["WiFi failed", "Reconnect again"]));
        sleep(Duration::from_millis(self.config.boot_notice_ms)).await;
        self.restart.request(RestartReason::ProvisioningFailed);
        Err(NetworkError::ProvisioningFailed)
    }

    /// Make sure the link is up before a network operation.
    ///
    /// Returns immediately when connected. Otherwise re-associates, waiting
    /// up to the configured window per attempt; every expired window bumps
    /// the retry counter and reaching the maximum escalates.
    pub async fn ensure_connected(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(reason) = inner.escalation {
            return Err(NetworkError::Escalated(reason));
        }

        if self.observe(&inner) {
            return Ok(());
        }

        loop {
            self.set_state(ConnectivityState::Connecting);
            warn!(retries = self.retry_count(), "WiFi link lost, reconnecting");
            self.notifier.show(Screen::new(["WiFi lost", "Reconnecting..."]));
            self.notifier.beep(BeepPattern::Failure);
            sleep(Duration::from_millis(self.config.reconnect_settle_ms)).await;

            inner.link.begin_reconnect().await;

            if self.wait_for_link(&mut inner.link).await {
                self.set_retries(&mut inner, 0);
                self.set_state(ConnectivityState::Connected);
                info!("WiFi reconnected");
                return Ok(());
            }

            let retries = self.retry_count() + 1;
            self.set_retries(&mut inner, retries);
            warn!(
                attempt = retries,
                max = self.config.max_retries,
                "WiFi reconnection window expired"
            );
            self.notifier
                .show(Screen::new(["WiFi failed".to_string(), format!("Attempt: {retries}")]));
            self.notifier.beep(BeepPattern::Failure);
            sleep(Duration::from_millis(self.config.failure_notice_ms)).await;

            if retries >= self.config.max_retries {
                let reason = RestartReason::ConnectivityEscalation;
                self.escalate_locked(&mut inner, reason).await;
                return Err(NetworkError::Escalated(reason));
            }
        }
    }

    /// Destructive remediation: wipe credentials and request a restart.
    ///
    /// Runs at most once per guard; a second call is a no-op.
    pub async fn escalate(&self, reason: RestartReason) {
        let mut inner = self.inner.lock().await;
        self.escalate_locked(&mut inner, reason).await;
    }

    async fn escalate_locked(&self, inner: &mut GuardInner<L>, reason: RestartReason) {
        if let Some(first) = inner.escalation {
            debug!(%reason, %first, "Escalation already in progress");
            return;
        }
        inner.escalation = Some(reason);
        self.set_state(ConnectivityState::Escalated);

        error!(%reason, retries = self.retry_count(), "Escalating: wiping WiFi credentials");
        self.notifier
            .show(Screen::new(["Reset WiFi", "Entering AP mode..."]));
        self.notifier.beep(BeepPattern::Failure);
        sleep(Duration::from_millis(self.config.escalation_notice_ms)).await;

        inner.link.clear_credentials().await;
        sleep(Duration::from_millis(self.config.escalation_settle_ms)).await;

        self.restart.request(reason);
    }

    /// Keep checking the link until recovery escalates.
    pub async fn supervise(&self) {
        loop {
            sleep(self.config.monitor_interval()).await;
            if let Err(e) = self.ensure_connected().await {
                warn!(error = %e, "Connectivity supervision stopped");
                return;
            }
        }
    }

    async fn wait_for_link(&self, link: &mut L) -> bool {
        let deadline = Instant::now() + self.config.reassociation_window();
        loop {
            if link.is_connected() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.config.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLink;
    use fingerlink_hardware::mock::RecordingNotifier;

    fn guard(
        link: MockLink,
    ) -> (
        ConnectivityGuard<MockLink, RecordingNotifier>,
        Arc<RecordingNotifier>,
        RestartListener,
    ) {
        let notifier = Arc::new(RecordingNotifier::new());
        let (requester, listener) = restart_channel();
        let guard = ConnectivityGuard::new(
            link,
            Arc::clone(&notifier),
            requester,
            ConnectivityConfig::default(),
        );
        (guard, notifier, listener)
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_success_opens_connected_state() {
        let (link, handle) = MockLink::new();
        let (guard, notifier, mut restarts) = guard(link);

        guard.connect().await.unwrap();

        assert_eq!(guard.state(), ConnectivityState::Connected);
        assert_eq!(guard.retry_count(), 0);
        assert_eq!(handle.auto_connect_calls(), 1);
        assert!(notifier.saw_screen("WiFi connected"));
        assert_eq!(restarts.try_take(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_requests_restart_without_wipe() {
        let (link, handle) = MockLink::new();
        handle.queue_auto_connect(false);
        let (guard, notifier, mut restarts) = guard(link);

        let result = guard.connect().await;

        assert_eq!(result, Err(NetworkError::ProvisioningFailed));
        assert_eq!(restarts.try_take(), Some(RestartReason::ProvisioningFailed));
        assert!(!handle.credentials_cleared());
        assert!(notifier.saw_screen("WiFi failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_connected_is_noop_when_up() {
        let (link, handle) = MockLink::new();
        let (guard, notifier, _restarts) = guard(link);
        guard.connect().await.unwrap();
        notifier.clear();

        guard.ensure_connected().await.unwrap();

        assert_eq!(handle.reconnect_calls(), 0);
        assert!(notifier.feedback().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_within_window_resets_counter() {
        let (link, handle) = MockLink::new();
        let (guard, _notifier, _restarts) = guard(link);
        guard.connect().await.unwrap();

        // First window expires, second reassociates after 2 s.
        handle.drop_link();
        handle.queue_reconnect(None);
        handle.queue_reconnect(Some(Duration::from_secs(2)));

        guard.ensure_connected().await.unwrap();

        assert_eq!(handle.reconnect_calls(), 2);
        assert_eq!(guard.retry_count(), 0);
        assert_eq!(guard.state(), ConnectivityState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalates_after_three_failed_windows() {
        let (link, handle) = MockLink::new();
        let (guard, notifier, mut restarts) = guard(link);
        guard.connect().await.unwrap();
        handle.drop_link();

        let started = Instant::now();
        let result = guard.ensure_connected().await;

        assert_eq!(
            result,
            Err(NetworkError::Escalated(RestartReason::ConnectivityEscalation))
        );
        assert_eq!(handle.reconnect_calls(), 3);
        assert_eq!(guard.retry_count(), 3);
        assert_eq!(guard.state(), ConnectivityState::Escalated);
        assert!(handle.credentials_cleared());
        assert_eq!(
            restarts.try_take(),
            Some(RestartReason::ConnectivityEscalation)
        );
        assert!(notifier.saw_screen("Attempt: 3"));
        assert!(notifier.saw_screen("Entering AP mode..."));

        // Three windows of settle + 10 s + notice, then the escalation pauses.
        assert!(started.elapsed() >= Duration::from_secs(3 * (1 + 10 + 3) + 3 + 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_happens_once() {
        let (link, handle) = MockLink::new();
        let (guard, _notifier, mut restarts) = guard(link);
        guard.connect().await.unwrap();
        handle.drop_link();

        assert!(guard.ensure_connected().await.is_err());
        assert!(guard.ensure_connected().await.is_err());
        guard.escalate(RestartReason::RemoteReset).await;

        assert_eq!(handle.clear_calls(), 1);
        assert_eq!(
            restarts.try_take(),
            Some(RestartReason::ConnectivityEscalation)
        );
        assert_eq!(restarts.try_take(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remote_escalation() {
        let (link, handle) = MockLink::new();
        let (guard, _notifier, mut restarts) = guard(link);
        guard.connect().await.unwrap();

        guard.escalate(RestartReason::RemoteReset).await;

        assert!(handle.credentials_cleared());
        assert_eq!(restarts.try_take(), Some(RestartReason::RemoteReset));
        assert_eq!(
            guard.ensure_connected().await,
            Err(NetworkError::Escalated(RestartReason::RemoteReset))
        );
        assert!(!guard.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_failure_reason_is_kept() {
        let (link, handle) = MockLink::new();
        handle.queue_auto_connect(false);
        let (guard, _notifier, _restarts) = guard(link);

        assert!(guard.connect().await.is_err());

        assert_eq!(
            guard.ensure_connected().await,
            Err(NetworkError::Escalated(RestartReason::ProvisioningFailed))
        );
        assert_eq!(handle.reconnect_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_connected_follows_link() {
        let (link, handle) = MockLink::new();
        let (guard, _notifier, _restarts) = guard(link);
        assert!(!guard.is_connected());
        guard.connect().await.unwrap();
        assert!(guard.is_connected());

        handle.drop_link();

        assert!(!guard.is_connected());
        assert_eq!(guard.state(), ConnectivityState::Disconnected);
        assert_eq!(handle.reconnect_calls(), 0);

        handle.restore_link();

        assert!(guard.is_connected());
        assert_eq!(guard.state(), ConnectivityState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_connected_false_during_recovery() {
        let (link, handle) = MockLink::new();
        let (guard, _notifier, _restarts) = guard(link);
        let guard = Arc::new(guard);
        guard.connect().await.unwrap();
        handle.drop_link();
        handle.queue_reconnect(Some(Duration::from_secs(4)));

        let recovering = Arc::clone(&guard);
        let recovery = tokio::spawn(async move { recovering.ensure_connected().await });
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(guard.state(), ConnectivityState::Connecting);
        assert!(!guard.is_connected());

        recovery.await.unwrap().unwrap();
        assert!(guard.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_survives_between_calls_until_success() {
        let (link, handle) = MockLink::new();
        let config = ConnectivityConfig {
            max_retries: 5,
            ..ConnectivityConfig::default()
        };
        let notifier = Arc::new(RecordingNotifier::new());
        let (requester, _listener) = restart_channel();
        let guard = ConnectivityGuard::new(link, notifier, requester, config);
        guard.connect().await.unwrap();

        handle.drop_link();
        handle.queue_reconnect(None);
        handle.queue_reconnect(None);
        handle.queue_reconnect(Some(Duration::from_millis(500)));

        let mut states = guard.subscribe();
        guard.ensure_connected().await.unwrap();

        assert_eq!(guard.retry_count(), 0);
        assert_eq!(*states.borrow_and_update(), ConnectivityState::Connected);
    }

    #[tokio::test]
    async fn test_boot_barrier_releases_all_waiters() {
        let barrier = BootBarrier::new();
        let mut tasks = Vec::new();
        for _ in 0..3 {
            let waiter = barrier.clone();
            tasks.push(tokio::spawn(async move { waiter.wait().await }));
        }

        assert!(!barrier.is_open());
        barrier.open();
        for task in tasks {
            task.await.unwrap();
        }

        // Late waiters pass straight through.
        barrier.wait().await;
    }
}

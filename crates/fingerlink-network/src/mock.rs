//! Mock network link and HTTP transport.
//!
//! Both mocks follow the same pattern as the hardware mocks: `new()` returns
//! the device and a cloneable handle sharing its state, so a test can script
//! the device after moving it into the unit under test.
//!
//! Time in [`MockLink`] is tokio time, so reconnection delays are driven by
//! the paused test clock.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::error::TransportError;
use crate::http::{HttpResponse, HttpTransport};
use crate::link::WifiLink;

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct LinkState {
    /// The link is up from this instant on; `None` while down.
    connected_at: Option<Instant>,
    auto_connects: VecDeque<bool>,
    /// Delay until a reconnection succeeds; `None` never succeeds.
    reconnects: VecDeque<Option<Duration>>,
    auto_connect_calls: usize,
    reconnect_calls: usize,
    clear_calls: usize,
}

/// Mock station link.
///
/// Without scripting, `auto_connect` succeeds and re-association never does.
///
/// # Example
///
/// ```
/// use fingerlink_network::WifiLink;
/// use fingerlink_network::mock::MockLink;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let (mut link, handle) = MockLink::new();
/// assert!(link.auto_connect().await);
///
/// handle.drop_link();
/// handle.queue_reconnect(Some(Duration::from_secs(2)));
/// link.begin_reconnect().await;
/// assert!(!link.is_connected());
///
/// tokio::time::sleep(Duration::from_secs(2)).await;
/// assert!(link.is_connected());
/// # }
/// ```
#[derive(Debug)]
pub struct MockLink {
    state: Arc<Mutex<LinkState>>,
}

impl MockLink {
    pub fn new() -> (Self, MockLinkHandle) {
        let state = Arc::new(Mutex::new(LinkState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockLinkHandle { state },
        )
    }
}

impl WifiLink for MockLink {
    fn is_connected(&self) -> bool {
        lock(&self.state)
            .connected_at
            .is_some_and(|at| Instant::now() >= at)
    }

    async fn auto_connect(&mut self) -> bool {
        let mut state = lock(&self.state);
        state.auto_connect_calls += 1;
        let ok = state.auto_connects.pop_front().unwrap_or(true);
        state.connected_at = ok.then(Instant::now);
        ok
    }

    async fn begin_reconnect(&mut self) {
        let mut state = lock(&self.state);
        state.reconnect_calls += 1;
        let delay = state.reconnects.pop_front().flatten();
        state.connected_at = delay.map(|d| Instant::now() + d);
    }

    async fn clear_credentials(&mut self) {
        let mut state = lock(&self.state);
        state.clear_calls += 1;
        state.connected_at = None;
    }
}

/// Control handle for [`MockLink`].
#[derive(Debug, Clone)]
pub struct MockLinkHandle {
    state: Arc<Mutex<LinkState>>,
}

impl MockLinkHandle {
    /// Another link sharing this state, as after a reboot.
    pub fn device(&self) -> MockLink {
        MockLink {
            state: Arc::clone(&self.state),
        }
    }

    /// Script the next `auto_connect` result.
    pub fn queue_auto_connect(&self, ok: bool) {
        lock(&self.state).auto_connects.push_back(ok);
    }

    /// Script the next re-association: `Some(delay)` comes back up after
    /// `delay`, `None` never does.
    pub fn queue_reconnect(&self, after: Option<Duration>) {
        lock(&self.state).reconnects.push_back(after);
    }

    /// Take the link down.
    pub fn drop_link(&self) {
        lock(&self.state).connected_at = None;
    }

    /// Bring the link back up immediately.
    pub fn restore_link(&self) {
        lock(&self.state).connected_at = Some(Instant::now());
    }

    pub fn auto_connect_calls(&self) -> usize {
        lock(&self.state).auto_connect_calls
    }

    pub fn reconnect_calls(&self) -> usize {
        lock(&self.state).reconnect_calls
    }

    pub fn clear_calls(&self) -> usize {
        lock(&self.state).clear_calls
    }

    pub fn credentials_cleared(&self) -> bool {
        self.clear_calls() > 0
    }
}

#[derive(Debug, Default)]
struct TransportState {
    responses: VecDeque<Option<HttpResponse>>,
    requests: Vec<(String, Value)>,
}

/// Mock HTTP transport recording every request.
///
/// Unscripted requests are answered with `200 {}`.
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(TransportState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockTransportHandle { state },
        )
    }
}

impl HttpTransport for MockTransport {
    async fn post_json(&self, path: &str, body: Value) -> Result<HttpResponse, TransportError> {
        let mut state = lock(&self.state);
        state.requests.push((path.to_string(), body));
        match state.responses.pop_front() {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(TransportError::no_response(path, "scripted no response")),
            None => Ok(HttpResponse::new(200, "{}")),
        }
    }
}

/// Control handle for [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransportHandle {
    /// Answer the next request with `status` and `body`.
    pub fn queue_response(&self, status: u16, body: impl Into<String>) {
        lock(&self.state)
            .responses
            .push_back(Some(HttpResponse::new(status, body)));
    }

    /// Let the next request get no response at all.
    pub fn queue_no_response(&self) {
        lock(&self.state).responses.push_back(None);
    }

    /// Requests received so far, as `(path, body)`.
    pub fn requests(&self) -> Vec<(String, Value)> {
        lock(&self.state).requests.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.state)
            .requests
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

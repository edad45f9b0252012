//! Mock fingerprint sensor.
//!
//! The sensor answers from per-operation script queues. When a queue is
//! empty the mock falls back to the behavior of an idle sensor with an
//! in-memory template library:
//!
//! | Operation | Fallback |
//! |-----------|----------|
//! | `capture` | idle capture status (`NoFinger` by default) |
//! | `extract`, `create_model` | `Ok` |
//! | `store_model` | `Ok`, slot added to the library |
//! | `delete_template` | `Ok` if the slot is occupied, `DeleteFail` otherwise |
//! | `search` | `NotFound` |

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use fingerlink_core::TemplateId;

use crate::status::{SensorResult, StatusCode};
use crate::traits::BiometricDevice;
use crate::types::{FeatureBuffer, SearchMatch, SensorParameters};

/// Confidence reported by [`MockSensorHandle::present_enrolled`].
pub const MOCK_MATCH_CONFIDENCE: u16 = 120;

/// One call received by the mock sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCall {
    VerifyPassword,
    ReadParameters,
    TemplateCount,
    Capture,
    Extract(FeatureBuffer),
    CreateModel,
    StoreModel(TemplateId),
    DeleteTemplate(TemplateId),
    Search,
}

#[derive(Debug)]
struct SensorState {
    captures: VecDeque<SensorResult<()>>,
    extracts: VecDeque<SensorResult<()>>,
    models: VecDeque<SensorResult<()>>,
    stores: VecDeque<SensorResult<()>>,
    deletes: VecDeque<SensorResult<()>>,
    searches: VecDeque<SensorResult<SearchMatch>>,
    idle_capture: StatusCode,
    password_ok: bool,
    parameters: SensorResult<SensorParameters>,
    library: BTreeSet<TemplateId>,
    calls: Vec<SensorCall>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            captures: VecDeque::new(),
            extracts: VecDeque::new(),
            models: VecDeque::new(),
            stores: VecDeque::new(),
            deletes: VecDeque::new(),
            searches: VecDeque::new(),
            idle_capture: StatusCode::NoFinger,
            password_ok: true,
            parameters: Ok(SensorParameters {
                status_register: 0,
                system_id: 0,
                capacity: 127,
                security_level: 3,
                device_address: 0xFFFF_FFFF,
                packet_len: 128,
                baud_rate: 57_600,
            }),
            library: BTreeSet::new(),
            calls: Vec::new(),
        }
    }
}

/// Mock fingerprint sensor for testing and development.
///
/// # Examples
///
/// ```
/// use fingerlink_hardware::mock::MockSensor;
/// use fingerlink_hardware::traits::BiometricDevice;
/// use fingerlink_hardware::StatusCode;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let (mut sensor, handle) = MockSensor::new();
///
///     assert_eq!(sensor.capture().await, Err(StatusCode::NoFinger));
///
///     handle.present_finger();
///     assert_eq!(sensor.capture().await, Ok(()));
/// }
/// ```
#[derive(Debug)]
pub struct MockSensor {
    state: Arc<Mutex<SensorState>>,
}

impl MockSensor {
    /// Create a new mock sensor and its control handle.
    pub fn new() -> (Self, MockSensorHandle) {
        let state = Arc::new(Mutex::new(SensorState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSensorHandle { state },
        )
    }

    fn state(&self) -> MutexGuard<'_, SensorState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<SensorState>) -> MutexGuard<'_, SensorState> {
    // A panicking test thread must not hide the recorded calls from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl BiometricDevice for MockSensor {
    async fn verify_password(&mut self) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::VerifyPassword);
        if state.password_ok {
            Ok(())
        } else {
            Err(StatusCode::Other(0x13))
        }
    }

    async fn read_parameters(&mut self) -> SensorResult<SensorParameters> {
        let mut state = self.state();
        state.calls.push(SensorCall::ReadParameters);
        state.parameters
    }

    async fn template_count(&mut self) -> SensorResult<u16> {
        let mut state = self.state();
        state.calls.push(SensorCall::TemplateCount);
        Ok(state.library.len() as u16)
    }

    async fn capture(&mut self) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::Capture);
        let idle = state.idle_capture;
        state.captures.pop_front().unwrap_or(Err(idle))
    }

    async fn extract(&mut self, buffer: FeatureBuffer) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::Extract(buffer));
        state.extracts.pop_front().unwrap_or(Ok(()))
    }

    async fn create_model(&mut self) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::CreateModel);
        state.models.pop_front().unwrap_or(Ok(()))
    }

    async fn store_model(&mut self, id: TemplateId) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::StoreModel(id));
        let result = state.stores.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.library.insert(id);
        }
        result
    }

    async fn delete_template(&mut self, id: TemplateId) -> SensorResult<()> {
        let mut state = self.state();
        state.calls.push(SensorCall::DeleteTemplate(id));
        let result = match state.deletes.pop_front() {
            Some(result) => result,
            None if state.library.contains(&id) => Ok(()),
            None => Err(StatusCode::DeleteFail),
        };
        if result.is_ok() {
            state.library.remove(&id);
        }
        result
    }

    async fn search(&mut self) -> SensorResult<SearchMatch> {
        let mut state = self.state();
        state.calls.push(SensorCall::Search);
        state
            .searches
            .pop_front()
            .unwrap_or(Err(StatusCode::NotFound))
    }
}

/// Handle for scripting a [`MockSensor`] and inspecting its calls.
#[derive(Debug, Clone)]
pub struct MockSensorHandle {
    state: Arc<Mutex<SensorState>>,
}

impl MockSensorHandle {
    fn state(&self) -> MutexGuard<'_, SensorState> {
        lock(&self.state)
    }

    /// Another sensor backed by the same library, as after a reboot.
    pub fn device(&self) -> MockSensor {
        MockSensor {
            state: Arc::clone(&self.state),
        }
    }

    /// Queue the result of the next capture.
    pub fn queue_capture(&self, result: SensorResult<()>) {
        self.state().captures.push_back(result);
    }

    /// Queue `count` identical capture results.
    pub fn queue_captures(&self, count: usize, result: SensorResult<()>) {
        let mut state = self.state();
        state
            .captures
            .extend(std::iter::repeat_n(result, count));
    }

    /// Simulate a finger on the window for the next capture.
    pub fn present_finger(&self) {
        self.queue_capture(Ok(()));
    }

    /// Simulate an enrolled finger: the next capture succeeds and the next
    /// search matches `id`.
    pub fn present_enrolled(&self, id: TemplateId) {
        let mut state = self.state();
        state.captures.push_back(Ok(()));
        state
            .searches
            .push_back(Ok(SearchMatch::new(id, MOCK_MATCH_CONFIDENCE)));
    }

    /// Simulate an unknown finger: the next capture succeeds and the next
    /// search finds nothing.
    pub fn present_unknown(&self) {
        let mut state = self.state();
        state.captures.push_back(Ok(()));
        state.searches.push_back(Err(StatusCode::NotFound));
    }

    pub fn queue_extract(&self, result: SensorResult<()>) {
        self.state().extracts.push_back(result);
    }

    pub fn queue_create_model(&self, result: SensorResult<()>) {
        self.state().models.push_back(result);
    }

    pub fn queue_store(&self, result: SensorResult<()>) {
        self.state().stores.push_back(result);
    }

    pub fn queue_delete(&self, result: SensorResult<()>) {
        self.state().deletes.push_back(result);
    }

    pub fn queue_search(&self, result: SensorResult<SearchMatch>) {
        self.state().searches.push_back(result);
    }

    /// Status returned by `capture` when no capture is scripted.
    pub fn set_idle_capture(&self, status: StatusCode) {
        self.state().idle_capture = status;
    }

    pub fn set_password_ok(&self, ok: bool) {
        self.state().password_ok = ok;
    }

    pub fn set_parameters(&self, parameters: SensorResult<SensorParameters>) {
        self.state().parameters = parameters;
    }

    /// Put a template into the library without going through enrollment.
    pub fn insert_template(&self, id: TemplateId) {
        self.state().library.insert(id);
    }

    pub fn has_template(&self, id: TemplateId) -> bool {
        self.state().library.contains(&id)
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<SensorCall> {
        self.state().calls.clone()
    }

    /// Number of capture attempts received so far.
    pub fn capture_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| matches!(call, SensorCall::Capture))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_capture_reports_no_finger() {
        let (mut sensor, handle) = MockSensor::new();

        assert_eq!(sensor.capture().await, Err(StatusCode::NoFinger));

        handle.set_idle_capture(StatusCode::ImageFail);
        assert_eq!(sensor.capture().await, Err(StatusCode::ImageFail));
        assert_eq!(handle.capture_count(), 2);
    }

    #[tokio::test]
    async fn test_scripted_captures_run_in_order() {
        let (mut sensor, handle) = MockSensor::new();
        handle.queue_capture(Err(StatusCode::ImageMess));
        handle.present_finger();

        assert_eq!(sensor.capture().await, Err(StatusCode::ImageMess));
        assert_eq!(sensor.capture().await, Ok(()));
        assert_eq!(sensor.capture().await, Err(StatusCode::NoFinger));
    }

    #[tokio::test]
    async fn test_store_then_delete() {
        let (mut sensor, handle) = MockSensor::new();
        let id = TemplateId::new(5);

        sensor.store_model(id).await.unwrap();
        assert!(handle.has_template(id));
        assert_eq!(sensor.template_count().await, Ok(1));

        sensor.delete_template(id).await.unwrap();
        assert!(!handle.has_template(id));
    }

    #[tokio::test]
    async fn test_delete_empty_slot_fails() {
        let (mut sensor, _handle) = MockSensor::new();

        let result = sensor.delete_template(TemplateId::new(9)).await;
        assert_eq!(result, Err(StatusCode::DeleteFail));
    }

    #[tokio::test]
    async fn test_failed_store_leaves_library_untouched() {
        let (mut sensor, handle) = MockSensor::new();
        handle.queue_store(Err(StatusCode::FlashError));

        let result = sensor.store_model(TemplateId::new(3)).await;
        assert_eq!(result, Err(StatusCode::FlashError));
        assert!(!handle.has_template(TemplateId::new(3)));
    }

    #[tokio::test]
    async fn test_present_enrolled_matches() {
        let (mut sensor, handle) = MockSensor::new();
        handle.present_enrolled(TemplateId::new(7));

        sensor.capture().await.unwrap();
        sensor.extract(FeatureBuffer::One).await.unwrap();
        let found = sensor.search().await.unwrap();
        assert_eq!(found.id, TemplateId::new(7));

        assert_eq!(sensor.search().await, Err(StatusCode::NotFound));
        assert_eq!(
            handle.calls(),
            vec![
                SensorCall::Capture,
                SensorCall::Extract(FeatureBuffer::One),
                SensorCall::Search,
                SensorCall::Search,
            ]
        );
    }

    #[tokio::test]
    async fn test_password_failure() {
        let (mut sensor, handle) = MockSensor::new();
        handle.set_password_ok(false);

        assert!(sensor.verify_password().await.is_err());
    }

    #[tokio::test]
    async fn test_device_shares_library() {
        let (mut sensor, handle) = MockSensor::new();
        sensor.store_model(TemplateId::new(8)).await.unwrap();
        drop(sensor);

        let mut rebooted = handle.device();
        assert_eq!(rebooted.template_count().await, Ok(1));
        assert_eq!(rebooted.delete_template(TemplateId::new(8)).await, Ok(()));
    }
}

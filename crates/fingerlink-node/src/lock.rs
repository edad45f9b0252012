//! Exclusive access to the fingerprint sensor.
//!
//! The sensor is owned by an [`OperationLock`]; the only way to reach it is
//! through a [`SensorGuard`], so "touching the sensor without the lock" does
//! not compile. Dropping the guard releases the lock on every exit path,
//! `?` and panics included.

use std::ops::{Deref, DerefMut};
use std::sync::Mutex as StdMutex;

use fingerlink_core::Workflow;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Sensor behind an async mutex, tagged with the workflow holding it.
///
/// # Example
///
/// ```
/// use fingerlink_node::OperationLock;
/// use fingerlink_core::Workflow;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let lock = OperationLock::new(0u8);
///
/// let guard = lock.acquire(Workflow::Enrollment).await;
/// assert_eq!(lock.holder(), Some(Workflow::Enrollment));
/// assert!(lock.try_acquire(Workflow::Match).is_none());
///
/// drop(guard);
/// assert_eq!(lock.holder(), None);
/// # }
/// ```
#[derive(Debug)]
pub struct OperationLock<S> {
    sensor: Mutex<S>,
    holder: StdMutex<Option<Workflow>>,
}

impl<S> OperationLock<S> {
    pub fn new(sensor: S) -> Self {
        Self {
            sensor: Mutex::new(sensor),
            holder: StdMutex::new(None),
        }
    }

    /// Wait for the sensor and hold it for `workflow`.
    pub async fn acquire(&self, workflow: Workflow) -> SensorGuard<'_, S> {
        let sensor = self.sensor.lock().await;
        self.claim(sensor, workflow)
    }

    /// Take the sensor only if it is free right now.
    pub fn try_acquire(&self, workflow: Workflow) -> Option<SensorGuard<'_, S>> {
        let sensor = self.sensor.try_lock().ok()?;
        Some(self.claim(sensor, workflow))
    }

    /// Workflow currently holding the sensor.
    pub fn holder(&self) -> Option<Workflow> {
        *self.holder_slot()
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }

    fn claim<'a>(&'a self, sensor: MutexGuard<'a, S>, workflow: Workflow) -> SensorGuard<'a, S> {
        *self.holder_slot() = Some(workflow);
        trace!(%workflow, "Sensor acquired");
        SensorGuard {
            sensor,
            holder: &self.holder,
            workflow,
        }
    }

    fn holder_slot(&self) -> std::sync::MutexGuard<'_, Option<Workflow>> {
        self.holder.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Exclusive handle on the sensor; releases the lock when dropped.
pub struct SensorGuard<'a, S> {
    sensor: MutexGuard<'a, S>,
    holder: &'a StdMutex<Option<Workflow>>,
    workflow: Workflow,
}

impl<S> SensorGuard<'_, S> {
    pub fn workflow(&self) -> Workflow {
        self.workflow
    }
}

impl<S> Deref for SensorGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.sensor
    }
}

impl<S> DerefMut for SensorGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

impl<S> Drop for SensorGuard<'_, S> {
    fn drop(&mut self) {
        // Cleared before the mutex field is dropped, so the next holder's
        // claim always lands after this one.
        *self.holder.lock().unwrap_or_else(|p| p.into_inner()) = None;
        trace!(workflow = %self.workflow, "Sensor released");
    }
}

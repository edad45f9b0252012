use std::sync::Arc;

use fingerlink_core::{TemplateId, Workflow};
use fingerlink_hardware::{BiometricDevice, SensorResult};
use tracing::info;

use crate::lock::OperationLock;
use crate::stage::checked;

/// Removes templates from the sensor library.
pub struct DeletionWorkflow<S> {
    lock: Arc<OperationLock<S>>,
}

impl<S: BiometricDevice> DeletionWorkflow<S> {
    pub fn new(lock: Arc<OperationLock<S>>) -> Self {
        Self { lock }
    }

    /// Delete the template at `id`, returning the sensor status verbatim.
    pub async fn delete(&self, id: TemplateId) -> SensorResult<()> {
        let mut sensor = self.lock.acquire(Workflow::Deletion).await;
        checked(
            "delete:delete_template",
            &id.to_string(),
            sensor.delete_template(id).await,
        )?;
        info!(%id, "Template deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerlink_hardware::StatusCode;
    use fingerlink_hardware::mock::MockSensor;

    #[tokio::test]
    async fn test_delete_existing() {
        let (sensor, handle) = MockSensor::new();
        handle.insert_template(TemplateId::new(9));
        let lock = Arc::new(OperationLock::new(sensor));

        DeletionWorkflow::new(Arc::clone(&lock)).delete(TemplateId::new(9)).await.unwrap();

        assert!(!handle.has_template(TemplateId::new(9)));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_delete_empty_slot_returns_device_code() {
        let (sensor, _handle) = MockSensor::new();
        let lock = Arc::new(OperationLock::new(sensor));

        let result = DeletionWorkflow::new(Arc::clone(&lock))
            .delete(TemplateId::new(9))
            .await;

        assert_eq!(result, Err(StatusCode::DeleteFail));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn test_delete_scripted_flash_error() {
        let (sensor, handle) = MockSensor::new();
        handle.insert_template(TemplateId::new(2));
        handle.queue_delete(Err(StatusCode::FlashError));
        let lock = Arc::new(OperationLock::new(sensor));

        let result = DeletionWorkflow::new(lock).delete(TemplateId::new(2)).await;

        assert_eq!(result, Err(StatusCode::FlashError));
        assert!(handle.has_template(TemplateId::new(2)));
    }
}

//! Device trait definitions.
//!
//! These traits are the contract between the coordination core and the
//! peripherals of the node. Sensor methods return `impl Future + Send`
//! rather than plain `async fn` so that generic workflows stay spawnable on
//! a multi-threaded runtime; implementors can still write `async fn`.

use std::future::Future;
use std::sync::Arc;

use fingerlink_core::TemplateId;

use crate::status::SensorResult;
use crate::types::{BeepPattern, FeatureBuffer, Level, Screen, SearchMatch, SensorParameters};

/// Fingerprint sensor abstraction.
///
/// Every operation answers with the sensor's own status code on failure.
/// Callers must propagate that code rather than replace it with a generic
/// failure: "no finger" and "flash write failed" call for different actions.
///
/// # Examples
///
/// ```no_run
/// use fingerlink_hardware::traits::BiometricDevice;
/// use fingerlink_hardware::status::SensorResult;
/// use fingerlink_core::TemplateId;
///
/// async fn forget<B: BiometricDevice>(sensor: &mut B, id: u8) -> SensorResult<()> {
///     sensor.delete_template(TemplateId::new(id)).await
/// }
/// ```
pub trait BiometricDevice: Send {
    /// Check the sensor handshake password.
    fn verify_password(&mut self) -> impl Future<Output = SensorResult<()>> + Send;

    /// Read the sensor system parameters.
    fn read_parameters(&mut self) -> impl Future<Output = SensorResult<SensorParameters>> + Send;

    /// Number of templates currently stored in the library.
    fn template_count(&mut self) -> impl Future<Output = SensorResult<u16>> + Send;

    /// Acquire one image into the image buffer.
    ///
    /// Returns [`StatusCode::NoFinger`](crate::StatusCode::NoFinger) when the
    /// window is empty; callers poll this.
    fn capture(&mut self) -> impl Future<Output = SensorResult<()>> + Send;

    /// Extract features from the last image into `buffer`.
    fn extract(&mut self, buffer: FeatureBuffer) -> impl Future<Output = SensorResult<()>> + Send;

    /// Combine both feature buffers into a template model.
    fn create_model(&mut self) -> impl Future<Output = SensorResult<()>> + Send;

    /// Store the model at `id`, overwriting any template already there.
    fn store_model(&mut self, id: TemplateId) -> impl Future<Output = SensorResult<()>> + Send;

    /// Delete the template at `id`.
    fn delete_template(&mut self, id: TemplateId)
    -> impl Future<Output = SensorResult<()>> + Send;

    /// Search the library with the features in buffer one.
    fn search(&mut self) -> impl Future<Output = SensorResult<SearchMatch>> + Send;
}

/// Visual and audible user feedback.
///
/// Both calls are fire-and-forget: they return immediately and cannot fail.
/// Pacing (how long the caller waits after showing a screen) is decided by
/// the caller.
pub trait Notifier: Send + Sync {
    /// Show up to four lines of text.
    fn show(&self, screen: Screen);

    /// Play an audible pattern.
    fn beep(&self, pattern: BeepPattern);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn show(&self, screen: Screen) {
        (**self).show(screen)
    }

    fn beep(&self, pattern: BeepPattern) {
        (**self).beep(pattern)
    }
}

/// Digital input of the toggle button.
///
/// `Sync` so the loop owning the button can be borrowed across awaits on a
/// multi-threaded runtime.
pub trait ButtonInput: Send + Sync {
    /// Sample the current level.
    fn level(&mut self) -> Level;
}

//! Device abstraction layer for the Fingerlink node.
//!
//! This crate defines the seams between the coordination core and the
//! physical peripherals of an access node: the fingerprint sensor, the
//! display/buzzer pair used for user feedback, and the toggle button.
//! Each seam is a trait so workflows can run against mock devices in tests
//! and against real drivers on hardware.
//!
//! # Design Philosophy
//!
//! - **Async sensor I/O**: sensor operations return `impl Future + Send`, so a
//!   workflow holding a sensor can be spawned on a multi-threaded Tokio runtime.
//! - **Status codes are values**: every sensor operation answers with
//!   `Result<T, StatusCode>`. The specific code (no finger, flash error, ...)
//!   is user-actionable and travels unchanged up to the reporting layer.
//! - **Fire-and-forget feedback**: [`Notifier`] calls never fail and never
//!   block the caller.
//!
//! # Biometric Sensor
//!
//! ```no_run
//! use fingerlink_hardware::traits::BiometricDevice;
//! use fingerlink_hardware::types::FeatureBuffer;
//! use fingerlink_hardware::status::SensorResult;
//! use fingerlink_hardware::SearchMatch;
//!
//! async fn identify<B: BiometricDevice>(sensor: &mut B) -> SensorResult<SearchMatch> {
//!     sensor.capture().await?;
//!     sensor.extract(FeatureBuffer::One).await?;
//!     sensor.search().await
//! }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides scriptable devices that record every call,
//! used by the workflow tests and by the CLI simulation.

pub mod console;
pub mod mock;
pub mod status;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use console::LogNotifier;
pub use status::{SensorResult, StatusClass, StatusCode};
pub use traits::{BiometricDevice, ButtonInput, Notifier};
pub use types::{BeepPattern, FeatureBuffer, Level, Screen, SearchMatch, SensorParameters, Tone};

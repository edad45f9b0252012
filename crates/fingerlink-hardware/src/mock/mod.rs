//! Mock device implementations for testing and development.
//!
//! This module provides simulated devices that can be controlled
//! programmatically without requiring physical hardware. Every mock records
//! what the core asked of it so tests can assert on the exact sequence.

pub mod button;
pub mod notifier;
pub mod sensor;

// Re-export commonly used types
pub use button::{MockButton, MockButtonHandle};
pub use notifier::{Feedback, RecordingNotifier};
pub use sensor::{MockSensor, MockSensorHandle, SensorCall};

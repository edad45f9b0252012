//! Notifier that renders feedback into the log.
//!
//! Used by the CLI simulation and on hosts without a display attached.

use tracing::info;

use crate::traits::Notifier;
use crate::types::{BeepPattern, Screen};

/// [`Notifier`] backed by `tracing`.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn show(&self, screen: Screen) {
        let text = screen
            .lines()
            .iter()
            .filter(|line| !line.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" | ");
        info!(
            target: "fingerlink::display",
            hold_ms = screen.hold_duration().as_millis() as u64,
            "{text}"
        );
    }

    fn beep(&self, pattern: BeepPattern) {
        let tones = pattern
            .tones()
            .iter()
            .map(|t| format!("{}Hz/{}ms", t.frequency_hz, t.duration_ms))
            .collect::<Vec<_>>()
            .join(" ");
        info!(target: "fingerlink::buzzer", ?pattern, "{tones}");
    }
}

//! Common types shared across device seams.

use std::time::Duration;

use fingerlink_core::TemplateId;
use fingerlink_core::constants::{DEFAULT_SCREEN_HOLD_MS, DISPLAY_LINES};
use serde::{Deserialize, Serialize};

/// One screen of text for the node display.
///
/// Holds up to [`DISPLAY_LINES`] lines; extra lines are dropped on
/// construction. Blank lines are kept so that line positions stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screen {
    lines: Vec<String>,
    hold: Duration,
}

impl Screen {
    /// Create a screen with the default hold duration.
    ///
    /// # Examples
    ///
    /// ```
    /// use fingerlink_hardware::Screen;
    ///
    /// let screen = Screen::new(["Enroll mode", "ID: 5"]);
    /// assert_eq!(screen.lines(), ["Enroll mode", "ID: 5"]);
    ///
    /// let crowded = Screen::new(["1", "2", "3", "4", "5"]);
    /// assert_eq!(crowded.lines().len(), 4);
    /// ```
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines
                .into_iter()
                .take(DISPLAY_LINES)
                .map(Into::into)
                .collect(),
            hold: Duration::from_millis(DEFAULT_SCREEN_HOLD_MS),
        }
    }

    /// Set how long the screen should stay visible.
    #[must_use]
    pub fn hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold
    }

    /// First line, or an empty string for a blank screen.
    pub fn title(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or("")
    }

    /// Check whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|line| line.contains(needle))
    }
}

/// A single buzzer tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: u16,
    pub duration_ms: u16,
}

/// Audible feedback pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeepPattern {
    /// Single high tone.
    Success,
    /// Single long low tone.
    Failure,
    /// Two short falling tones, used when a status was switched to OFF.
    Toggled,
}

impl BeepPattern {
    /// Tone sequence a buzzer driver plays for this pattern.
    pub fn tones(&self) -> &'static [Tone] {
        match self {
            BeepPattern::Success => &[Tone {
                frequency_hz: 2000,
                duration_ms: 300,
            }],
            BeepPattern::Failure => &[Tone {
                frequency_hz: 500,
                duration_ms: 500,
            }],
            BeepPattern::Toggled => &[
                Tone {
                    frequency_hz: 1000,
                    duration_ms: 100,
                },
                Tone {
                    frequency_hz: 600,
                    duration_ms: 100,
                },
            ],
        }
    }

    /// Total playing time of the pattern.
    pub fn duration(&self) -> Duration {
        let ms: u64 = self.tones().iter().map(|t| u64::from(t.duration_ms)).sum();
        Duration::from_millis(ms)
    }
}

/// Logic level of a digital input.
///
/// The toggle button is wired with a pull-up, so `High` is released and
/// `Low` is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    High,
    Low,
}

/// Sensor feature buffer used to hold the features of one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureBuffer {
    One,
    Two,
}

impl FeatureBuffer {
    /// Buffer number as the sensor protocol numbers it.
    pub fn number(&self) -> u8 {
        match self {
            FeatureBuffer::One => 1,
            FeatureBuffer::Two => 2,
        }
    }
}

/// Positive answer of a library search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub id: TemplateId,
    pub confidence: u16,
}

impl SearchMatch {
    pub fn new(id: TemplateId, confidence: u16) -> Self {
        Self { id, confidence }
    }
}

/// System parameters reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorParameters {
    pub status_register: u16,
    pub system_id: u16,
    /// Number of template slots in the library.
    pub capacity: u16,
    pub security_level: u16,
    pub device_address: u32,
    pub packet_len: u16,
    pub baud_rate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_keeps_blank_lines() {
        let screen = Screen::new(["Title", "", "third"]);
        assert_eq!(screen.lines().len(), 3);
        assert_eq!(screen.title(), "Title");
        assert!(screen.contains("thi"));
    }

    #[test]
    fn test_screen_hold() {
        let screen = Screen::new(["Ready"]).hold(Duration::from_secs(2));
        assert_eq!(screen.hold_duration(), Duration::from_secs(2));

        let default = Screen::new(["Ready"]);
        assert_eq!(
            default.hold_duration(),
            Duration::from_millis(DEFAULT_SCREEN_HOLD_MS)
        );
    }

    #[test]
    fn test_empty_screen_title() {
        let screen = Screen::new(Vec::<String>::new());
        assert_eq!(screen.title(), "");
    }

    #[test]
    fn test_beep_durations() {
        assert_eq!(BeepPattern::Success.duration(), Duration::from_millis(300));
        assert_eq!(BeepPattern::Failure.duration(), Duration::from_millis(500));
        assert_eq!(BeepPattern::Toggled.duration(), Duration::from_millis(200));
        assert_eq!(BeepPattern::Toggled.tones().len(), 2);
    }

    #[test]
    fn test_feature_buffer_numbers() {
        assert_eq!(FeatureBuffer::One.number(), 1);
        assert_eq!(FeatureBuffer::Two.number(), 2);
    }

    #[test]
    fn test_beep_pattern_serialization() {
        let json = serde_json::to_string(&BeepPattern::Toggled).unwrap();
        assert_eq!(json, "\"toggled\"");
    }
}

//! Notifier that records every screen and beep.

use std::sync::Mutex;

use crate::traits::Notifier;
use crate::types::{BeepPattern, Screen};

/// One piece of feedback, in the order it was emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Screen(Screen),
    Beep(BeepPattern),
}

/// Recording [`Notifier`] for tests.
///
/// # Examples
///
/// ```
/// use fingerlink_hardware::mock::RecordingNotifier;
/// use fingerlink_hardware::{BeepPattern, Notifier, Screen};
///
/// let notifier = RecordingNotifier::new();
/// notifier.show(Screen::new(["Ready"]));
/// notifier.beep(BeepPattern::Success);
///
/// assert!(notifier.saw_screen("Ready"));
/// assert_eq!(notifier.beeps(), vec![BeepPattern::Success]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Feedback>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut Vec<Feedback>) -> T) -> T {
        let mut log = self.log.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut log)
    }

    /// All feedback in emission order.
    pub fn feedback(&self) -> Vec<Feedback> {
        self.with_log(|log| log.clone())
    }

    pub fn screens(&self) -> Vec<Screen> {
        self.with_log(|log| {
            log.iter()
                .filter_map(|f| match f {
                    Feedback::Screen(s) => Some(s.clone()),
                    Feedback::Beep(_) => None,
                })
                .collect()
        })
    }

    pub fn beeps(&self) -> Vec<BeepPattern> {
        self.with_log(|log| {
            log.iter()
                .filter_map(|f| match f {
                    Feedback::Beep(b) => Some(*b),
                    Feedback::Screen(_) => None,
                })
                .collect()
        })
    }

    pub fn last_screen(&self) -> Option<Screen> {
        self.screens().pop()
    }

    /// Check whether any screen so far contained `needle`.
    pub fn saw_screen(&self, needle: &str) -> bool {
        self.screens().iter().any(|s| s.contains(needle))
    }

    pub fn count_beeps(&self, pattern: BeepPattern) -> usize {
        self.beeps().iter().filter(|b| **b == pattern).count()
    }

    pub fn clear(&self) {
        self.with_log(|log| log.clear());
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, screen: Screen) {
        self.with_log(|log| log.push(Feedback::Screen(screen)));
    }

    fn beep(&self, pattern: BeepPattern) {
        self.with_log(|log| log.push(Feedback::Beep(pattern)));
    }
}

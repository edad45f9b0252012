//! Mock toggle button.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::traits::ButtonInput;
use crate::types::Level;

#[derive(Debug, Default)]
struct ButtonState {
    script: VecDeque<Level>,
    resting: Level,
    samples: usize,
}

/// Mock button sampled by the match loop.
///
/// Scripted levels are returned one per sample; once the script runs out
/// the button reports its resting level (`High`, released).
#[derive(Debug)]
pub struct MockButton {
    state: Arc<Mutex<ButtonState>>,
}

impl MockButton {
    pub fn new() -> (Self, MockButtonHandle) {
        let state = Arc::new(Mutex::new(ButtonState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockButtonHandle { state },
        )
    }
}

impl ButtonInput for MockButton {
    fn level(&mut self) -> Level {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.samples += 1;
        let resting = state.resting;
        state.script.pop_front().unwrap_or(resting)
    }
}

/// Handle for driving a [`MockButton`].
#[derive(Debug, Clone)]
pub struct MockButtonHandle {
    state: Arc<Mutex<ButtonState>>,
}

impl MockButtonHandle {
    /// Another button reading the same script.
    pub fn device(&self) -> MockButton {
        MockButton {
            state: Arc::clone(&self.state),
        }
    }

    /// Script a press and release: one `Low` sample followed by `High`.
    pub fn press(&self) {
        self.push_levels([Level::Low, Level::High]);
    }

    pub fn push_levels(&self, levels: impl IntoIterator<Item = Level>) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.script.extend(levels);
    }

    /// Level reported once the script is exhausted.
    pub fn set_resting(&self, level: Level) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state.resting = level;
    }

    /// Number of times the button was sampled.
    pub fn samples(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).samples
    }
}

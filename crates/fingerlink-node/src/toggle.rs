//! Button edge detection and the pending OFF toggle.

use std::sync::atomic::{AtomicBool, Ordering};

use fingerlink_hardware::Level;

/// Level change seen between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// High to low: the button was pressed.
    Falling,
    /// Low to high: the button was released.
    Rising,
}

/// Edge detector over successive button samples.
///
/// Starts from `High` (released, pulled up), so a button already held at
/// start-up reports one falling edge on the first sample.
///
/// # Example
///
/// ```
/// use fingerlink_node::{Edge, EdgeDetector};
/// use fingerlink_hardware::Level;
///
/// let mut detector = EdgeDetector::new();
/// assert_eq!(detector.update(Level::High), None);
/// assert_eq!(detector.update(Level::Low), Some(Edge::Falling));
/// assert_eq!(detector.update(Level::Low), None);
/// assert_eq!(detector.update(Level::High), Some(Edge::Rising));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    previous: Level,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next sample.
    pub fn update(&mut self, level: Level) -> Option<Edge> {
        let edge = match (self.previous, level) {
            (Level::High, Level::Low) => Some(Edge::Falling),
            (Level::Low, Level::High) => Some(Edge::Rising),
            _ => None,
        };
        self.previous = level;
        edge
    }

    pub fn previous(&self) -> Level {
        self.previous
    }
}

/// One-shot flag marking the next reported match as an OFF event.
#[derive(Debug, Default)]
pub struct OffToggle {
    armed: AtomicBool,
}

impl OffToggle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the flag. Returns `true` if it was already armed.
    pub fn arm(&self) -> bool {
        self.armed.swap(true, Ordering::AcqRel)
    }

    /// Consume the flag: returns whether it was armed and leaves it clear.
    pub fn take(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

//! Phase tracking for the match loop.
//!
//! # Valid Transitions
//!
//! - Idle → Capturing → Idle (no finger, extraction failed)
//! - Capturing → Matching → Idle (no match)
//! - Matching → Reporting → Idle
//!
//! # Examples
//!
//! ```
//! use fingerlink_node::{MatchPhase, PhaseTracker};
//!
//! let mut phases = PhaseTracker::new();
//! phases.transition_to(MatchPhase::Capturing).unwrap();
//! phases.transition_to(MatchPhase::Matching).unwrap();
//! assert!(phases.transition_to(MatchPhase::Capturing).is_err());
//! assert_eq!(phases.current(), MatchPhase::Matching);
//! ```

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use fingerlink_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Transitions kept in history.
///
/// A reported scan is four transitions, so this covers the last few scans.
const MAX_HISTORY_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Waiting for a finger, or backing off while the sensor is busy.
    #[default]
    Idle,

    /// An image is being taken and turned into features.
    Capturing,

    /// The library is being searched.
    Matching,

    /// A match is being reported to the server.
    Reporting,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchPhase::Idle => "Idle",
            MatchPhase::Capturing => "Capturing",
            MatchPhase::Matching => "Matching",
            MatchPhase::Reporting => "Reporting",
        };
        f.write_str(s)
    }
}

impl MatchPhase {
    /// ```
    /// use fingerlink_node::MatchPhase;
    ///
    /// assert!(MatchPhase::Idle.can_transition_to(&MatchPhase::Capturing));
    /// assert!(!MatchPhase::Idle.can_transition_to(&MatchPhase::Reporting));
    /// ```
    pub fn can_transition_to(&self, target: &MatchPhase) -> bool {
        matches!(
            (self, target),
            (MatchPhase::Idle, MatchPhase::Capturing)
                | (MatchPhase::Capturing, MatchPhase::Idle | MatchPhase::Matching)
                | (MatchPhase::Matching, MatchPhase::Idle | MatchPhase::Reporting)
                | (MatchPhase::Reporting, MatchPhase::Idle)
        )
    }
}

/// One recorded phase change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    pub from: MatchPhase,
    pub to: MatchPhase,
    pub at: DateTime<Utc>,
}

/// Current match phase with bounded history.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    current: MatchPhase,
    entered_at: DateTime<Utc>,
    history: VecDeque<PhaseTransition>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self {
            current: MatchPhase::Idle,
            entered_at: Utc::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current(&self) -> MatchPhase {
        self.current
    }

    pub fn entered_at(&self) -> DateTime<Utc> {
        self.entered_at
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PhaseTransition> {
        &self.history
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if `next` is not reachable
    /// from the current phase; the phase is left unchanged.
    pub fn transition_to(&mut self, next: MatchPhase) -> Result<PhaseTransition> {
        if !self.current.can_transition_to(&next) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }
        Ok(self.record(next))
    }

    /// Return to `Idle` from any phase.
    pub fn reset(&mut self) {
        if self.current != MatchPhase::Idle {
            self.record(MatchPhase::Idle);
        }
    }

    fn record(&mut self, next: MatchPhase) -> PhaseTransition {
        let transition = PhaseTransition {
            from: self.current,
            to: next,
            at: Utc::now(),
        };
        if self.history.len() == MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition.clone());
        self.current = next;
        self.entered_at = transition.at;
        transition
    }

    /// Phases visited, starting with the phase before the oldest transition.
    pub fn path(&self) -> Vec<MatchPhase> {
        let mut path: Vec<_> = self.history.front().map(|t| t.from).into_iter().collect();
        path.extend(self.history.iter().map(|t| t.to));
        path
    }
}

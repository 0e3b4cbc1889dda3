//! Per-unit progress through the extraction phase

use crate::PipelineError;
use scriptorium_domain::UnitId;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Where a unit stands in the extraction phase
///
/// ```text
/// pending -> generating -> validating -> cached
///    |           |
///    |           +-> failed
///    +-> cached            (entry found in the cache)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Not looked at yet
    Pending,
    /// Waiting on the generator
    Generating,
    /// Records being validated
    Validating,
    /// Done; the validated output was handed to the cache
    Cached,
    /// The generator gave up on this unit
    Failed,
}

impl UnitState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Cached | UnitState::Failed)
    }

    /// Whether `next` may follow this state
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        matches!(
            (self, next),
            (UnitState::Pending, UnitState::Generating)
                | (UnitState::Pending, UnitState::Cached)
                | (UnitState::Generating, UnitState::Validating)
                | (UnitState::Generating, UnitState::Failed)
                | (UnitState::Validating, UnitState::Cached)
        )
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitState::Pending => "pending",
            UnitState::Generating => "generating",
            UnitState::Validating => "validating",
            UnitState::Cached => "cached",
            UnitState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of one unit, advanced only along valid transitions
#[derive(Debug, Clone)]
pub(crate) struct UnitTracker {
    unit_id: UnitId,
    state: UnitState,
}

impl UnitTracker {
    pub(crate) fn new(unit_id: UnitId) -> Self {
        Self {
            unit_id,
            state: UnitState::Pending,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> UnitState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: UnitState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition(format!(
                "{}: {} -> {}",
                self.unit_id, self.state, next
            )));
        }
        debug!("Unit {}: {} -> {}", self.unit_id, self.state, next);
        self.state = next;
        Ok(())
    }
}

/// A unit left out of the global phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOmission {
    /// The failed unit
    pub unit_id: UnitId,
    /// Its position in the document
    pub ordinal: usize,
    /// Generation attempts spent on it
    pub attempts: u32,
    /// Final error
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut tracker = UnitTracker::new(UnitId::from_ordinal(3));
        assert_eq!(tracker.state(), UnitState::Pending);
        tracker.advance(UnitState::Generating).unwrap();
        tracker.advance(UnitState::Validating).unwrap();
        tracker.advance(UnitState::Cached).unwrap();
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn test_cache_hit_skips_generation() {
        let mut tracker = UnitTracker::new(UnitId::from_ordinal(1));
        tracker.advance(UnitState::Cached).unwrap();
        assert_eq!(tracker.state(), UnitState::Cached);
    }

    #[test]
    fn test_failure_only_from_generating() {
        let mut tracker = UnitTracker::new(UnitId::from_ordinal(7));
        assert!(tracker.advance(UnitState::Failed).is_err());
        tracker.advance(UnitState::Generating).unwrap();
        tracker.advance(UnitState::Failed).unwrap();
        assert!(tracker.state().is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [UnitState::Cached, UnitState::Failed] {
            for next in [
                UnitState::Pending,
                UnitState::Generating,
                UnitState::Validating,
                UnitState::Cached,
                UnitState::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_invalid_transition_names_unit() {
        let mut tracker = UnitTracker::new(UnitId::from_ordinal(2));
        let err = tracker.advance(UnitState::Validating).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid unit state transition: U2: pending -> validating"
        );
    }
}

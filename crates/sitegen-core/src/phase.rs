//! Per-request generation phases
//!
//! A request that misses the cache walks `Idle -> ContextGathering ->
//! Requesting -> Extracting -> (DirectiveScanning <-> Extracting)* -> Cached
//! -> Served`. Image requests skip the text stages and go straight from
//! context gathering to `Cached`. Any non-terminal phase may fail.

use crate::error::GenerationError;
use serde::Serialize;

/// Generation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Idle,
    ContextGathering,
    Requesting,
    Extracting,
    DirectiveScanning,
    Cached,
    Served,
    Failed,
}

impl GenerationPhase {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Served | Self::Failed)
    }
}

/// Validates a phase transition
pub fn validate_transition(from: GenerationPhase, to: GenerationPhase) -> Result<(), GenerationError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(GenerationError::InvalidTransition { from, to })
    }
}

/// Phases reachable in one step from `from`
#[must_use]
pub fn allowed_transitions(from: GenerationPhase) -> Vec<GenerationPhase> {
    use GenerationPhase::*;
    match from {
        Idle => vec![ContextGathering, Failed],
        ContextGathering => vec![Requesting, Cached, Failed],
        Requesting => vec![Extracting, Failed],
        Extracting => vec![DirectiveScanning, Cached, Failed],
        DirectiveScanning => vec![Extracting, Cached, Failed],
        Cached => vec![Served, Failed],
        Served | Failed => vec![],
    }
}

/// Records the phases one request passed through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTracker {
    history: Vec<GenerationPhase>,
}

impl PhaseTracker {
    /// Start in `Idle`
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![GenerationPhase::Idle],
        }
    }

    /// Current phase
    #[inline]
    #[must_use]
    pub fn current(&self) -> GenerationPhase {
        self.history.last().copied().unwrap_or(GenerationPhase::Idle)
    }

    /// Every phase entered, in order
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[GenerationPhase] {
        &self.history
    }

    /// Move to `to`, rejecting illegal transitions
    pub fn advance(&mut self, to: GenerationPhase) -> Result<(), GenerationError> {
        validate_transition(self.current(), to)?;
        tracing::trace!("phase: {:?} -> {:?}", self.current(), to);
        self.history.push(to);
        Ok(())
    }

    /// Mark the request failed; no-op once terminal
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.history.push(GenerationPhase::Failed);
        }
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use GenerationPhase::*;

    #[test]
    fn text_path_is_legal() {
        let mut tracker = PhaseTracker::new();
        for phase in [ContextGathering, Requesting, Extracting, DirectiveScanning, Extracting, Cached, Served] {
            tracker.advance(phase).unwrap();
        }
        assert_eq!(tracker.current(), Served);
        assert_eq!(tracker.history().len(), 8);
    }

    #[test]
    fn image_path_skips_text_stages() {
        let mut tracker = PhaseTracker::new();
        tracker.advance(ContextGathering).unwrap();
        tracker.advance(Cached).unwrap();
        tracker.advance(Served).unwrap();
    }

    #[test]
    fn illegal_transition_rejected() {
        let mut tracker = PhaseTracker::new();
        let err = tracker.advance(Served).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidTransition { from: Idle, to: Served }));
        assert_eq!(tracker.current(), Idle);
    }

    #[test]
    fn terminal_phases_are_final() {
        assert!(allowed_transitions(Served).is_empty());
        assert!(allowed_transitions(Failed).is_empty());

        let mut tracker = PhaseTracker::new();
        tracker.fail();
        tracker.fail();
        assert_eq!(tracker.history(), &[Idle, Failed]);
    }
}

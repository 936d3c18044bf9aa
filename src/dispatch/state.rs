//! Per-request dispatch lifecycle.

use crate::types::{Error, Result};
use serde::{Deserialize, Serialize};

/// Dispatch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    Received,
    NameResolved,
    Validated,
    Executing,
    Responded,
    Failed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Responded | DispatchState::Failed)
    }

    /// Check if transition is valid.
    pub fn can_transition_to(self, to: DispatchState) -> bool {
        match (self, to) {
            // Forward path
            (DispatchState::Received, DispatchState::NameResolved) => true,
            (DispatchState::NameResolved, DispatchState::Validated) => true,
            (DispatchState::Validated, DispatchState::Executing) => true,
            (DispatchState::Executing, DispatchState::Responded) => true,
            // Any non-terminal state may fail
            (from, DispatchState::Failed) => !from.is_terminal(),
            // Responded and Failed are terminal
            _ => false,
        }
    }
}

/// Ordered record of the states one request passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchTrace {
    states: Vec<DispatchState>,
}

impl Default for DispatchTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTrace {
    pub fn new() -> Self {
        Self {
            states: vec![DispatchState::Received],
        }
    }

    pub fn current(&self) -> DispatchState {
        self.states
            .last()
            .copied()
            .unwrap_or(DispatchState::Received)
    }

    /// Move to `to`, rejecting illegal transitions.
    pub fn advance(&mut self, to: DispatchState) -> Result<()> {
        let from = self.current();
        if !from.can_transition_to(to) {
            return Err(Error::internal(format!(
                "Illegal dispatch transition {:?} -> {:?}",
                from, to
            )));
        }
        self.states.push(to);
        Ok(())
    }

    /// Move to `Failed` unless already terminal.
    pub fn fail(&mut self) {
        if !self.current().is_terminal() {
            self.states.push(DispatchState::Failed);
        }
    }

    pub fn states(&self) -> &[DispatchState] {
        &self.states
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DispatchState::*;

    #[test]
    fn test_forward_path() {
        let mut trace = DispatchTrace::new();
        for next in [NameResolved, Validated, Executing, Responded] {
            trace.advance(next).unwrap();
        }
        assert_eq!(
            trace.states(),
            &[Received, NameResolved, Validated, Executing, Responded]
        );
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal_state() {
        for state in [Received, NameResolved, Validated, Executing] {
            assert!(state.can_transition_to(Failed), "{state:?}");
        }
        assert!(!Responded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Failed));
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut trace = DispatchTrace::new();
        assert!(trace.advance(Executing).is_err());
        assert!(trace.advance(Responded).is_err());
        assert_eq!(trace.current(), Received);

        trace.fail();
        assert_eq!(trace.current(), Failed);
        assert!(trace.advance(NameResolved).is_err());
        trace.fail();
        assert_eq!(trace.states(), &[Received, Failed]);
    }

    #[test]
    fn test_terminal_states() {
        assert!(Responded.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Executing.is_terminal());
    }
}

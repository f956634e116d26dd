use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{SessionEvent, SessionState, StateTransition};

/// Most recent transitions kept for diagnostics.
pub const TRANSITION_HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct StateMachine {
    state: SessionState,
    transition_history: VecDeque<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            transition_history: VecDeque::with_capacity(TRANSITION_HISTORY_LIMIT),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            (SessionState::Empty | SessionState::Ready, BeginLoad) => Some(SessionState::Loading),
            (SessionState::Loading, Loaded) => Some(SessionState::Ready),
            (SessionState::Loading, LoadFailed) => Some(SessionState::Empty),
            (SessionState::Ready, BeginPageSwitch) => Some(SessionState::SwitchingPage),
            (SessionState::SwitchingPage, BeginPageSwitch) => Some(SessionState::SwitchingPage),
            (SessionState::SwitchingPage, PageSwitched | PageSwitchFailed) => {
                Some(SessionState::Ready)
            }
            (_, Unload) => Some(SessionState::Empty),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        if self.transition_history.len() == TRANSITION_HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history.push_back(record);

        Ok(self.state)
    }

    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.transition_history
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}

use super::event::SessionEvent;
use super::model::SessionState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("invalid state transition: from {from:?} using event {event:?}")]
    InvalidStateTransition {
        from: SessionState,
        event: SessionEvent,
    },
    #[error("session is not ready for edits (state {state:?})")]
    NotReady { state: SessionState },
}

use crate::collab::CollaboratorError;
use crate::scene::ObjectId;
use crate::state::StateError;
use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors surfaced to the editing session. Every variant is recoverable: the
/// session stays usable and the history cursor is never left half-updated.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("object {id} not found")]
    ObjectNotFound { id: ObjectId },

    #[error("invalid range: {message}")]
    InvalidRange { message: String },

    #[error("failed to decode source: {message}")]
    DecodeFailure { message: String },

    #[error("{service} failed: {source}")]
    CollaboratorFailure {
        service: &'static str,
        #[source]
        source: CollaboratorError,
    },

    #[error("document is password protected")]
    PasswordRequired,

    #[error("incorrect document password")]
    IncorrectPassword,

    #[error("no document is loaded")]
    NoDocument,

    #[error("failed to encode output: {message}")]
    Encode { message: String },

    #[error(transparent)]
    State(#[from] StateError),
}

impl EngineError {
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Maps a collaborator failure, lifting password problems into their own kinds.
    pub fn from_collaborator(service: &'static str, source: CollaboratorError) -> Self {
        match source {
            CollaboratorError::PasswordRequired => Self::PasswordRequired,
            CollaboratorError::IncorrectPassword => Self::IncorrectPassword,
            CollaboratorError::Decode { message } => Self::DecodeFailure { message },
            source => Self::CollaboratorFailure { service, source },
        }
    }
}

use thiserror::Error;

use tutorloom_llm::CollaboratorError;

/// Typed error sentinels the conversation state machine can surface.
///
/// Every public verb returns one of these instead of a bare string, so a
/// caller can match on the failure mode rather than parse a message.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("invalid transition: {event} is not valid from state {state}")]
    InvalidTransition { state: &'static str, event: &'static str },

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("unit {0} not found in the attached assignment")]
    NotFound(String),

    #[error("generator call exceeded its deadline")]
    GeneratorTimeout,

    #[error("generator backend error: {0}")]
    GeneratorError(String),

    #[error("embedding backend error: {0}")]
    EmbeddingError(String),

    #[error("stored blob does not match the expected schema: {0}")]
    SchemaMismatch(String),

    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Soft, non-fatal: reallocation was requested during the bounded-delay
    /// freeze window and was ignored. The queue is unchanged.
    #[error("reallocation denied: queue is frozen until turn {frozen_until}")]
    StabilityBlock { frozen_until: i64 },
}

impl From<CollaboratorError> for ConversationError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::Timeout => ConversationError::GeneratorTimeout,
            CollaboratorError::Generator(msg) => ConversationError::GeneratorError(msg),
            CollaboratorError::Embedding(msg) => ConversationError::EmbeddingError(msg),
        }
    }
}

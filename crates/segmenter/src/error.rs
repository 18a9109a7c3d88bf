use thiserror::Error;
use tutorloom_llm::CollaboratorError;

/// Segmentation-specific errors (spec §7: `EMBEDDING_ERROR`, `INPUT_INVALID`).
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("input text is empty or contains no paragraph meeting the length filter")]
    InputInvalid,
    #[error("embedding backend error: {0}")]
    Embedding(#[from] CollaboratorError),
}

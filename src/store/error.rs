//! Store-specific error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("topic not registered: {0}")]
    UnknownTopic(String),

    #[error("no message at offset {offset} in topic {topic}")]
    MessageNotFound { topic: String, offset: i64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

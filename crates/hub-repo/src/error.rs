//! Errors surfaced by both repository implementations.

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("order {0} not found")]
    OrderNotFound(uuid::Uuid),
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("row decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    SameChain(#[from] hub_types::SameChainError),
}

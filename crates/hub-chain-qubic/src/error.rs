//! Errors surfaced by the chain-Q event poller.

#[derive(Debug, thiserror::Error)]
pub enum ChainQubicError {
    #[error("transport failure: {0}")]
    Transport(#[from] hub_net::HttpError),
    #[error("repository error: {0}")]
    Repo(#[from] hub_repo::RepoError),
}

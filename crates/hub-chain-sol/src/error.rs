//! Errors surfaced by the chain-S poller and listener.

#[derive(Debug, thiserror::Error)]
pub enum ChainSolError {
    #[error("transport failure: {0}")]
    Transport(#[from] hub_net::HttpError),
    #[error("repository error: {0}")]
    Repo(#[from] hub_repo::RepoError),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

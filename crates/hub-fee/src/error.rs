//! Errors surfaced by the fee estimator.

#[derive(Debug, thiserror::Error)]
pub enum FeeError {
    #[error("source and destination network must differ")]
    SameNetwork,
    #[error("too few healthy oracles to estimate a relayer fee")]
    EstimateUnavailable,
    #[error("amount too small to cover bridge and relayer fees")]
    AmountTooSmall,
    #[error("network fee estimate failed: {0}")]
    NetworkFee(#[from] hub_net::HttpError),
}

use thiserror::Error;

use chain::RpcError;

/// Normalized execution-layer failures (§4.F, §7). Kept small and
/// stable-stringed at the boundary the way `classify_error` in the
/// teacher's router collapses arbitrary transport errors into a fixed
/// taxonomy.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("submission failed: {0}")]
    SubmissionFailed(String),
    #[error("receipt not observed within the execution deadline")]
    DeadlineExceeded,
    #[error("cancel-replacement retries exhausted ({0} attempts)")]
    ReplacementsExhausted(u32),
    #[error("no nonce available for this signer")]
    NonceUnavailable,
    #[error("transport error: {0}")]
    Transport(#[from] RpcError),
}

/// Collapses a transport error into one of the stable tags used for
/// decision-making (retry vs. fail) and for the revert-reason surface.
pub fn classify_error(err: &RpcError) -> &'static str {
    match err {
        RpcError::Timeout(_) => "Timeout",
        RpcError::RateLimited => "RateLimited",
        RpcError::NoHealthyEndpoint => "NoHealthyEndpoint",
        RpcError::Reverted(_) => "Reverted",
        RpcError::NonceTooLow => "NonceTooLow",
        RpcError::JsonRpc { .. } => "JsonRpc",
        RpcError::MalformedResponse(_) => "MalformedResponse",
        RpcError::Http(_) => "Http",
    }
}

pub mod error;
pub mod nonce;
pub mod router;
pub mod submitter;
pub mod worker;

pub use error::{ExecutionError, classify_error};
pub use nonce::NonceAllocator;
pub use router::ExecutorRouter;
pub use submitter::{ChainClientSubmitter, Signer, Submitter};
pub use worker::{ExecutorConfig, ExecutorWorker, PendingExecution};

use executor::Signer;
use rust_decimal::Decimal;

use core_model::{execution::Plan, ChainId};

/// Placeholder for real key-custody signing. Mirrors the teacher's
/// `DummySwapExecutor` in `backend/src/main.rs`: a concrete stand-in marked
/// for replacement, not a working implementation. Production wiring injects
/// a real `Signer` (HSM, KMS, local keystore); running with this one is only
/// safe under `DRY_RUN_MODE`, which never calls `ExecutorRouter::dispatch`
/// at all.
pub struct UnwiredSigner;

impl Signer for UnwiredSigner {
    fn sign(&self, _chain: ChainId, _plan: &Plan, _nonce: u64, _gas_price: Decimal) -> String {
        unimplemented!("no key-custody signer is wired; run with DRY_RUN_MODE=true")
    }
}

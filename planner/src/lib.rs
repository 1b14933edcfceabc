pub mod assembly;
pub mod error;
pub mod provider;

pub use assembly::assemble_and_simulate;
pub use error::PlanError;
pub use provider::{FlashLoanProvider, select_provider};

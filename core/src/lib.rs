//! Shared domain model: the chains, venues, pairs, quotes, opportunities and
//! executions every other crate in the workspace operates on. Nothing here
//! performs I/O; it is the typed vocabulary the rest of the system shares.

pub mod chain;
pub mod execution;
pub mod opportunity;
pub mod pair;
pub mod quote;
pub mod venue;

pub use chain::{ChainId, ChainMeta};
pub use execution::{Call, Execution, ExecutionStatus, Plan};
pub use opportunity::{Opportunity, RiskClass};
pub use pair::{Token, TokenPair};
pub use quote::Quote;
pub use venue::{PricingModel, Venue, VenueName};

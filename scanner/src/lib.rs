pub mod admission;
pub mod confidence;
pub mod config;
pub mod live_map;
pub mod poller;
pub mod ranking;
pub mod scan;

pub use admission::{Admission, CooldownTracker, check_admission};
pub use config::{AdmissionConfig, ConfidenceWeights, RiskConfig, RiskThresholds};
pub use live_map::LiveOpportunityMap;
pub use poller::{FailureBreaker, QuoteSource, ScanError};
pub use ranking::rank;
pub use scan::{ScanContext, scan_tick};

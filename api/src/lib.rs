//! The read model and control surface observers poll or stream against
//! (§4.H). Plain async functions and structs rather than HTTP handlers: a
//! REST layer sitting in front of these would only deserialize query params
//! and call straight through.

pub mod config;
pub mod control;
pub mod feed;
pub mod views;

pub use config::{get_config, put_config, ConfigError, ConfigSchema};
pub use feed::{Event, EventFeed, EventKind};
pub use views::{chain_health, list_opportunities, portfolio_stats, ChainHealthView, OpportunityQuery, PortfolioStats};

#![deny(clippy::dbg_macro)]

pub mod collection;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod holdings;
pub mod service;
pub mod types;

pub use config::TrackerConfig;
pub use errors::{ConfigError, TrackerError};
pub use holdings::aggregate;
pub use service::{HoldingsSource, Providers, TrackerService};

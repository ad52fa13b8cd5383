// Public modules
pub mod config;
pub mod error;
pub mod filter;
pub mod flatten;
pub mod foundry;
pub mod poller;
pub mod slack;
pub mod types;

// Re-export commonly used items
pub use config::{
    load_config, load_config_with_env, EnvironmentProvider, MockEnvironment, SystemEnvironment,
};
pub use error::RelayError;
pub use filter::{filter_recent, parse_timestamp};
pub use flatten::{build_record_table, cell, flatten_record};
pub use foundry::FoundryClient;
pub use poller::{CycleReport, Poller};
pub use slack::{build_insight_message, field_or, SlackClient};
pub use types::*;

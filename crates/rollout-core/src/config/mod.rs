//! Deployment configuration (rollout.toml).

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use parser::{parse_rollout_toml, parse_rollout_toml_str, to_toml};
pub use paths::{CONFIG_FILE_NAME, discover_config_path};
pub use schema::{
    DependencyConfig, RolloutConfig, SelectionConfig, ServiceConfigEntry, SourceConfig,
    StateConfig, SupervisorConfig, VerificationConfig,
};
pub use store::ConfigStore;

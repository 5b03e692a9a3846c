pub mod activity;
pub mod app_config;
pub mod auth;
pub mod branches;
pub mod config;
pub mod storage_key;

pub use activity::{ActivityLog, ActivityUser};
pub use app_config::{AppConfig, Environment};
pub use auth::{StoredAuth, User, UserType};
pub use branches::Branch;
pub use config::{load_app_config, load_app_config_from_env};
pub use storage_key::{StorageKey, ALL_BRANCHES_SENTINEL};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

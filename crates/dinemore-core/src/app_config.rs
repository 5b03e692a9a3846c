use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Client configuration resolved from `DINEMORE_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server origin every `/api/...` path is resolved against.
    pub api_base_url: String,
    pub env: Environment,
    pub log_level: String,
    /// Location of the file-backed client-local storage.
    pub storage_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub activity_log_limit: u32,
}

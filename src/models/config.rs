use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUEST_LIMIT: i64 = 500;
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u64 = 5;

/// Session credentials copied from the dashboard cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.user_id.is_empty()
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_id: String,
    /// Used when the usage endpoint reports no request cap
    #[serde(default = "default_request_limit")]
    pub default_request_limit: i64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64, // Minutes
    /// Optional upstream proxy, e.g. `http://127.0.0.1:7890` or `socks5://...`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

fn default_request_limit() -> i64 {
    DEFAULT_REQUEST_LIMIT
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

impl AppConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            token: credentials.token,
            user_id: credentials.user_id,
            default_request_limit: DEFAULT_REQUEST_LIMIT,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            proxy: None,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone(), self.user_id.clone())
    }

    pub fn is_valid(&self) -> bool {
        self.credentials().is_valid()
    }

    /// Refresh period, never shorter than one minute
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }
}

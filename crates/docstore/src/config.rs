use docstore_core::ClientOptions;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration for docstore.
///
/// Read from a JSON file by the `docstore` binary; library users can build
/// it directly. All fields use sensible defaults if not specified.
///
/// # Examples
///
/// ```
/// use docstore::config::StoreConfig;
///
/// let json = r#"{
///     "api": { "base_url": "https://api.example.com" },
///     "cache": { "ttl_secs": 60 }
/// }"#;
///
/// let config: StoreConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.api.base_url, "https://api.example.com");
/// assert_eq!(config.cache.ttl_secs, 60);
/// assert!(config.cache.enabled);
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Configuration for the HTTP document API.
///
/// # Defaults
///
/// - `base_url`: `""` (must be provided)
/// - `timeout_secs`: `30`
/// - `user_agent`: `"docstore/<version>"`
/// - `allow_insecure`: `false`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub allow_insecure: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            allow_insecure: false,
        }
    }
}

impl ApiConfig {
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            allow_insecure: self.allow_insecure,
        }
    }
}

/// Configuration for the library cache.
///
/// # Defaults
///
/// - `enabled`: `true`
/// - `ttl_secs`: `300` (5 minutes)
///
/// # Examples
///
/// ```
/// use docstore::config::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig {
///     enabled: true,
///     ttl_secs: 600,
/// };
///
/// assert_eq!(config.ttl(), Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

// Default value functions
const fn default_true() -> bool {
    true
}

const fn default_timeout() -> u64 {
    30
}

const fn default_ttl() -> u64 {
    300 // 5 minutes
}

fn default_user_agent() -> String {
    concat!("docstore/", env!("CARGO_PKG_VERSION")).to_string()
}

//! # Client Configuration
//!
//! Configuration for the sale desk client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKDESK_API_URL=https://shop.example.com/api                     │
//! │     STOCKDESK_TOKEN=9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockdesk/client.toml (Linux)                            │
//! │     ~/Library/Application Support/com.stockdesk.stockdesk/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8000/api, staff role, 60s cache                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [api]
//! base_url = "https://shop.example.com/api"
//! timeout_secs = 15
//!
//! [session]
//! username = "cashier1"
//! role = "staff"
//!
//! [cache]
//! ttl_secs = 60
//!
//! [stock]
//! low_stock_threshold = 5
//!
//! [display]
//! currency_symbol = "KSh"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use stockdesk_core::{Money, Role, DEFAULT_LOW_STOCK_THRESHOLD};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Settings
// =============================================================================

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the REST API. Endpoints are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("stockdesk/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// Who is signed in at this desk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub role: Role,

    /// API token. Prefer `STOCKDESK_TOKEN` over writing it to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            username: "cashier".to_string(),
            role: Role::default(),
            token: None,
        }
    }
}

// =============================================================================
// Cache / Stock / Display Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// How long fetched products and customers are reused (seconds).
    /// 0 disables caching.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    60
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSettings {
    /// Low-stock threshold for products without a reorder point.
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
}

fn default_low_stock_threshold() -> i64 {
    DEFAULT_LOW_STOCK_THRESHOLD
}

impl Default for StockSettings {
    fn default() -> Self {
        StockSettings {
            low_stock_threshold: default_low_stock_threshold(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Prefix for amounts on screen, e.g. `"KSh"`. Empty prints bare numbers.
    #[serde(default)]
    pub currency_symbol: String,
}

impl DisplaySettings {
    /// `"KSh 120.00"`, or `"120.00"` without a symbol.
    pub fn format_currency(&self, amount: Money) -> String {
        if self.currency_symbol.is_empty() {
            amount.to_string()
        } else {
            format!("{} {}", self.currency_symbol, amount)
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub stock: StockSettings,

    #[serde(default)]
    pub display: DisplaySettings,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file. The token is never written.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let mut on_disk = self.clone();
        on_disk.session.token = None;
        let contents = toml::to_string_pretty(&on_disk)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.base_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.stock.low_stock_threshold < 0 {
            return Err(ClientError::InvalidConfig(
                "low_stock_threshold must not be negative".into(),
            ));
        }

        Ok(())
    }

    /// Applies `STOCKDESK_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("STOCKDESK_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup("STOCKDESK_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.api.timeout_secs = t,
                Err(_) => warn!(value = %timeout, "Ignoring invalid STOCKDESK_TIMEOUT_SECS"),
            }
        }

        if let Some(token) = lookup("STOCKDESK_TOKEN") {
            debug!("Using API token from environment");
            self.session.token = Some(token);
        }

        if let Some(username) = lookup("STOCKDESK_USERNAME") {
            self.session.username = username;
        }

        if let Some(role) = lookup("STOCKDESK_ROLE") {
            match role.parse::<Role>() {
                Ok(r) => {
                    debug!(role = %r, "Overriding role from environment");
                    self.session.role = r;
                }
                Err(_) => warn!(role = %role, "Unknown role in environment"),
            }
        }

        if let Some(threshold) = lookup("STOCKDESK_LOW_STOCK_THRESHOLD") {
            match threshold.parse::<i64>() {
                Ok(t) => self.stock.low_stock_threshold = t,
                Err(_) => warn!(value = %threshold, "Ignoring invalid STOCKDESK_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(ttl) = lookup("STOCKDESK_CACHE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(t) => self.cache.ttl_secs = t,
                Err(_) => warn!(value = %ttl, "Ignoring invalid STOCKDESK_CACHE_TTL_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockdesk", "stockdesk")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The API base URL with a trailing slash, so relative joins append.
    pub fn base_url(&self) -> ClientResult<Url> {
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

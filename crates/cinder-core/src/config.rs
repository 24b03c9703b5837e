//! Configuration management for cinder.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/cinder/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// Browser surface settings
    pub browser: BrowserConfig,
    /// DOM automation timing
    pub automation: AutomationConfig,
    /// Rate-limit backoff settings
    pub rate_limit: RateLimitConfig,
    /// Retry budgets for network and DOM steps
    pub retry: RetryConfig,
    /// Persistence settings
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CINDER_HEADLESS`: Override browser headless mode (true/false)
    /// - `CINDER_RATE_LIMIT_FLOOR_SECS`: Override the minimum rate-limit wait
    /// - `CINDER_DATABASE_PATH`: Override the database file location
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides on top of the current values.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("CINDER_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("CINDER_RATE_LIMIT_FLOOR_SECS") {
            if let Ok(secs) = val.parse() {
                self.rate_limit.floor_wait_secs = secs;
                tracing::debug!("Override rate_limit.floor_wait_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("CINDER_DATABASE_PATH") {
            if !val.is_empty() {
                tracing::debug!("Override database.path from env: {}", val);
                self.database.path = Some(PathBuf::from(val));
            }
        }
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &std::path::Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Check the values that would make the runtime misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.retry.network_delete_max_tries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.network_delete_max_tries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retry.dom_step_max_tries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.dom_step_max_tries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.automation.selector_poll_interval_ms == 0
            || self.automation.pause_poll_interval_ms == 0
            || self.automation.url_poll_interval_ms == 0
        {
            return Err(ConfigError::InvalidValue {
                field: "automation".to_string(),
                reason: "poll intervals must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/cinder/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "cinder", "cinder").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses `general.data_dir` when set, otherwise `~/.local/share/cinder`.
    pub fn data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.general.data_dir {
            return Ok(dir.clone());
        }
        let dirs = ProjectDirs::from("com", "cinder", "cinder").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the database file path.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("cinder.db")),
        }
    }

    /// Project the timing knobs the runner needs.
    #[must_use]
    pub fn automation_settings(&self) -> AutomationSettings {
        AutomationSettings {
            wait_for_selector_timeout: Duration::from_millis(
                self.automation.wait_for_selector_timeout_ms,
            ),
            selector_poll_interval: Duration::from_millis(self.automation.selector_poll_interval_ms),
            pause_poll_interval: Duration::from_millis(self.automation.pause_poll_interval_ms),
            url_poll_interval: Duration::from_millis(self.automation.url_poll_interval_ms),
            wait_for_url_timeout: Duration::from_secs(self.automation.wait_for_url_timeout_secs),
            rate_limit_floor: Duration::from_secs(self.rate_limit.floor_wait_secs),
            network_delete_max_tries: self.retry.network_delete_max_tries,
            network_delete_retry_sleep: Duration::from_millis(
                self.retry.network_delete_retry_sleep_ms,
            ),
            dom_step_max_tries: self.retry.dom_step_max_tries,
            dom_step_retry_sleep: Duration::from_millis(self.retry.dom_step_retry_sleep_ms),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override for the data directory
    pub data_dir: Option<PathBuf>,
}

/// Browser surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            // Logging in needs a visible window
            headless: false,
            window_width: 1280,
            window_height: 900,
            navigation_timeout_secs: 30,
        }
    }
}

/// DOM automation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Default budget for `wait_for_selector`
    pub wait_for_selector_timeout_ms: u64,
    /// Interval between selector checks
    pub selector_poll_interval_ms: u64,
    /// Interval between pause flag checks
    pub pause_poll_interval_ms: u64,
    /// Interval between URL checks in `wait_for_url`
    pub url_poll_interval_ms: u64,
    /// Budget for waiting on a URL (the user logging in)
    pub wait_for_url_timeout_secs: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            wait_for_selector_timeout_ms: 5000,
            selector_poll_interval_ms: 500,
            pause_poll_interval_ms: 500,
            url_poll_interval_ms: 500,
            wait_for_url_timeout_secs: 600,
        }
    }
}

/// Rate-limit backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum wait once rate limited, even if the reset is sooner
    pub floor_wait_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            floor_wait_secs: 60,
        }
    }
}

/// Retry budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total tries for a network delete call that keeps failing
    pub network_delete_max_tries: u32,
    /// Sleep between failed network delete tries
    pub network_delete_retry_sleep_ms: u64,
    /// Total tries for a DOM step when not rate limited
    pub dom_step_max_tries: u32,
    /// Sleep between failed DOM step tries
    pub dom_step_retry_sleep_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            network_delete_max_tries: 3,
            network_delete_retry_sleep_ms: 1000,
            dom_step_max_tries: 3,
            dom_step_retry_sleep_ms: 1000,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Override for the database file
    pub path: Option<PathBuf>,
}

/// Runtime timing knobs, decoupled from the file format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationSettings {
    /// Default budget for `wait_for_selector`
    pub wait_for_selector_timeout: Duration,
    /// Interval between selector checks
    pub selector_poll_interval: Duration,
    /// Interval between pause flag checks
    pub pause_poll_interval: Duration,
    /// Interval between URL checks
    pub url_poll_interval: Duration,
    /// Budget for `wait_for_url`
    pub wait_for_url_timeout: Duration,
    /// Minimum rate-limit wait
    pub rate_limit_floor: Duration,
    /// Total tries for a failing network delete
    pub network_delete_max_tries: u32,
    /// Sleep between failing network delete tries
    pub network_delete_retry_sleep: Duration,
    /// Total tries for a failing DOM step
    pub dom_step_max_tries: u32,
    /// Sleep between failing DOM step tries
    pub dom_step_retry_sleep: Duration,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        AppConfig::default().automation_settings()
    }
}

//! Configuration management for the client core.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default Supabase URL (can be overridden at compile time via DAYBOOK_SUPABASE_URL env var).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("DAYBOOK_SUPABASE_URL") {
    Some(url) => url,
    None => "https://project.supabase.co",
};

/// Default Supabase publishable key (can be overridden at compile time via
/// DAYBOOK_SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str =
    match option_env!("DAYBOOK_SUPABASE_PUBLISHABLE_KEY") {
        Some(key) => key,
        None => "publishable-key-placeholder",
    };

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment environment the client reports itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Development
    }
}

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    /// Application display name.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Application version string.
    #[serde(default = "default_app_version")]
    pub app_version: String,
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
    /// Extra diagnostic output in development builds.
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

fn default_app_name() -> String {
    "Daybook".to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            supabase_url: DEFAULT_SUPABASE_URL.to_string(),
            supabase_publishable_key: DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string(),
            app_name: default_app_name(),
            app_version: default_app_version(),
            environment: Environment::Development,
            debug_mode: false,
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from a file, falling back to defaults.
    ///
    /// `supabase_url` and `supabase_publishable_key` are compile-time only
    /// and always use the built-in defaults, regardless of the config file.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        // Force compile-time values (never from config file)
        config.supabase_url = DEFAULT_SUPABASE_URL.to_string();
        config.supabase_publishable_key = DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string();

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let config_path = paths.config_file();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Override configuration from environment variables. Only the log
    /// level and debug flag can be changed at runtime; the backend
    /// coordinates are compile-time.
    fn load_from_env(&mut self) {
        if let Ok(log_level) = std::env::var("DAYBOOK_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(debug) = std::env::var("DAYBOOK_DEBUG_MODE") {
            self.debug_mode = debug == "true" || debug == "1";
        }
    }

    /// Validate the backend coordinates.
    pub fn validate(&self) -> CoreResult<()> {
        let mut errors = Vec::new();

        if self.supabase_url.is_empty() {
            errors.push("supabase_url is required".to_string());
        } else if Url::parse(&self.supabase_url).is_err() {
            errors.push("supabase_url must be a valid URL".to_string());
        }

        if self.supabase_publishable_key.is_empty() {
            errors.push("supabase_publishable_key is required".to_string());
        } else if self.supabase_publishable_key.len() < 20 {
            errors.push("supabase_publishable_key appears to be invalid".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Config(errors.join("; ")))
        }
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

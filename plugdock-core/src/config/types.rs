//! Configuration type definitions
//!
//! These types represent the runtime configuration for Plugdock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Root configuration for Plugdock
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlugdockConfig {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Remote plugin directory
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Package installer settings
    #[serde(default)]
    pub install: InstallConfig,

    /// Sites whose plugins can be managed
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    /// Global logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlugdockConfig {
    /// Look up a site by id
    pub fn site(&self, id: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.id == id)
    }

    /// Check the configuration for values that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.api.listen.trim().is_empty() {
            return Err(Error::Config("api.listen must not be empty".to_string()));
        }

        if self.sites.is_empty() {
            return Err(Error::Config("at least one [[sites]] entry is required".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for site in &self.sites {
            if site.id.trim().is_empty() {
                return Err(Error::Config("site id must not be empty".to_string()));
            }
            if !seen.insert(site.id.as_str()) {
                return Err(Error::Config(format!("duplicate site id: {}", site.id)));
            }
        }

        if self.directory.timeout_secs == 0 || self.install.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }

        Ok(())
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listen address
    #[serde(default = "default_api_listen")]
    pub listen: String,

    /// API key required as a bearer token (None = no authentication)
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen: default_api_listen(),
            api_key: None,
        }
    }
}

fn default_api_listen() -> String {
    "127.0.0.1:2019".to_string()
}

/// Remote plugin directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the plugin information API
    #[serde(default = "default_directory_url")]
    pub base_url: String,

    /// Lookup timeout in seconds
    #[serde(default = "default_directory_timeout")]
    pub timeout_secs: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_directory_url(),
            timeout_secs: default_directory_timeout(),
        }
    }
}

fn default_directory_url() -> String {
    "https://api.wordpress.org/plugins/info/1.2/".to_string()
}

fn default_directory_timeout() -> u64 {
    15
}

/// Package installer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Timeout for a single package install, in seconds
    #[serde(default = "default_install_timeout")]
    pub timeout_secs: u64,

    /// Translations applied to installer diagnostics shown to people.
    /// Keys are the untranslated source phrases.
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_install_timeout(),
            translations: HashMap::new(),
        }
    }
}

fn default_install_timeout() -> u64 {
    120
}

/// A managed site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site identifier used in API paths
    pub id: String,

    /// Directory holding the site's installed plugins
    pub plugins_dir: PathBuf,
}

/// Global logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

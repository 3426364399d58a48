//! Service configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables, so a bare `ntc serve` with `NOTION_API_KEY` set is
//! enough to run against the public API.
//!
//! ```toml
//! [notion]
//! api_key = "secret_..."
//! version = "2022-06-28"
//! api_url = "https://api.notion.com/v1"
//! timeout_secs = 30
//!
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [catalog]
//! title_property = "Test Case Name"
//! status_property = "Status"
//! date_property = "Test Date"
//! # query = "External tasks"
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `NOTION_API_KEY` | `notion.api_key` |
//! | `NOTION_VERSION` | `notion.version` |
//! | `NOTION_API_URL` | `notion.api_url` |
//! | `PORT` | `server.bind` (as `0.0.0.0:<PORT>`) |
//! | `NTC_BIND` | `server.bind` (full address, wins over `PORT`) |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Connection settings for the upstream document API.
#[derive(Deserialize, Clone)]
pub struct NotionConfig {
    /// Integration secret sent as a bearer credential.
    #[serde(default)]
    pub api_key: String,
    /// Value of the `Notion-Version` protocol header.
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL every request path is appended to.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            version: default_version(),
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("NotionConfig")
            .field("api_key", &key)
            .field("version", &self.version)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_version() -> String {
    "2022-06-28".to_string()
}
fn default_api_url() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Which page properties identify and describe a test case.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_title_property")]
    pub title_property: String,
    #[serde(default = "default_status_property")]
    pub status_property: String,
    #[serde(default = "default_date_property")]
    pub date_property: String,
    /// Optional free-text query added to the search request.
    #[serde(default)]
    pub query: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            title_property: default_title_property(),
            status_property: default_status_property(),
            date_property: default_date_property(),
            query: None,
        }
    }
}

fn default_title_property() -> String {
    "Test Case Name".to_string()
}
fn default_status_property() -> String {
    "Status".to_string()
}
fn default_date_property() -> String {
    "Test Date".to_string()
}

/// Load configuration from an optional TOML file plus the process environment.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("NOTION_API_KEY") {
        config.notion.api_key = v;
    }
    if let Some(v) = get("NOTION_VERSION") {
        config.notion.version = v;
    }
    if let Some(v) = get("NOTION_API_URL") {
        config.notion.api_url = v;
    }
    if let Some(port) = get("PORT") {
        config.server.bind = format!("0.0.0.0:{}", port);
    }
    if let Some(bind) = get("NTC_BIND") {
        config.server.bind = bind;
    }
}

fn validate(config: &Config) -> Result<()> {
    let url = config.notion.api_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!(
            "notion.api_url must be an http(s) URL, got '{}'",
            config.notion.api_url
        );
    }

    if config.notion.version.trim().is_empty() {
        bail!("notion.version must not be empty");
    }

    if config.notion.timeout_secs == 0 {
        bail!("notion.timeout_secs must be > 0");
    }

    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    for (name, value) in [
        ("catalog.title_property", &config.catalog.title_property),
        ("catalog.status_property", &config.catalog.status_property),
        ("catalog.date_property", &config.catalog.date_property),
    ] {
        if value.trim().is_empty() {
            bail!("{} must not be empty", name);
        }
    }

    Ok(())
}

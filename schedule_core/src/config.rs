//! Configuration file support for groupsched.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/groupsched/config.toml`.

use crate::{Error, Result};
use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder substituted with the group number in `SourceConfig::url_template`
pub const GROUP_PLACEHOLDER: &str = "{group}";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub semester: SemesterConfig,

    #[serde(default)]
    pub source: SourceConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    /// Path of the local records document
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join("records.json")
    }
}

/// Academic term configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SemesterConfig {
    /// First day of semester week 1
    #[serde(default = "default_semester_start")]
    pub start: NaiveDate,
}

impl Default for SemesterConfig {
    fn default() -> Self {
        Self {
            start: default_semester_start(),
        }
    }
}

/// External timetable API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_url_template")]
    pub url_template: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SourceConfig {
    /// Build the request URL for a group
    ///
    /// The group lands in the query values holding the placeholder and is
    /// form-encoded there, so it can never add parameters of its own.
    pub fn url_for(&self, group_number: &str) -> Result<Url> {
        let mut url = self.template_url()?;
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.replace(GROUP_PLACEHOLDER, group_number)))
            .collect();
        url.query_pairs_mut().clear().extend_pairs(&pairs);
        Ok(url)
    }

    fn template_url(&self) -> Result<Url> {
        Url::parse(&self.url_template).map_err(|e| {
            Error::Config(format!("source.url_template is not a valid URL: {}", e))
        })
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME")
            .expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("groupsched")
}

fn default_semester_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 9).expect("valid calendar date")
}

fn default_url_template() -> String {
    "https://iis.bsuir.by/api/v1/schedule?studentGroup={group}".into()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings that would make every fetch fail
    pub fn validate(&self) -> Result<()> {
        let template = self.source.template_url()?;
        if !template.query_pairs().any(|(_, v)| v.contains(GROUP_PLACEHOLDER)) {
            return Err(Error::Config(format!(
                "source.url_template must carry {} in a query value",
                GROUP_PLACEHOLDER
            )));
        }
        if self.source.timeout_secs == 0 {
            return Err(Error::Config("source.timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME")
                .expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("groupsched").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

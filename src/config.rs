//! Configuration types for covid-cases

use crate::error::{Error, Result};
use crate::types::CaseType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote repository location and transport settings
///
/// Groups settings that describe where the three time series live and how long a
/// single retrieval may take. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the GitHub REST API (default: "https://api.github.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Repository owner (default: "CSSEGISandData")
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name (default: "COVID-19")
    #[serde(default = "default_repository")]
    pub repository: String,

    /// Directory inside the repository holding the time series files
    #[serde(default = "default_subpath")]
    pub subpath: String,

    /// Per-dataset fetch timeout, measured from the start of each fetch (default: 10s)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional personal access token (raises the anonymous rate limit)
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner: default_owner(),
            repository: default_repository(),
            subpath: default_subpath(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            token: None,
        }
    }
}

impl RemoteConfig {
    /// Repository path of a dataset file (`<subpath>/<file name>`)
    pub fn dataset_path(&self, case: CaseType) -> String {
        let subpath = self.subpath.trim_matches('/');
        if subpath.is_empty() {
            case.file_name().to_string()
        } else {
            format!("{}/{}", subpath, case.file_name())
        }
    }
}

/// Local working directory settings (raw payload persistence and response cache)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working directory (default: "$HOME/covid", "./covid" when no home directory exists)
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Write each retrieved raw CSV into the working directory (default: true)
    #[serde(default = "default_true")]
    pub persist_raw: bool,

    /// Cache HTTP responses under `<work_dir>/cache` (default: true)
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            persist_raw: true,
            cache_enabled: true,
        }
    }
}

impl StorageConfig {
    /// Directory holding cached HTTP responses
    pub fn cache_dir(&self) -> PathBuf {
        self.work_dir.join("cache")
    }

    /// Where the raw CSV of a dataset is persisted
    pub fn dataset_path(&self, case: CaseType) -> PathBuf {
        self.work_dir.join(case.file_name())
    }
}

/// Presentation settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Number of countries in a ranking (default: 10)
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Colorize output (default: true)
    #[serde(default = "default_true")]
    pub color: bool,

    /// Trend plot width in columns (default: 70)
    #[serde(default = "default_graph_width")]
    pub graph_width: usize,

    /// Trend plot height in rows (default: 20)
    #[serde(default = "default_graph_height")]
    pub graph_height: usize,

    /// Thousands separator used when printing counts (default: ',')
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: char,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            color: true,
            graph_width: default_graph_width(),
            graph_height: default_graph_height(),
            thousands_separator: default_thousands_separator(),
        }
    }
}

/// Main configuration
///
/// Fields are organized into logical sub-configs:
/// - [`remote`](RemoteConfig): repository location, timeout, credentials
/// - [`storage`](StorageConfig): working directory, persistence, caching
/// - [`report`](ReportConfig): ranking size and output styling
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Repository location and transport settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Working directory settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Presentation settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.remote.timeout.is_zero() {
            return Err(Error::config("remote.timeout", "timeout must be greater than zero"));
        }
        if self.remote.owner.trim().is_empty() {
            return Err(Error::config("remote.owner", "owner must not be empty"));
        }
        if self.remote.repository.trim().is_empty() {
            return Err(Error::config("remote.repository", "repository must not be empty"));
        }
        if url::Url::parse(&self.remote.api_url).is_err() {
            return Err(Error::config(
                "remote.api_url",
                format!("'{}' is not a valid URL", self.remote.api_url),
            ));
        }
        if self.report.top_n == 0 {
            return Err(Error::config("report.top_n", "ranking size must be at least 1"));
        }
        if self.report.graph_width < 2 || self.report.graph_height < 2 {
            return Err(Error::config(
                "report.graph_width",
                "graph must be at least 2x2 characters",
            ));
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_owner() -> String {
    "CSSEGISandData".to_string()
}

fn default_repository() -> String {
    "COVID-19".to_string()
}

fn default_subpath() -> String {
    "csse_covid_19_data/csse_covid_19_time_series".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("covid-cases/{}", env!("CARGO_PKG_VERSION"))
}

fn default_work_dir() -> PathBuf {
    match home::home_dir() {
        Some(home) => home.join("covid"),
        None => PathBuf::from("covid"),
    }
}

fn default_true() -> bool {
    true
}

fn default_top_n() -> usize {
    10
}

fn default_graph_width() -> usize {
    70
}

fn default_graph_height() -> usize {
    20
}

fn default_thousands_separator() -> char {
    ','
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

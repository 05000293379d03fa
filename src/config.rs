//! Configuration types for paged-fetch

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::error::{Error, Result};

/// Fetch behavior (concurrency and probe handling)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum fetches in flight during the fan-out phase
    /// (default: available parallelism of the host)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Restart the fan-out phase at page 1, refetching the probe page (default: false)
    ///
    /// When disabled the fan-out covers pages 2..=N only, so page 1 is
    /// requested exactly once per run.
    #[serde(default)]
    pub refetch_probe_page: bool,

    /// JSON field in the probe page holding the total page count (default: "totalPages")
    #[serde(default = "default_total_pages_field")]
    pub total_pages_field: String,

    /// Capacity of the event broadcast channel (default: 1000)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            refetch_probe_page: false,
            total_pages_field: default_total_pages_field(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// HTTP client and remote host settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL for public store listings (default: "https://www.gog.com")
    #[serde(default = "default_store_host")]
    pub store_host: String,

    /// Base URL for account-scoped listings (default: "https://embed.gog.com")
    #[serde(default = "default_embed_host")]
    pub embed_host: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            store_host: default_store_host(),
            embed_host: default_embed_host(),
        }
    }
}

/// Local page store settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory; each resource/media pair gets a subdirectory (default: "./pages")
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
        }
    }
}

/// Main configuration for [`Paginator`](crate::Paginator)
///
/// Sub-configs are flattened, so the serialized form has no nesting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Fetch behavior
    #[serde(flatten)]
    pub fetch: FetchConfig,

    /// HTTP settings
    #[serde(flatten)]
    pub http: HttpConfig,

    /// Page store settings
    #[serde(flatten)]
    pub storage: StorageConfig,
}

impl Config {
    /// Parse a configuration from JSON, filling in defaults and validating it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is usable before a run starts
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1", "concurrency"));
        }
        if self.fetch.event_buffer == 0 {
            return Err(Error::config("event_buffer must be at least 1", "event_buffer"));
        }
        if self.fetch.total_pages_field.trim().is_empty() {
            return Err(Error::config(
                "total_pages_field must not be empty",
                "total_pages_field",
            ));
        }
        for (key, host) in [
            ("store_host", &self.http.store_host),
            ("embed_host", &self.http.embed_host),
        ] {
            if let Err(e) = url::Url::parse(host) {
                return Err(Error::config(format!("invalid URL {host:?}: {e}"), key));
            }
        }
        Ok(())
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_total_pages_field() -> String {
    "totalPages".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("paged-fetch/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_store_host() -> String {
    "https://www.gog.com".to_string()
}

fn default_embed_host() -> String {
    "https://embed.gog.com".to_string()
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./pages")
}

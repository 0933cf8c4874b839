use crate::humanize::ByteSize;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: ByteSize,
    /// Upper bound accepted for `count` on job submission
    #[serde(default = "default_max_count")]
    pub max_count: usize,
    /// Count used when a submission omits it
    #[serde(default = "default_count")]
    pub default_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_payload_bytes: default_max_payload_bytes(),
            max_count: default_max_count(),
            default_count: default_count(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_max_payload_bytes() -> ByteSize {
    ByteSize::kib(64)
}

fn default_max_count() -> usize {
    50
}

fn default_count() -> usize {
    20
}

/// Safe-search level sent to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl SafeSearch {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeSearch::Off => "off",
            SafeSearch::Moderate => "moderate",
            SafeSearch::Strict => "strict",
        }
    }
}

/// Image-search provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub safesearch: SafeSearch,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_search_lang")]
    pub search_lang: String,
    #[serde(default = "default_true")]
    pub spellcheck: bool,
    /// Provider cap on results per request
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    /// Subscription token (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            safesearch: SafeSearch::default(),
            country: default_country(),
            search_lang: default_search_lang(),
            spellcheck: true,
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_endpoint() -> String {
    "https://api.search.brave.com/res/v1/images/search".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_search_lang() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    20
}

fn default_search_timeout_secs() -> u64 {
    15
}

/// Image download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Pause between successive image downloads within one job
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: ByteSize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
            politeness_delay_ms: default_politeness_delay_ms(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_politeness_delay_ms() -> u64 {
    500
}

fn default_max_image_bytes() -> ByteSize {
    ByteSize::mib(25)
}

/// Filesystem sink configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("downloads")
}

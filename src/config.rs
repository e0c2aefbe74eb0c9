//! Configuration management using the prefer crate for discovery.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError};
use crate::cache::{ReportCache, DEFAULT_CAPACITY};
use crate::proxy::{DevProxy, ProxyConfig, ProxyError};
use crate::smoke::SmokeTestConfig;

/// Default file the report cache is stored in.
pub const DEFAULT_CACHE_FILENAME: &str = "forensicReports.json";

/// Default analysis backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Report cache filename (relative to data_dir).
    pub cache_filename: String,
    /// Maximum number of cached report pointers.
    pub cache_capacity: usize,
    /// Base URL of the analysis backend.
    pub api_url: String,
    /// User agent for backend requests.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Rewrite backend image URLs to origin-relative paths (served via the proxy).
    pub rewrite_image_urls: bool,
    pub proxy: ProxyConfig,
    pub smoke_test: SmokeTestConfig,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("forensics-viewer");

        Self {
            data_dir,
            cache_filename: DEFAULT_CACHE_FILENAME.to_string(),
            cache_capacity: DEFAULT_CAPACITY,
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("forensics-viewer/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 30,
            rewrite_image_urls: true,
            proxy: ProxyConfig::default(),
            smoke_test: SmokeTestConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Full path to the report cache file.
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_filename)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Origin whose image URLs the dashboard makes relative.
    ///
    /// Relative URLs only resolve when the dev proxy is mounted next to the
    /// dashboard, so this is `None` otherwise. The origin is the proxy's
    /// target, not `api_url`.
    pub fn image_origin(&self, proxy_mounted: bool) -> Option<&str> {
        (proxy_mounted && self.rewrite_image_urls).then_some(self.proxy.target.as_str())
    }

    pub fn create_api_client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::new(&self.api_url, self.timeout(), &self.user_agent)
    }

    pub fn open_cache(&self) -> ReportCache {
        ReportCache::open(self.cache_path(), self.cache_capacity)
    }

    pub fn create_proxy(&self) -> Result<DevProxy, ProxyError> {
        DevProxy::new(&self.proxy, self.timeout())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Report cache filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_file: Option<String>,
    /// Maximum number of cached report pointers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_capacity: Option<usize>,
    /// Analysis backend base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_image_urls: Option<bool>,
    /// Dev proxy routes and target.
    #[serde(default, skip_serializing_if = "ProxyConfig::is_default")]
    pub proxy: ProxyConfig,
    /// Document store used by `smoke-test`.
    #[serde(default, skip_serializing_if = "SmokeTestConfig::is_default")]
    pub smoke_test: SmokeTestConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    pub async fn load() -> Self {
        match prefer::load("forensics").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                // No config file found
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, used to resolve relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref cache_file) = self.cache_file {
            settings.cache_filename = cache_file.clone();
        }
        if let Some(capacity) = self.cache_capacity {
            settings.cache_capacity = capacity;
        }
        if let Some(ref api_url) = self.api_url {
            settings.api_url = api_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(rewrite) = self.rewrite_image_urls {
            settings.rewrite_image_urls = rewrite;
        }
        settings.proxy = self.proxy.clone();
        settings.smoke_test = self.smoke_test.clone();
    }
}

/// Options for loading settings.
#[derive(Debug, Default)]
pub struct LoadOptions {
    /// Explicit config file path (--config flag).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths from CWD instead of config file location.
    pub use_cwd: bool,
    /// Backend URL override (--api-url flag).
    pub api_url: Option<String>,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    // Priority 1: explicit --config flag, Priority 2: auto-discovery
    let config = match options.config_path {
        Some(ref path) => match Config::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}", e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = env_override("FORENSICS_DATA_DIR") {
        tracing::debug!("Using FORENSICS_DATA_DIR from environment: {}", data_dir);
        settings.data_dir = config.resolve_path(&data_dir, &base_dir);
    }

    if let Some(api_url) = env_override("FORENSICS_API_URL") {
        tracing::debug!("Using FORENSICS_API_URL from environment: {}", api_url);
        settings.api_url = api_url;
    }

    if let Some(uri) = env_override("MONGODB_URI") {
        tracing::debug!("Using MONGODB_URI from environment");
        settings.smoke_test.uri = uri;
    }

    // --api-url takes precedence over everything
    if let Some(api_url) = options.api_url {
        settings.api_url = api_url;
    }

    (settings, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forensics.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "state"
api_url = "http://backend:9090"
cache_capacity = 20

[proxy]
target = "http://backend:9090"
change_origin = false

[[proxy.routes]]
prefix = "/mmapi"

[smoke_test]
database = "scratch"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("state"));
        assert_eq!(settings.cache_path(), dir.path().join("state").join(DEFAULT_CACHE_FILENAME));
        assert_eq!(settings.api_url, "http://backend:9090");
        assert_eq!(settings.cache_capacity, 20);
        assert!(!settings.proxy.change_origin);
        assert_eq!(settings.proxy.routes.len(), 1);
        assert!(settings.proxy.enabled);
        assert_eq!(settings.smoke_test.database, "scratch");
        assert_eq!(settings.smoke_test.collection, "forensic_reports");
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("forensics.yaml");
        std::fs::write(&yaml, "request_timeout: 5\nrewrite_image_urls: false\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.request_timeout, Some(5));
        assert_eq!(config.rewrite_image_urls, Some(false));
        assert!(config.proxy.is_default());

        let json = dir.path().join("forensics.json");
        std::fs::write(&json, r#"{"cache_file": "reports.json"}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.cache_file.as_deref(), Some("reports.json"));
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "api_url = [").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
        assert!(Config::load_from_path(&dir.path().join("missing.toml"))
            .await
            .is_err());
    }

    #[test]
    fn test_image_origin_follows_mounted_proxy() {
        let mut settings = Settings::default();
        settings.api_url = "http://api.example:9000".to_string();
        settings.proxy.target = "http://backend:8081".to_string();

        assert_eq!(settings.image_origin(true), Some("http://backend:8081"));
        assert_eq!(settings.image_origin(false), None);

        settings.rewrite_image_urls = false;
        assert_eq!(settings.image_origin(true), None);
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/etc/forensics");
        assert_eq!(config.resolve_path("/abs", base), PathBuf::from("/abs"));
        assert_eq!(config.resolve_path("rel", base), base.join("rel"));
    }
}

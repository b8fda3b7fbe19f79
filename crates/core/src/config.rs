//! Runtime configuration.
//!
//! Values come from built-in defaults, then environment variables, then
//! whatever the caller overrides through the `with_*` builders.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_PORT: u16 = 11434;
pub const DEFAULT_MODEL: &str = "deepseek-r1";
pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com";

const ENV_OLLAMA_URL: &str = "YTLDR_OLLAMA_URL";
const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
const ENV_MODEL: &str = "YTLDR_MODEL";
const ENV_WATCH_URL: &str = "YTLDR_WATCH_URL";
const ENV_CACHE_FILE: &str = "YTLDR_CACHE_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    ollama_base_url: String,
    default_model: String,
    watch_base_url: String,
    cache_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            watch_base_url: DEFAULT_WATCH_URL.to_string(),
            cache_path: default_cache_path(),
        }
    }
}

/// `<cache dir>/ytldr/summaries.json`, falling back to `/tmp` when the
/// platform has no cache directory.
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("ytldr")
        .join("summaries.json")
}

/// `OLLAMA_HOST` is usually a bare `host[:port]`; the scheme and port
/// default to `http` and 11434.
fn ollama_host_url(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        return host.to_string();
    }

    let authority = host.split('/').next().unwrap_or_default();
    let has_port = match authority.strip_prefix('[') {
        Some(ipv6) => ipv6.contains("]:"),
        None => authority.contains(':'),
    };
    if has_port {
        format!("http://{host}")
    } else {
        let rest = &host[authority.len()..];
        format!("http://{authority}:{DEFAULT_OLLAMA_PORT}{rest}")
    }
}

pub(crate) fn strip_trailing_slash(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `YTLDR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            config = config.with_ollama_base_url(url);
        } else if let Some(host) = lookup(ENV_OLLAMA_HOST) {
            config = config.with_ollama_base_url(ollama_host_url(&host));
        }
        if let Some(model) = lookup(ENV_MODEL) {
            config = config.with_default_model(model);
        }
        if let Some(url) = lookup(ENV_WATCH_URL) {
            config = config.with_watch_base_url(url);
        }
        if let Some(path) = lookup(ENV_CACHE_FILE) {
            config = config.with_cache_path(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama_base_url.is_empty() {
            return Err(ConfigError::Empty {
                field: "ollama_base_url",
            });
        }
        if self.default_model.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "default_model",
            });
        }
        if self.watch_base_url.is_empty() {
            return Err(ConfigError::Empty {
                field: "watch_base_url",
            });
        }
        Ok(())
    }

    pub fn ollama_base_url(&self) -> &str {
        &self.ollama_base_url
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn watch_base_url(&self) -> &str {
        &self.watch_base_url
    }

    pub fn cache_path(&self) -> &PathBuf {
        &self.cache_path
    }

    pub fn with_ollama_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.ollama_base_url = strip_trailing_slash(url.as_ref());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_watch_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.watch_base_url = strip_trailing_slash(url.as_ref());
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }
}

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::provider::ollama::DEFAULT_OLLAMA_URL;
use crate::provider::openai::{DEFAULT_BASE_URL as DEFAULT_OPENAI_URL, DEFAULT_MODEL as DEFAULT_OPENAI_MODEL};

/// Application-level constants
pub const APP_NAME: &str = "HealthSpeak";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DICTIONARY_FILE: &str = "terminology.json";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "healthspeak=debug,healthspeak_lib=debug,tower_http=info"
    } else {
        "healthspeak=info,healthspeak_lib=info,tower_http=warn"
    }
}

/// Get the application data directory
/// ~/HealthSpeak/ on all platforms. `None` when no home directory exists.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which AI provider the service talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    OpenAi {
        base_url: String,
        api_key: String,
        model: String,
    },
    /// `model: None` means pick the best installed model at startup.
    Ollama { url: String, model: Option<String> },
    None,
}

impl ProviderConfig {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Ollama { .. } => "ollama",
            Self::None => "none",
        }
    }
}

/// Service configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub provider: ProviderConfig,
    pub provider_timeout: Duration,
    /// Extra terminology merged over the built-in dictionary.
    pub dictionary_path: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host_raw = get("HEALTHSPEAK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host_raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: "HEALTHSPEAK_HOST",
            value: host_raw.clone(),
            reason: "expected an IP address",
        })?;

        let port = match get("HEALTHSPEAK_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                var: "HEALTHSPEAK_PORT",
                value: raw,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("AI_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "AI_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        let provider = match get("AI_PROVIDER").map(|p| p.to_lowercase()).as_deref() {
            None | Some("openai") => match get("OPENAI_API_KEY") {
                Some(api_key) => ProviderConfig::OpenAi {
                    base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                    api_key,
                    model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                },
                None => ProviderConfig::None,
            },
            Some("ollama") => ProviderConfig::Ollama {
                url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                model: get("OLLAMA_MODEL"),
            },
            Some("none") => ProviderConfig::None,
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    var: "AI_PROVIDER",
                    value: get("AI_PROVIDER").unwrap_or_default(),
                    reason: "expected openai, ollama or none",
                })
            }
        };

        let dictionary_path = get("HEALTHSPEAK_DICTIONARY")
            .map(PathBuf::from)
            .or_else(default_dictionary_path);

        Ok(Self {
            addr: SocketAddr::new(host, port),
            provider,
            provider_timeout: Duration::from_secs(timeout_secs),
            dictionary_path,
        })
    }
}

/// ~/HealthSpeak/terminology.json, if the file exists.
fn default_dictionary_path() -> Option<PathBuf> {
    app_data_dir()
        .map(|dir| dir.join(DICTIONARY_FILE))
        .filter(|path| path.is_file())
}

//! Service configuration.
//!
//! Two layers, loaded at startup:
//!
//! - [`AppConfig`]: the YAML config file (`--config`) with server address,
//!   security material, and artifact/report directories. CLI flags override
//!   individual fields.
//! - [`RuntimeConfig`]: environment tunables for the coroutine runtime.
//!   `SCORECAST_STACK_SIZE` accepts decimal (`16384`) or hex (`0x4000`)
//!   bytes; default is 16 KB per handler coroutine.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Directory of the served form page and assets. `None` disables static serving.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    /// Named API keys, validated against a request header.
    #[serde(default)]
    pub api_keys: HashMap<String, ApiKeyEntry>,
    /// Login users: username → salted SHA-256 digest.
    #[serde(default)]
    pub users: HashMap<String, UserEntry>,
    /// Handler name → scheme names that may authorize it. Any satisfied
    /// scheme grants access; handlers absent from the map are open.
    #[serde(default)]
    pub protect: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
    pub key: String,
    #[serde(default = "default_api_key_header")]
    pub header_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    /// Hex salt, prepended to the password before hashing.
    pub salt: String,
    /// Hex SHA-256 of `salt + password`.
    pub digest: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
    /// Reload the serving pipeline when artifacts change on disk.
    #[serde(default)]
    pub watch: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("static_site"))
}

fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
            watch: false,
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: AppConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(cfg)
    }
}

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes (default: 16 KB / 0x4000).
    pub stack_size: usize,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("SCORECAST_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(0x4000)
                } else {
                    val.parse().unwrap_or(0x4000)
                }
            }
            Err(_) => 0x4000,
        };
        RuntimeConfig { stack_size }
    }
}

//! Configuration resolution shared by the chat sync core and its shells.
//!
//! Resolution order for every setting:
//! ```text
//! 1. environment variable    (CHAT_API_URL, CHAT_PUSH_URL, CHAT_SESSION_DIR)
//! 2. persistent config file  (<config_dir>/chat_sync/config.json)
//! 3. built-in default
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const API_URL_ENV: &str = "CHAT_API_URL";
pub const PUSH_URL_ENV: &str = "CHAT_PUSH_URL";
pub const SESSION_DIR_ENV: &str = "CHAT_SESSION_DIR";

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Settings that may be persisted between runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<PathBuf>,
}

/// Get the global configuration path
fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chat_sync").join("config.json"))
}

/// Load a config file, returning `None` when it is missing or unreadable.
pub fn load_config_from(path: &Path) -> Option<ChatConfig> {
    if !path.exists() {
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<ChatConfig>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse config file at {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read config file at {:?}: {}", path, e);
            None
        }
    }
}

/// Write a config file, creating its parent directory.
pub fn save_config_to(path: &Path, config: &ChatConfig) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load the persistent config from the user's config dir
pub fn load_persistent_config() -> Option<ChatConfig> {
    load_config_from(&get_config_path()?)
}

/// Save the persistent config into the user's config dir
pub fn save_persistent_config(config: &ChatConfig) -> anyhow::Result<()> {
    let path =
        get_config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config dir"))?;
    save_config_to(&path, config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Pick the API base URL from an explicit env value, a persisted config, or the default.
pub fn resolve_api_url(env: Option<String>, persisted: Option<&ChatConfig>) -> String {
    let url = env
        .or_else(|| persisted.and_then(|c| c.api_url.clone()))
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    url.trim_end_matches('/').to_string()
}

/// Pick the push channel URL; falls back to one derived from the API URL.
pub fn resolve_push_url(
    env: Option<String>,
    persisted: Option<&ChatConfig>,
    api_url: &str,
) -> String {
    env.or_else(|| persisted.and_then(|c| c.push_url.clone()))
        .unwrap_or_else(|| derive_push_url(api_url))
}

/// `http://host` becomes `ws://host/ws`, `https://host` becomes `wss://host/ws`.
pub fn derive_push_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws", ws)
}

/// API base URL for this process.
pub fn api_base_url() -> String {
    resolve_api_url(env_value(API_URL_ENV), load_persistent_config().as_ref())
}

/// Push channel URL for this process.
pub fn push_url() -> String {
    let persisted = load_persistent_config();
    let api = resolve_api_url(env_value(API_URL_ENV), persisted.as_ref());
    resolve_push_url(env_value(PUSH_URL_ENV), persisted.as_ref(), &api)
}

/// Directory holding the durable session file.
pub fn session_dir() -> PathBuf {
    if let Some(val) = env_value(SESSION_DIR_ENV) {
        return PathBuf::from(val);
    }

    if let Some(dir) = load_persistent_config().and_then(|c| c.session_dir) {
        return dir;
    }

    dirs::data_local_dir()
        .map(|d| d.join("chat_sync"))
        .unwrap_or_else(|| PathBuf::from("chat_data"))
}

/// Path of the durable session file.
pub fn session_file() -> PathBuf {
    session_dir().join("session.json")
}

/// Ensure a single directory exists
pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created directory: {:?}", path);
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Install a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

//! Runtime configuration and data path resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "agnt.toml";

/// Agent configuration.
///
/// Read from `agnt.toml` in the data directory; `AGNT_MODEL`, `AGNT_BASE_URL`
/// and `AGNT_API_KEY` (or `OPENAI_API_KEY`) override the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgntConfig {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// Request streamed responses from the provider.
    pub stream: bool,
    pub system_prompt: Option<String>,
    /// Maximum chained tool calls within one generation round.
    pub max_tool_rounds: usize,
    /// Pending generation requests before submissions are refused.
    pub queue_capacity: usize,
    pub request_timeout_secs: u64,
}

impl Default for AgntConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            max_tokens: 4096,
            stream: true,
            system_prompt: None,
            max_tool_rounds: 16,
            queue_capacity: 16,
            request_timeout_secs: 120,
        }
    }
}

impl AgntConfig {
    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(model) = non_empty("AGNT_MODEL") {
            self.model = model;
        }
        if let Some(base_url) = non_empty("AGNT_BASE_URL") {
            self.base_url = base_url;
        }
        if let Some(key) = non_empty("AGNT_API_KEY").or_else(|| non_empty("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
    }
}

/// Load configuration for a data directory.
///
/// A missing file yields defaults; an unreadable or malformed one is logged
/// and also falls back to defaults. Environment overrides apply last.
pub fn load_config(data_path: &Path) -> AgntConfig {
    let mut config = read_config_file(&data_path.join(CONFIG_FILE)).unwrap_or_default();
    config.apply_env(|name| std::env::var(name).ok());
    config
}

fn read_config_file(path: &Path) -> Option<AgntConfig> {
    if !path.exists() {
        return None;
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<AgntConfig>(&contents) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}. Using default.", path.display(), e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}. Using default.", path.display(), e);
            None
        }
    }
}

/// Resolve the data directory.
///
/// Priority: explicit path > `AGNT_DATA_PATH` env > `./.agnt` (if it exists) > `~/.agnt`.
pub fn resolve_data_path(explicit_path: Option<PathBuf>) -> PathBuf {
    explicit_path
        .or_else(|| std::env::var("AGNT_DATA_PATH").ok().map(PathBuf::from))
        .or_else(|| {
            let local_path = Path::new(".agnt");
            if local_path.is_dir() {
                Some(local_path.to_path_buf())
            } else {
                None
            }
        })
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".agnt"))
                .unwrap_or_else(|| PathBuf::from(".agnt"))
        })
}

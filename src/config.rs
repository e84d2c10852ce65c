use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::translate::gemini::DEFAULT_ENDPOINT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub translator_config: TranslatorConfig,
    #[serde(default)]
    pub plugin_config: PluginConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12393
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_target_language")]
    pub default_target_language: String,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_direct_translate_limit")]
    pub direct_translate_limit: usize,
    #[serde(default = "default_chunk_budget")]
    pub chunk_budget: usize,
    #[serde(default = "default_chunk_pause_ms")]
    pub chunk_pause_ms: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on a whole translate request, chunks and retries included.
    #[serde(default)]
    pub request_deadline_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub reject_same_language: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_target_language() -> String {
    "日本語".to_string()
}

fn default_max_input_chars() -> usize {
    10_000
}

fn default_direct_translate_limit() -> usize {
    3000
}

fn default_chunk_budget() -> usize {
    2500
}

fn default_chunk_pause_ms() -> u64 {
    1000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_target_language: default_target_language(),
            max_input_chars: default_max_input_chars(),
            direct_translate_limit: default_direct_translate_limit(),
            chunk_budget: default_chunk_budget(),
            chunk_pause_ms: default_chunk_pause_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            request_deadline_secs: None,
            reject_same_language: true,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    2000
}

fn default_backoff_multiplier() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Identity of this plugin in the settings store, and the values to seed it with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_plugin_id")]
    pub plugin_id: String,
    #[serde(default = "default_api_key_setting")]
    pub api_key_setting: String,
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

fn default_plugin_id() -> String {
    "ai-translator".to_string()
}

fn default_api_key_setting() -> String {
    "gemini_api_key".to_string()
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            plugin_id: default_plugin_id(),
            api_key_setting: default_api_key_setting(),
            settings: HashMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let content = substitute_env_vars(&content);

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".jsonld") || path_lower.ends_with(".json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Invalid YAML configuration")
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Invalid JSON configuration")
    }
}

/// Replace `${VAR_NAME}` with the environment value, or "" when unset.
pub fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").unwrap();
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

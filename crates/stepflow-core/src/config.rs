use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepflowError};

/// Top-level Stepflow configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Remote sandbox connection settings. Fixed for an engine's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// URL that receives `POST {code, context}` requests.
    #[serde(default = "default_sandbox_endpoint")]
    pub endpoint: String,
    /// Per-request timeout. A timeout is reported as a node failure.
    #[serde(default = "default_sandbox_timeout")]
    pub timeout_secs: u64,
    /// Sent as a bearer token when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_sandbox_endpoint() -> String { "http://localhost:8080/execute".to_string() }
fn default_sandbox_timeout() -> u64 { 30 }

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            endpoint: default_sandbox_endpoint(),
            timeout_secs: default_sandbox_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How many times one node may run within a single run.
    #[serde(default = "default_max_node_visits")]
    pub max_node_visits: usize,
}

fn default_max_node_visits() -> usize { 100 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_node_visits: default_max_node_visits(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "stepflow=info,warn".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| StepflowError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| StepflowError::Config(e.to_string()))
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}

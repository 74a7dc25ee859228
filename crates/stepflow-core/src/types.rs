use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StepflowError};

/// Unique identifier of one workflow run.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of a sandbox execution request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxRequest {
    pub code: String,
    /// Context snapshot at the moment the node starts.
    pub context: HashMap<String, serde_json::Value>,
    /// Runtime hint for the sandbox (e.g. `python`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    Success,
    Error,
}

/// Body of a sandbox response.
///
/// `output` is either a JSON object or a string holding a JSON-encoded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxResponse {
    pub status: SandboxStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SandboxResponse {
    pub fn success(output: serde_json::Value) -> Self {
        Self {
            status: SandboxStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SandboxStatus::Error,
            output: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SandboxStatus::Success
    }

    /// The error message, with a fallback when the sandbox omitted one.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "Sandbox reported an error without a message".to_string())
    }

    /// Decode `output` into the mapping that gets merged into the context.
    ///
    /// A missing or null output decodes to an empty mapping.
    pub fn decode_output(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match &self.output {
            None | Some(serde_json::Value::Null) => Ok(serde_json::Map::new()),
            Some(serde_json::Value::Object(map)) => Ok(map.clone()),
            Some(serde_json::Value::String(encoded)) => {
                match serde_json::from_str::<serde_json::Value>(encoded) {
                    Ok(serde_json::Value::Object(map)) => Ok(map),
                    Ok(other) => Err(StepflowError::SandboxParse(format!(
                        "output must decode to an object, got {}",
                        json_kind(&other)
                    ))),
                    Err(e) => Err(StepflowError::SandboxParse(format!(
                        "output is not valid JSON: {}",
                        e
                    ))),
                }
            }
            Some(other) => Err(StepflowError::SandboxParse(format!(
                "output must be an object, got {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

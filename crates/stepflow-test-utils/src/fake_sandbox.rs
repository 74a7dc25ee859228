use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;

use stepflow_core::error::{Result, StepflowError};
use stepflow_core::traits::SandboxClient;
use stepflow_core::types::{SandboxRequest, SandboxResponse};

#[derive(Debug, Clone)]
enum Reply {
    Respond(SandboxResponse),
    TransportFault(String),
}

/// Sandbox that answers from a script keyed by node code.
///
/// Code with no scripted reply succeeds with an empty output. Every request
/// is recorded for later inspection.
pub struct FakeSandbox {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<SandboxRequest>>,
}

impl FakeSandbox {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer `code` with an arbitrary response.
    pub fn respond(mut self, code: impl Into<String>, response: SandboxResponse) -> Self {
        self.replies.insert(code.into(), Reply::Respond(response));
        self
    }

    /// Answer `code` with `{"status": "success", "output": output}`.
    pub fn succeed(self, code: impl Into<String>, output: serde_json::Value) -> Self {
        self.respond(code, SandboxResponse::success(output))
    }

    /// Answer `code` with `{"status": "error", "error": message}`.
    pub fn fail(self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.respond(code, SandboxResponse::error(message))
    }

    /// Make `code` fail at the transport layer.
    pub fn transport_fault(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.replies
            .insert(code.into(), Reply::TransportFault(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<SandboxRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("request log poisoned").len()
    }
}

impl Default for FakeSandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxClient for FakeSandbox {
    fn execute(&self, request: SandboxRequest) -> BoxFuture<'_, Result<SandboxResponse>> {
        let reply = self.replies.get(&request.code).cloned();
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request);

        Box::pin(async move {
            match reply {
                Some(Reply::Respond(response)) => Ok(response),
                Some(Reply::TransportFault(message)) => Err(StepflowError::SandboxRequest(message)),
                None => Ok(SandboxResponse::success(serde_json::json!({}))),
            }
        })
    }
}

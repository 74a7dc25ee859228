use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{SandboxRequest, SandboxResponse};

/// Sandbox client — remote code execution for Action and Decision nodes.
///
/// `Ok` carries whatever the sandbox answered, including `status: "error"`.
/// `Err` means the transport failed (connection, non-2xx, timeout, bad JSON).
/// The engine treats both an error status and an `Err` as a node failure.
/// Implementations must not retry on their own.
pub trait SandboxClient: Send + Sync + 'static {
    fn execute(&self, request: SandboxRequest) -> BoxFuture<'_, Result<SandboxResponse>>;
}

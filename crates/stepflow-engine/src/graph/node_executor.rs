use std::time::Instant;

use serde_json::json;
use tracing::{debug, warn};

use stepflow_core::traits::SandboxClient;
use stepflow_core::types::SandboxRequest;

use super::context::ExecutionContext;
use super::edge::BRANCH_DECISION_KEY;
use super::node::{Node, NodeCode, NodeKind};

/// Outcome of running one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeExecution {
    /// Raw outcome recorded in the trace.
    pub output_result: serde_json::Value,
    pub code_executed: Option<String>,
    pub elapsed_ms: u64,
    /// Set when the node failed; the run stops here.
    pub failure: Option<String>,
}

impl NodeExecution {
    fn passthrough() -> Self {
        Self {
            output_result: serde_json::Value::Null,
            code_executed: None,
            elapsed_ms: 0,
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run `node` against `context`. The one dispatch point over node kinds.
///
/// Node failures are reported in the returned value, never as `Err`.
pub async fn execute_node(
    node: &Node,
    context: &mut ExecutionContext,
    sandbox: &dyn SandboxClient,
) -> NodeExecution {
    match &node.kind {
        NodeKind::Start => execute_start(node),
        NodeKind::End => execute_end(node),
        NodeKind::Action(code) => execute_action(node, code, context, sandbox).await,
        NodeKind::Decision(code) => execute_decision(node, code, context, sandbox).await,
    }
}

fn execute_start(node: &Node) -> NodeExecution {
    debug!(node_id = %node.id, "Start node");
    NodeExecution::passthrough()
}

fn execute_end(node: &Node) -> NodeExecution {
    debug!(node_id = %node.id, "End node");
    NodeExecution::passthrough()
}

async fn execute_action(
    node: &Node,
    code: &NodeCode,
    context: &mut ExecutionContext,
    sandbox: &dyn SandboxClient,
) -> NodeExecution {
    run_in_sandbox(node, code, context, sandbox).await
}

async fn execute_decision(
    node: &Node,
    code: &NodeCode,
    context: &mut ExecutionContext,
    sandbox: &dyn SandboxClient,
) -> NodeExecution {
    let execution = run_in_sandbox(node, code, context, sandbox).await;
    if execution.succeeded() && context.get(BRANCH_DECISION_KEY).is_none() {
        warn!(node_id = %node.id, "Decision node finished without setting branch_decision");
    }
    execution
}

async fn run_in_sandbox(
    node: &Node,
    code: &NodeCode,
    context: &mut ExecutionContext,
    sandbox: &dyn SandboxClient,
) -> NodeExecution {
    let request = SandboxRequest {
        code: code.code.clone(),
        context: context.snapshot(),
        executor: code.executor.clone(),
    };

    let started = Instant::now();
    let result = sandbox.execute(request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let (output_result, failure) = match result {
        Ok(resp) => {
            let raw = serde_json::to_value(&resp).unwrap_or_default();
            if !resp.is_success() {
                (raw, Some(resp.error_message()))
            } else {
                match resp.decode_output() {
                    Ok(output) => {
                        debug!(node_id = %node.id, keys = output.len(), "Merging node output");
                        context.merge(output);
                        (raw, None)
                    }
                    Err(e) => (raw, Some(e.to_string())),
                }
            }
        }
        Err(e) => {
            let message = e.to_string();
            (json!({"status": "error", "error": message}), Some(message))
        }
    };

    NodeExecution {
        output_result,
        code_executed: Some(code.code.clone()),
        elapsed_ms,
        failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stepflow_test_utils::FakeSandbox;

    #[tokio::test]
    async fn test_start_and_end_skip_sandbox() {
        let sandbox = FakeSandbox::new();
        let mut ctx = ExecutionContext::new();
        ctx.set("value", json!(1));

        for node in [Node::start("s"), Node::end("e")] {
            let exec = execute_node(&node, &mut ctx, &sandbox).await;
            assert!(exec.succeeded());
            assert_eq!(exec.elapsed_ms, 0);
            assert_eq!(exec.code_executed, None);
        }
        assert_eq!(sandbox.call_count(), 0);
        assert_eq!(ctx.get("value"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_action_merges_output() {
        let sandbox =
            FakeSandbox::new().succeed("doubled = value * 2", json!({"value": 10, "doubled": 20}));
        let mut ctx = ExecutionContext::new();
        ctx.set("value", json!(10));
        ctx.set("untouched", json!("keep"));

        let node = Node::action("double", "doubled = value * 2").with_executor("python");
        let exec = execute_node(&node, &mut ctx, &sandbox).await;

        assert!(exec.succeeded());
        assert_eq!(exec.code_executed.as_deref(), Some("doubled = value * 2"));
        assert_eq!(exec.output_result["status"], json!("success"));
        assert_eq!(ctx.get("doubled"), Some(&json!(20)));
        assert_eq!(ctx.get("untouched"), Some(&json!("keep")));

        let requests = sandbox.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].executor.as_deref(), Some("python"));
        assert_eq!(requests[0].context.get("value"), Some(&json!(10)));
        assert!(!requests[0].context.contains_key("doubled"));
    }

    #[tokio::test]
    async fn test_action_error_status_fails_node() {
        let sandbox = FakeSandbox::new().fail("boom()", "RuntimeError: boom");
        let mut ctx = ExecutionContext::new();
        ctx.set("value", json!(1));

        let exec = execute_node(&Node::action("a", "boom()"), &mut ctx, &sandbox).await;
        assert_eq!(exec.failure.as_deref(), Some("RuntimeError: boom"));
        assert_eq!(exec.output_result["error"], json!("RuntimeError: boom"));
        assert_eq!(ctx.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_fault_fails_node() {
        let sandbox = FakeSandbox::new().transport_fault("x", "connection reset");
        let mut ctx = ExecutionContext::new();

        let exec = execute_node(&Node::action("a", "x"), &mut ctx, &sandbox).await;
        let failure = exec.failure.unwrap();
        assert!(failure.contains("connection reset"));
        assert_eq!(exec.output_result["status"], json!("error"));
    }

    #[tokio::test]
    async fn test_undecodable_output_fails_node() {
        let sandbox = FakeSandbox::new().succeed("x", json!("{not json"));
        let mut ctx = ExecutionContext::new();

        let exec = execute_node(&Node::action("a", "x"), &mut ctx, &sandbox).await;
        assert!(!exec.succeeded());
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn test_decision_sets_branch_key_through_output() {
        let sandbox = FakeSandbox::new().succeed("decide()", json!({"branch_decision": true}));
        let mut ctx = ExecutionContext::new();

        let exec = execute_node(&Node::decision("d", "decide()"), &mut ctx, &sandbox).await;
        assert!(exec.succeeded());
        assert_eq!(ctx.get(BRANCH_DECISION_KEY), Some(&json!(true)));
    }
}

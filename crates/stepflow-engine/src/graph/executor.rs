use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use stepflow_core::config::{AppConfig, EngineConfig};
use stepflow_core::error::{GraphExecutionError, GraphValidationError, Result};
use stepflow_core::traits::SandboxClient;
use stepflow_core::types::RunId;
use stepflow_sandbox::HttpSandboxClient;

use super::context::ExecutionContext;
use super::edge::{branch_selector, next_node};
use super::node::NodeType;
use super::node_executor::execute_node;
use super::trace::{ExecutionTracer, TraceEntry};
use super::validator::validate;
use super::workflow::Workflow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Result of executing an entire workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub run_id: RunId,
    pub status: RunStatus,
    /// Context at loop exit. Kept as-is on failure.
    pub final_context: HashMap<String, serde_json::Value>,
    /// Per-node entries in visit order, including a failing node.
    pub execution_trace: Vec<TraceEntry>,
    pub nodes_executed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub total_elapsed_ms: u64,
}

impl WorkflowResult {
    pub fn succeeded(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Ids of the visited nodes, in order.
    pub fn path(&self) -> Vec<&str> {
        self.execution_trace
            .iter()
            .map(|e| e.node_id.as_str())
            .collect()
    }
}

/// Walks workflow graphs, one node at a time.
///
/// The engine holds only immutable configuration and the sandbox client, so
/// one instance can serve concurrent runs; each run owns its own context and
/// trace.
pub struct WorkflowEngine {
    sandbox: Arc<dyn SandboxClient>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn new(sandbox: Arc<dyn SandboxClient>) -> Self {
        Self {
            sandbox,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build an engine that talks to the configured HTTP sandbox.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let sandbox = HttpSandboxClient::from_config(&config.sandbox)?;
        Ok(Self::new(Arc::new(sandbox)).with_config(config.engine.clone()))
    }

    /// Parse, validate, and run a raw workflow definition.
    ///
    /// Structural problems and unresolvable branches are returned as `Err`.
    /// Node failures are not: they end the run with `RunStatus::Failed`.
    pub async fn execute_workflow(
        &self,
        workflow: &serde_json::Value,
        initial_context: impl Into<ExecutionContext>,
    ) -> Result<WorkflowResult> {
        let workflow = Workflow::parse(workflow)?;
        self.execute(&workflow, initial_context).await
    }

    /// Validate and run an already-parsed workflow.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        initial_context: impl Into<ExecutionContext>,
    ) -> Result<WorkflowResult> {
        validate(workflow)?;

        let run_id = RunId::new();
        let started = Instant::now();
        let mut context: ExecutionContext = initial_context.into();
        let mut tracer = ExecutionTracer::new();
        let mut visits: HashMap<String, usize> = HashMap::new();
        let mut current = workflow
            .start_node()
            .map(|n| n.id.clone())
            .ok_or(GraphValidationError::NoStartNode)?;

        info!(
            run_id = %run_id,
            nodes = workflow.node_count(),
            edges = workflow.edges().len(),
            "Starting workflow run"
        );

        loop {
            // Prevent infinite loops
            let limit = self.config.max_node_visits;
            let count = visits.entry(current.clone()).or_insert(0);
            *count += 1;
            if *count > limit {
                error!(run_id = %run_id, node_id = %current, limit, "Node visit limit reached");
                return Err(GraphExecutionError::VisitLimitExceeded {
                    node_id: current,
                    limit,
                }
                .into());
            }

            let node = workflow
                .node(&current)
                .ok_or_else(|| GraphExecutionError::NodeNotFound(current.clone()))?;

            info!(run_id = %run_id, node_id = %node.id, node_type = %node.node_type(), "Executing node");

            let input_context = context.snapshot();
            let started_at = Utc::now();
            let execution = execute_node(node, &mut context, self.sandbox.as_ref()).await;

            let mut entry = TraceEntry {
                node_id: node.id.clone(),
                node_type: node.node_type(),
                started_at,
                execution_time_ms: execution.elapsed_ms,
                input_context,
                output_result: execution.output_result,
                code_executed: execution.code_executed,
                decision_result: None,
                path_taken: None,
            };

            if let Some(message) = execution.failure {
                error!(
                    run_id = %run_id,
                    node_id = %node.id,
                    error = %message,
                    "Node execution failed"
                );
                tracer.record(entry);
                return Ok(finish(
                    run_id,
                    RunStatus::Failed,
                    context,
                    tracer,
                    Some(current),
                    Some(message),
                    started,
                ));
            }

            debug!(
                run_id = %run_id,
                node_id = %node.id,
                elapsed_ms = execution.elapsed_ms,
                "Node execution complete"
            );

            let next = next_node(&node.id, workflow.edges(), &context)?;

            if node.node_type() == NodeType::Decision {
                entry.decision_result = branch_selector(&context);
                entry.path_taken = next.clone();
            }
            tracer.record(entry);

            match next {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(finish(
            run_id,
            RunStatus::Success,
            context,
            tracer,
            None,
            None,
            started,
        ))
    }
}

fn finish(
    run_id: RunId,
    status: RunStatus,
    context: ExecutionContext,
    tracer: ExecutionTracer,
    failed_at_node: Option<String>,
    error: Option<String>,
    started: Instant,
) -> WorkflowResult {
    let execution_trace = tracer.into_entries();
    let total_elapsed_ms = started.elapsed().as_millis() as u64;

    info!(
        run_id = %run_id,
        status = ?status,
        nodes_executed = execution_trace.len(),
        total_elapsed_ms,
        "Workflow run finished"
    );

    WorkflowResult {
        run_id,
        status,
        final_context: context.into_inner(),
        nodes_executed: execution_trace.len(),
        execution_trace,
        failed_at_node,
        error,
        total_elapsed_ms,
    }
}

//! Graph Execution Engine — sequential walk over a workflow graph.
//!
//! A workflow is a directed graph of `Node`s connected by `Edge`s with exactly
//! one Start node. The `WorkflowEngine` parses and validates the definition,
//! then walks it from Start: each node runs through its `NodeKind` handler
//! (Action and Decision nodes call the sandbox), the result is recorded in the
//! trace, and the next node is picked from the outgoing edges. Nodes share
//! data through one `ExecutionContext` per run.

pub mod context;
pub mod edge;
pub mod executor;
pub mod node;
pub mod node_executor;
pub mod trace;
pub mod validator;
pub mod workflow;

pub use context::ExecutionContext;
pub use edge::{branch_selector, next_node, Edge, BRANCH_DECISION_KEY};
pub use executor::{RunStatus, WorkflowEngine, WorkflowResult};
pub use node::{Node, NodeCode, NodeKind, NodeType};
pub use node_executor::{execute_node, NodeExecution};
pub use trace::{ExecutionTracer, TraceEntry};
pub use validator::validate;
pub use workflow::{load_workflow_file, Workflow};

pub mod graph;

pub use graph::{
    branch_selector, execute_node, load_workflow_file, next_node, validate, Edge,
    ExecutionContext, ExecutionTracer, Node, NodeExecution, NodeKind, NodeType, RunStatus,
    TraceEntry, Workflow, WorkflowEngine, WorkflowResult, BRANCH_DECISION_KEY,
};

use thiserror::Error;

/// Structural problems in a workflow definition.
///
/// Raised by the parser and the validator before any node runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphValidationError {
    #[error("Workflow definition is missing the '{0}' key")]
    MissingKey(&'static str),

    #[error("Workflow '{key}' must be a list")]
    NotAList { key: &'static str },

    #[error("Invalid node record at index {index}: {reason}")]
    MalformedNode { index: usize, reason: String },

    #[error("Node '{id}' has unknown type '{node_type}'")]
    UnknownNodeType { id: String, node_type: String },

    #[error("Node '{id}' of type '{node_type}' is missing required field '{field}'")]
    MissingNodeField {
        id: String,
        node_type: String,
        field: &'static str,
    },

    #[error("Duplicate node id: '{0}'")]
    DuplicateNode(String),

    #[error("Invalid edge record at index {index}: {reason}")]
    MalformedEdge { index: usize, reason: String },

    #[error("Workflow must have exactly one start node, found none")]
    NoStartNode,

    #[error("Workflow must have exactly one start node, found {count}")]
    MultipleStartNodes { count: usize },

    #[error("Workflow must have at least one end node")]
    NoEndNode,

    #[error("Edge {from} -> {to} references non-existent node '{missing}'")]
    DanglingEdge {
        from: String,
        to: String,
        missing: String,
    },
}

/// Failures of the traversal itself (not of node code).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphExecutionError {
    #[error("Node '{node_id}' did not set 'branch_decision' in the context")]
    MissingBranchDecision { node_id: String },

    #[error("No outgoing edge of node '{node_id}' has condition '{decision}'")]
    NoMatchingBranch { node_id: String, decision: String },

    #[error("{count} outgoing edges of node '{node_id}' have condition '{decision}'")]
    AmbiguousBranch {
        node_id: String,
        decision: String,
        count: usize,
    },

    #[error("Node '{0}' not found in graph")]
    NodeNotFound(String),

    #[error("Node '{node_id}' visited more than {limit} times in one run")]
    VisitLimitExceeded { node_id: String, limit: usize },
}

#[derive(Debug, Error)]
pub enum StepflowError {
    #[error("Graph validation error: {0}")]
    GraphValidation(#[from] GraphValidationError),

    #[error("Graph execution error: {0}")]
    GraphExecution(#[from] GraphExecutionError),

    // Sandbox transport errors
    #[error("Sandbox request failed: {0}")]
    SandboxRequest(String),

    #[error("Sandbox returned HTTP {status}: {body}")]
    SandboxStatus { status: u16, body: String },

    #[error("Sandbox timeout after {timeout_ms}ms")]
    SandboxTimeout { timeout_ms: u64 },

    #[error("Sandbox response parse error: {0}")]
    SandboxParse(String),

    // Config errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StepflowError>;

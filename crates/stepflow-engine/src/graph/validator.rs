use stepflow_core::error::GraphValidationError;

use super::node::NodeType;
use super::workflow::Workflow;

/// Check graph-wide invariants. Must pass before any node executes.
///
/// 1. exactly one Start node;
/// 2. at least one End node;
/// 3. every edge endpoint names an existing node (first violation wins).
pub fn validate(workflow: &Workflow) -> Result<(), GraphValidationError> {
    let starts = workflow
        .nodes()
        .filter(|n| n.node_type() == NodeType::Start)
        .count();
    match starts {
        0 => return Err(GraphValidationError::NoStartNode),
        1 => {}
        count => return Err(GraphValidationError::MultipleStartNodes { count }),
    }

    if !workflow.nodes().any(|n| n.node_type() == NodeType::End) {
        return Err(GraphValidationError::NoEndNode);
    }

    for edge in workflow.edges() {
        for endpoint in [&edge.from, &edge.to] {
            if !workflow.contains(endpoint) {
                return Err(GraphValidationError::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
    }

    Ok(())
}

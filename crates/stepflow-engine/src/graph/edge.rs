use serde::{Deserialize, Serialize};
use tracing::debug;

use stepflow_core::error::GraphExecutionError;

use super::context::ExecutionContext;

/// Context key a Decision node's code sets to choose a branch.
pub const BRANCH_DECISION_KEY: &str = "branch_decision";

/// An edge connecting two nodes in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
    /// Branch label compared against the decision outcome (`"true"`/`"false"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Edge {
    /// Create an unconditional edge.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: None,
        }
    }

    /// Create an edge taken when the decision outcome equals `condition`.
    pub fn conditional(
        from: impl Into<String>,
        to: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: Some(condition.into()),
        }
    }
}

/// Read the decision outcome from the context as a branch label.
///
/// Booleans become `"true"`/`"false"`, strings are lower-cased, and any other
/// value uses its JSON text. Returns `None` when the key is absent.
pub fn branch_selector(context: &ExecutionContext) -> Option<String> {
    context.get(BRANCH_DECISION_KEY).map(|value| match value {
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::String(s) => s.to_lowercase(),
        other => other.to_string(),
    })
}

/// Pick the node that follows `node_id`.
///
/// - no outgoing edges: `None`, the walk ends here;
/// - a single unconditional edge: its target;
/// - anything else is a branch: exactly one edge whose condition equals
///   `branch_selector(context)` must exist.
pub fn next_node(
    node_id: &str,
    edges: &[Edge],
    context: &ExecutionContext,
) -> Result<Option<String>, GraphExecutionError> {
    let outgoing: Vec<&Edge> = edges.iter().filter(|e| e.from == node_id).collect();

    match outgoing.as_slice() {
        [] => {
            debug!(node_id, "No outgoing edges, terminal node");
            return Ok(None);
        }
        [only] if only.condition.is_none() => {
            debug!(node_id, next = %only.to, "Following unconditional edge");
            return Ok(Some(only.to.clone()));
        }
        _ => {}
    }

    let decision =
        branch_selector(context).ok_or_else(|| GraphExecutionError::MissingBranchDecision {
            node_id: node_id.to_string(),
        })?;

    let matching: Vec<&&Edge> = outgoing
        .iter()
        .filter(|e| e.condition.as_deref() == Some(decision.as_str()))
        .collect();

    match matching.as_slice() {
        [edge] => {
            debug!(node_id, decision = %decision, next = %edge.to, "Branch resolved");
            Ok(Some(edge.to.clone()))
        }
        [] => Err(GraphExecutionError::NoMatchingBranch {
            node_id: node_id.to_string(),
            decision,
        }),
        many => Err(GraphExecutionError::AmbiguousBranch {
            node_id: node_id.to_string(),
            decision,
            count: many.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decision_edges() -> Vec<Edge> {
        vec![
            Edge::new("start", "decide"),
            Edge::conditional("decide", "A", "true"),
            Edge::conditional("decide", "B", "false"),
        ]
    }

    fn ctx_with_decision(value: serde_json::Value) -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        ctx.set(BRANCH_DECISION_KEY, value);
        ctx
    }

    #[test]
    fn test_terminal_node() {
        let ctx = ExecutionContext::new();
        assert_eq!(next_node("end", &decision_edges(), &ctx), Ok(None));
    }

    #[test]
    fn test_unconditional_edge() {
        let ctx = ExecutionContext::new();
        assert_eq!(
            next_node("start", &decision_edges(), &ctx),
            Ok(Some("decide".to_string()))
        );
    }

    #[test]
    fn test_true_branch() {
        let ctx = ctx_with_decision(json!(true));
        assert_eq!(
            next_node("decide", &decision_edges(), &ctx),
            Ok(Some("A".to_string()))
        );
    }

    #[test]
    fn test_false_branch() {
        let ctx = ctx_with_decision(json!(false));
        assert_eq!(
            next_node("decide", &decision_edges(), &ctx),
            Ok(Some("B".to_string()))
        );
    }

    #[test]
    fn test_missing_decision() {
        let ctx = ExecutionContext::new();
        let err = next_node("decide", &decision_edges(), &ctx).unwrap_err();
        assert_eq!(
            err,
            GraphExecutionError::MissingBranchDecision {
                node_id: "decide".into()
            }
        );
        assert!(err.to_string().contains("branch_decision"));
    }

    #[test]
    fn test_string_decision_is_lowercased() {
        let ctx = ctx_with_decision(json!("TRUE"));
        assert_eq!(
            next_node("decide", &decision_edges(), &ctx),
            Ok(Some("A".to_string()))
        );
    }

    #[test]
    fn test_no_matching_condition() {
        let ctx = ctx_with_decision(json!(1));
        let err = next_node("decide", &decision_edges(), &ctx).unwrap_err();
        assert_eq!(
            err,
            GraphExecutionError::NoMatchingBranch {
                node_id: "decide".into(),
                decision: "1".into(),
            }
        );
    }

    #[test]
    fn test_ambiguous_condition() {
        let edges = vec![
            Edge::conditional("decide", "A", "true"),
            Edge::conditional("decide", "B", "true"),
        ];
        let ctx = ctx_with_decision(json!(true));
        let err = next_node("decide", &edges, &ctx).unwrap_err();
        assert!(matches!(
            err,
            GraphExecutionError::AmbiguousBranch { count: 2, .. }
        ));
    }

    #[test]
    fn test_multi_way_labels() {
        let edges = vec![
            Edge::conditional("route", "small", "small"),
            Edge::conditional("route", "medium", "medium"),
            Edge::conditional("route", "large", "large"),
        ];
        let ctx = ctx_with_decision(json!("Medium"));
        assert_eq!(
            next_node("route", &edges, &ctx),
            Ok(Some("medium".to_string()))
        );
    }

    #[test]
    fn test_single_conditional_edge_is_guarded() {
        let edges = vec![Edge::conditional("check", "next", "true")];

        let ctx = ctx_with_decision(json!(true));
        assert_eq!(next_node("check", &edges, &ctx), Ok(Some("next".to_string())));

        let ctx = ctx_with_decision(json!(false));
        assert!(matches!(
            next_node("check", &edges, &ctx),
            Err(GraphExecutionError::NoMatchingBranch { .. })
        ));
    }

    #[test]
    fn test_branch_selector_values() {
        assert_eq!(branch_selector(&ExecutionContext::new()), None);
        assert_eq!(
            branch_selector(&ctx_with_decision(json!(false))),
            Some("false".into())
        );
        assert_eq!(
            branch_selector(&ctx_with_decision(json!("Yes"))),
            Some("yes".into())
        );
    }

    #[test]
    fn test_edge_deserializes_without_condition() {
        let edge: Edge = serde_json::from_value(json!({"from": "a", "to": "b"})).unwrap();
        assert_eq!(edge, Edge::new("a", "b"));
    }
}

use std::collections::HashMap;
use std::path::Path;

use stepflow_core::error::{GraphValidationError, Result};

use super::edge::Edge;
use super::node::{Node, NodeType};

type ParseResult<T> = std::result::Result<T, GraphValidationError>;

/// A parsed workflow graph. Immutable for the duration of a run.
///
/// Parsing checks each record on its own; graph-wide invariants (start/end
/// cardinality, edge targets) are checked by [`super::validate`].
#[derive(Debug, Clone)]
pub struct Workflow {
    nodes: HashMap<String, Node>,
    /// Node ids in definition order.
    order: Vec<String>,
    edges: Vec<Edge>,
}

impl Workflow {
    /// Build a workflow from already-typed nodes and edges.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> ParseResult<Self> {
        let mut map = HashMap::with_capacity(nodes.len());
        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(GraphValidationError::DuplicateNode(node.id));
            }
            order.push(node.id.clone());
            map.insert(node.id.clone(), node);
        }
        Ok(Self {
            nodes: map,
            order,
            edges,
        })
    }

    /// Parse a raw `{nodes: [...], edges: [...]}` definition.
    pub fn parse(raw: &serde_json::Value) -> ParseResult<Self> {
        let raw_nodes = list_field(raw, "nodes")?;
        let raw_edges = list_field(raw, "edges")?;

        let nodes = raw_nodes
            .iter()
            .enumerate()
            .map(|(index, record)| Node::from_record(index, record))
            .collect::<ParseResult<Vec<_>>>()?;

        let edges = raw_edges
            .iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<Edge>(record.clone()).map_err(|e| {
                    GraphValidationError::MalformedEdge {
                        index,
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<ParseResult<Vec<_>>>()?;

        Self::new(nodes, edges)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in definition order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// The first Start node in definition order.
    pub fn start_node(&self) -> Option<&Node> {
        self.nodes().find(|n| n.node_type() == NodeType::Start)
    }
}

fn list_field<'a>(
    raw: &'a serde_json::Value,
    key: &'static str,
) -> ParseResult<&'a Vec<serde_json::Value>> {
    raw.get(key)
        .ok_or(GraphValidationError::MissingKey(key))?
        .as_array()
        .ok_or(GraphValidationError::NotAList { key })
}

/// Read a workflow definition file as JSON.
pub fn load_workflow_file(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_linear() {
        let raw = json!({
            "nodes": [
                {"id": "start", "type": "start"},
                {"id": "process", "type": "action", "code": "result = 42"},
                {"id": "end", "type": "end"}
            ],
            "edges": [
                {"from": "start", "to": "process"},
                {"from": "process", "to": "end"}
            ]
        });
        let wf = Workflow::parse(&raw).unwrap();
        assert_eq!(wf.node_count(), 3);
        assert_eq!(wf.edges().len(), 2);
        assert_eq!(wf.start_node().map(|n| n.id.as_str()), Some("start"));
        assert_eq!(wf.node("process").and_then(|n| n.code()), Some("result = 42"));

        let ids: Vec<&str> = wf.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "process", "end"]);
    }

    #[test]
    fn test_missing_nodes_key() {
        let err = Workflow::parse(&json!({"edges": []})).unwrap_err();
        assert_eq!(err, GraphValidationError::MissingKey("nodes"));
    }

    #[test]
    fn test_missing_edges_key() {
        let err = Workflow::parse(&json!({"nodes": []})).unwrap_err();
        assert_eq!(err, GraphValidationError::MissingKey("edges"));
    }

    #[test]
    fn test_nodes_not_a_list() {
        let err = Workflow::parse(&json!({"nodes": {"a": 1}, "edges": []})).unwrap_err();
        assert_eq!(err, GraphValidationError::NotAList { key: "nodes" });
    }

    #[test]
    fn test_invalid_node_names_offender() {
        let raw = json!({
            "nodes": [
                {"id": "start", "type": "start"},
                {"id": "judge", "type": "decision"}
            ],
            "edges": []
        });
        let err = Workflow::parse(&raw).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("judge"));
        assert!(msg.contains("decision"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let raw = json!({
            "nodes": [
                {"id": "a", "type": "start"},
                {"id": "a", "type": "end"}
            ],
            "edges": []
        });
        assert_eq!(
            Workflow::parse(&raw).unwrap_err(),
            GraphValidationError::DuplicateNode("a".into())
        );
    }

    #[test]
    fn test_malformed_edge() {
        let raw = json!({
            "nodes": [{"id": "a", "type": "start"}],
            "edges": [{"from": "a"}]
        });
        assert!(matches!(
            Workflow::parse(&raw).unwrap_err(),
            GraphValidationError::MalformedEdge { index: 0, .. }
        ));
    }

    #[test]
    fn test_load_workflow_file() {
        let dir = std::env::temp_dir().join(format!("stepflow-wf-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wf.json");
        std::fs::write(&path, r#"{"nodes": [], "edges": []}"#).unwrap();

        let raw = load_workflow_file(&path).unwrap();
        assert_eq!(raw, json!({"nodes": [], "edges": []}));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::NodeType;

/// Execution record for one visited node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub node_id: String,
    pub node_type: NodeType,
    pub started_at: DateTime<Utc>,
    /// Wall-clock time spent in the node; zero for Start and End.
    pub execution_time_ms: u64,
    /// Context as it was before the node ran.
    pub input_context: HashMap<String, serde_json::Value>,
    /// Raw node outcome (the sandbox response for Action/Decision nodes).
    pub output_result: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_executed: Option<String>,
    /// Branch label read after a Decision node ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_result: Option<String>,
    /// Node chosen after a Decision node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_taken: Option<String>,
}

/// Append-only trace of one run, in visit order.
#[derive(Debug, Default)]
pub struct ExecutionTracer {
    entries: Vec<TraceEntry>,
}

impl ExecutionTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, node_type: NodeType) -> TraceEntry {
        TraceEntry {
            node_id: id.to_string(),
            node_type,
            started_at: Utc::now(),
            execution_time_ms: 0,
            input_context: HashMap::new(),
            output_result: serde_json::Value::Null,
            code_executed: None,
            decision_result: None,
            path_taken: None,
        }
    }

    #[test]
    fn test_records_in_order() {
        let mut tracer = ExecutionTracer::new();
        assert!(tracer.is_empty());
        tracer.record(entry("start", NodeType::Start));
        tracer.record(entry("end", NodeType::End));

        let ids: Vec<&str> = tracer.entries().iter().map(|e| e.node_id.as_str()).collect();
        assert_eq!(ids, vec!["start", "end"]);
        assert_eq!(tracer.into_entries().len(), 2);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let value = serde_json::to_value(entry("start", NodeType::Start)).unwrap();
        assert_eq!(value["node_type"], json!("start"));
        assert!(value.get("code_executed").is_none());
        assert!(value.get("decision_result").is_none());
        assert!(value.get("path_taken").is_none());
    }
}

use std::collections::HashMap;

use serde_json::json;

/// Code of the `decide` node in [`decision_workflow`].
pub const DECIDE_CODE: &str = "branch_decision = value > 5";

/// `start -> step_1 -> ... -> step_n -> end`. Step `i` runs code `step_i`.
pub fn linear_workflow(actions: usize) -> serde_json::Value {
    let mut ids = vec!["start".to_string()];
    ids.extend((1..=actions).map(|i| format!("step_{i}")));
    ids.push("end".to_string());

    let nodes: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| match id.as_str() {
            "start" => json!({"id": "start", "type": "start"}),
            "end" => json!({"id": "end", "type": "end"}),
            step => json!({"id": step, "type": "action", "code": step}),
        })
        .collect();

    let edges: Vec<serde_json::Value> = ids
        .windows(2)
        .map(|pair| json!({"from": pair[0], "to": pair[1]}))
        .collect();

    json!({"nodes": nodes, "edges": edges})
}

/// `start -> decide`, then `true_end` or `false_end` on `branch_decision`.
pub fn decision_workflow() -> serde_json::Value {
    json!({
        "nodes": [
            {"id": "start", "type": "start"},
            {"id": "decide", "type": "decision", "code": DECIDE_CODE},
            {"id": "true_end", "type": "end"},
            {"id": "false_end", "type": "end"}
        ],
        "edges": [
            {"from": "start", "to": "decide"},
            {"from": "decide", "to": "true_end", "condition": "true"},
            {"from": "decide", "to": "false_end", "condition": "false"}
        ]
    })
}

/// Turn a JSON object into an initial context map. Non-objects give an empty map.
pub fn context(value: serde_json::Value) -> HashMap<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    }
}

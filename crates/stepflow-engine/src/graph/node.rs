use serde::{Deserialize, Serialize};

use stepflow_core::error::GraphValidationError;

/// The declared type of a node, as it appears in workflow definitions and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    End,
    Action,
    Decision,
}

impl NodeType {
    /// Parse a type tag, ignoring case. Returns `None` for unknown tags.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "action" => Some(Self::Action),
            "decision" => Some(Self::Decision),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Action => "action",
            Self::Decision => "decision",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Code shipped to the sandbox by Action and Decision nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCode {
    pub code: String,
    /// Optional runtime hint forwarded to the sandbox.
    pub executor: Option<String>,
}

/// Per-type payload of a node. Action and Decision always carry code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    End,
    Action(NodeCode),
    Decision(NodeCode),
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Unique identifier for this node.
    pub id: String,
    pub kind: NodeKind,
}

/// Wire shape of a node record before type checking.
#[derive(Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(rename = "type")]
    node_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    executor: Option<String>,
}

impl Node {
    pub fn start(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Start,
        }
    }

    pub fn end(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::End,
        }
    }

    pub fn action(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Action(NodeCode {
                code: code.into(),
                executor: None,
            }),
        }
    }

    pub fn decision(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Decision(NodeCode {
                code: code.into(),
                executor: None,
            }),
        }
    }

    /// Set the sandbox executor. No effect on Start and End nodes.
    pub fn with_executor(mut self, executor: impl Into<String>) -> Self {
        if let NodeKind::Action(c) | NodeKind::Decision(c) = &mut self.kind {
            c.executor = Some(executor.into());
        }
        self
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Start => NodeType::Start,
            NodeKind::End => NodeType::End,
            NodeKind::Action(_) => NodeType::Action,
            NodeKind::Decision(_) => NodeType::Decision,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Action(c) | NodeKind::Decision(c) => Some(&c.code),
            NodeKind::Start | NodeKind::End => None,
        }
    }

    /// Interpret one raw node record from a workflow definition.
    ///
    /// `index` is the record's position in the `nodes` list, used in errors
    /// when the record has no usable id.
    pub fn from_record(
        index: usize,
        raw: &serde_json::Value,
    ) -> Result<Self, GraphValidationError> {
        let record: NodeRecord = serde_json::from_value(raw.clone()).map_err(|e| {
            GraphValidationError::MalformedNode {
                index,
                reason: e.to_string(),
            }
        })?;

        let Some(tag) = record.node_type else {
            return Err(GraphValidationError::MissingNodeField {
                id: record.id,
                node_type: "<none>".to_string(),
                field: "type",
            });
        };

        let node_type =
            NodeType::parse(&tag).ok_or_else(|| GraphValidationError::UnknownNodeType {
                id: record.id.clone(),
                node_type: tag.clone(),
            })?;

        let kind = match node_type {
            NodeType::Start => NodeKind::Start,
            NodeType::End => NodeKind::End,
            NodeType::Action | NodeType::Decision => {
                let code = record
                    .code
                    .ok_or_else(|| GraphValidationError::MissingNodeField {
                        id: record.id.clone(),
                        node_type: node_type.to_string(),
                        field: "code",
                    })?;
                let code = NodeCode {
                    code,
                    executor: record.executor,
                };
                if node_type == NodeType::Action {
                    NodeKind::Action(code)
                } else {
                    NodeKind::Decision(code)
                }
            }
        };

        Ok(Self {
            id: record.id,
            kind,
        })
    }
}

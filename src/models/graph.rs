use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A typed graph vertex with free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: u64,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A typed, directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: u64,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub from_id: u64,
    pub to_id: u64,
}

impl GraphEdge {
    pub fn touches(&self, node_id: u64) -> bool {
        self.from_id == node_id || self.to_id == node_id
    }
}

/// Edge listing filter. Empty strings and zero ids mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub edge_type: String,
    pub from_id: u64,
    pub to_id: u64,
}

impl EdgeFilter {
    pub fn from_node(id: u64) -> Self {
        Self {
            from_id: id,
            ..Self::default()
        }
    }

    pub fn to_node(id: u64) -> Self {
        Self {
            to_id: id,
            ..Self::default()
        }
    }

    pub fn matches(&self, edge: &GraphEdge) -> bool {
        (self.edge_type.is_empty() || self.edge_type == edge.edge_type)
            && (self.from_id == 0 || self.from_id == edge.from_id)
            && (self.to_id == 0 || self.to_id == edge.to_id)
    }
}

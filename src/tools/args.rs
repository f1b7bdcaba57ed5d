//! Argument types for the graph tools.
//!
//! Field docs become the parameter descriptions the model sees.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetNodeArgs {
    /// The unique identifier of the node to retrieve.
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListNodesArgs {
    /// The type of nodes to list. If empty, all nodes will be returned.
    #[serde(default)]
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateNodeArgs {
    /// The type of the node to create. For example, 'person', 'document', etc.
    #[serde(rename = "type")]
    pub node_type: String,
    /// A map of properties to store with the node. For example, {"name": "John", "age": 30}.
    #[serde(default)]
    pub props: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteNodeArgs {
    /// The unique identifier of the node to delete.
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEdgeArgs {
    /// The unique identifier of the edge to retrieve.
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListEdgesArgs {
    /// Filter edges by this type. For example, 'knows', 'contains', etc.
    #[serde(default, rename = "type")]
    pub edge_type: Option<String>,
    /// Filter edges that originate from this node ID.
    #[serde(default)]
    pub from_id: Option<u64>,
    /// Filter edges that point to this node ID.
    #[serde(default)]
    pub to_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateEdgeArgs {
    /// The type of the edge to create. For example, 'knows', 'contains', etc.
    #[serde(rename = "type")]
    pub edge_type: String,
    /// The ID of the source node where the edge starts.
    pub from_id: u64,
    /// The ID of the target node where the edge ends.
    pub to_id: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteEdgeArgs {
    /// The unique identifier of the edge to delete.
    pub id: u64,
}

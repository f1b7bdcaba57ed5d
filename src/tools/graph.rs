//! Handlers mapping tool calls onto [`GraphRepository`] operations.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::args::*;
use super::{schema_of, ToolDefinition};
use crate::models::EdgeFilter;
use crate::repository::GraphRepository;
use crate::AgntError;

/// The fixed catalogue of graph tools, in declaration order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_node",
            description: "Retrieves a single graph node by its ID. Returns the node's ID, type, and properties.",
            schema: schema_of::<GetNodeArgs>,
            handler: get_node,
        },
        ToolDefinition {
            name: "list_nodes",
            description: "Lists all graph nodes of a specific type. If no type is provided, returns all nodes.",
            schema: schema_of::<ListNodesArgs>,
            handler: list_nodes,
        },
        ToolDefinition {
            name: "create_node",
            description: "Creates a new graph node with the specified type and properties. Returns the created node with its assigned ID.",
            schema: schema_of::<CreateNodeArgs>,
            handler: create_node,
        },
        ToolDefinition {
            name: "delete_node",
            description: "Deletes a graph node by its ID. Note that this will also delete all edges connected to this node.",
            schema: schema_of::<DeleteNodeArgs>,
            handler: delete_node,
        },
        ToolDefinition {
            name: "get_edge",
            description: "Retrieves a single graph edge by its ID. Returns the edge's ID, type, and the IDs of its connected nodes.",
            schema: schema_of::<GetEdgeArgs>,
            handler: get_edge,
        },
        ToolDefinition {
            name: "list_edges",
            description: "Lists graph edges based on optional filters. Can filter by edge type, source node ID, and/or target node ID.",
            schema: schema_of::<ListEdgesArgs>,
            handler: list_edges,
        },
        ToolDefinition {
            name: "create_edge",
            description: "Creates a new graph edge connecting two nodes. Specify the edge type and the IDs of the source and target nodes.",
            schema: schema_of::<CreateEdgeArgs>,
            handler: create_edge,
        },
        ToolDefinition {
            name: "delete_edge",
            description: "Deletes a graph edge by its ID.",
            schema: schema_of::<DeleteEdgeArgs>,
            handler: delete_edge,
        },
    ]
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T, AgntError> {
    serde_json::from_value(args)
        .map_err(|e| AgntError::InvalidArgument(format!("invalid arguments: {}", e)))
}

fn success() -> Value {
    json!({ "success": true })
}

fn get_node(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: GetNodeArgs = parse(args)?;
    Ok(serde_json::to_value(graph.get_node(args.id)?)?)
}

fn list_nodes(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: ListNodesArgs = parse(args)?;
    Ok(serde_json::to_value(graph.list_nodes(args.node_type.as_deref())?)?)
}

fn create_node(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: CreateNodeArgs = parse(args)?;
    let node = graph.create_node(&args.node_type, args.props.unwrap_or_default())?;
    Ok(serde_json::to_value(node)?)
}

fn delete_node(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: DeleteNodeArgs = parse(args)?;
    graph.delete_node(args.id)?;
    Ok(success())
}

fn get_edge(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: GetEdgeArgs = parse(args)?;
    Ok(serde_json::to_value(graph.get_edge(args.id)?)?)
}

fn list_edges(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: ListEdgesArgs = parse(args)?;
    let filter = EdgeFilter {
        edge_type: args.edge_type.unwrap_or_default(),
        from_id: args.from_id.unwrap_or_default(),
        to_id: args.to_id.unwrap_or_default(),
    };
    Ok(serde_json::to_value(graph.list_edges(&filter)?)?)
}

fn create_edge(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: CreateEdgeArgs = parse(args)?;
    let edge = graph.create_edge(&args.edge_type, args.from_id, args.to_id)?;
    Ok(serde_json::to_value(edge)?)
}

fn delete_edge(graph: &dyn GraphRepository, args: Value) -> Result<Value, AgntError> {
    let args: DeleteEdgeArgs = parse(args)?;
    graph.delete_edge(args.id)?;
    Ok(success())
}

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::db::schema::{EDGE_PARTITION, NODE_PARTITION};
use crate::db::{ReadTx, Store};
use crate::models::{EdgeFilter, GraphEdge, GraphNode};
use crate::AgntError;

/// Repository trait for the property graph.
///
/// Every call runs in exactly one store transaction.
pub trait GraphRepository: Send + Sync {
    fn get_node(&self, id: u64) -> Result<GraphNode, AgntError>;
    /// Nodes in ascending id order, optionally restricted to one type.
    fn list_nodes(&self, node_type: Option<&str>) -> Result<Vec<GraphNode>, AgntError>;
    fn create_node(
        &self,
        node_type: &str,
        properties: Map<String, Value>,
    ) -> Result<GraphNode, AgntError>;
    /// Delete a node and every edge incident to it.
    fn delete_node(&self, id: u64) -> Result<(), AgntError>;

    fn get_edge(&self, id: u64) -> Result<GraphEdge, AgntError>;
    fn list_edges(&self, filter: &EdgeFilter) -> Result<Vec<GraphEdge>, AgntError>;
    /// Create an edge; both endpoints must already exist.
    fn create_edge(&self, edge_type: &str, from_id: u64, to_id: u64)
        -> Result<GraphEdge, AgntError>;
    fn delete_edge(&self, id: u64) -> Result<(), AgntError>;
}

/// Graph repository backed by the node and edge partitions of a [`Store`].
pub struct StoreGraphRepository {
    store: Arc<Store>,
}

impl StoreGraphRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

fn require_type(kind: &str, value: &str) -> Result<(), AgntError> {
    if value.trim().is_empty() {
        return Err(AgntError::InvalidArgument(format!(
            "{} type must not be empty",
            kind
        )));
    }
    Ok(())
}

fn node_exists(tx: &ReadTx<'_>, id: u64) -> Result<bool, AgntError> {
    Ok(tx.get_record::<GraphNode>(NODE_PARTITION, id)?.is_some())
}

impl GraphRepository for StoreGraphRepository {
    fn get_node(&self, id: u64) -> Result<GraphNode, AgntError> {
        self.store
            .read(|tx| tx.get_record(NODE_PARTITION, id))?
            .ok_or(AgntError::NotFound {
                entity_type: "node",
                id,
            })
    }

    fn list_nodes(&self, node_type: Option<&str>) -> Result<Vec<GraphNode>, AgntError> {
        let nodes: Vec<GraphNode> = self.store.read(|tx| tx.scan_records(NODE_PARTITION))?;
        Ok(match node_type.filter(|t| !t.is_empty()) {
            Some(wanted) => nodes.into_iter().filter(|n| n.node_type == wanted).collect(),
            None => nodes,
        })
    }

    fn create_node(
        &self,
        node_type: &str,
        properties: Map<String, Value>,
    ) -> Result<GraphNode, AgntError> {
        require_type("node", node_type)?;
        let node = self.store.write(|tx| {
            let node = GraphNode {
                id: tx.next_sequence(NODE_PARTITION)?,
                node_type: node_type.to_string(),
                properties,
            };
            tx.put_record(NODE_PARTITION, node.id, &node)?;
            Ok(node)
        })?;
        tracing::debug!(node_id = node.id, node_type = %node.node_type, "Created node");
        Ok(node)
    }

    fn delete_node(&self, id: u64) -> Result<(), AgntError> {
        let removed_edges = self.store.write(|tx| {
            tx.delete_record(NODE_PARTITION, id)?;

            let edges: Vec<GraphEdge> = tx.scan_records(EDGE_PARTITION)?;
            let mut removed = 0usize;
            for edge in edges.iter().filter(|e| e.touches(id)) {
                tx.delete_record(EDGE_PARTITION, edge.id)?;
                removed += 1;
            }
            Ok(removed)
        })?;
        tracing::debug!(node_id = id, removed_edges, "Deleted node");
        Ok(())
    }

    fn get_edge(&self, id: u64) -> Result<GraphEdge, AgntError> {
        self.store
            .read(|tx| tx.get_record(EDGE_PARTITION, id))?
            .ok_or(AgntError::NotFound {
                entity_type: "edge",
                id,
            })
    }

    fn list_edges(&self, filter: &EdgeFilter) -> Result<Vec<GraphEdge>, AgntError> {
        let edges: Vec<GraphEdge> = self.store.read(|tx| tx.scan_records(EDGE_PARTITION))?;
        Ok(edges.into_iter().filter(|e| filter.matches(e)).collect())
    }

    fn create_edge(
        &self,
        edge_type: &str,
        from_id: u64,
        to_id: u64,
    ) -> Result<GraphEdge, AgntError> {
        require_type("edge", edge_type)?;
        let edge = self.store.write(|tx| {
            if !node_exists(tx, from_id)? {
                return Err(AgntError::Reference {
                    role: "source",
                    id: from_id,
                });
            }
            if !node_exists(tx, to_id)? {
                return Err(AgntError::Reference {
                    role: "target",
                    id: to_id,
                });
            }
            let edge = GraphEdge {
                id: tx.next_sequence(EDGE_PARTITION)?,
                edge_type: edge_type.to_string(),
                from_id,
                to_id,
            };
            tx.put_record(EDGE_PARTITION, edge.id, &edge)?;
            Ok(edge)
        })?;
        tracing::debug!(edge_id = edge.id, from_id, to_id, "Created edge");
        Ok(edge)
    }

    fn delete_edge(&self, id: u64) -> Result<(), AgntError> {
        self.store.write(|tx| tx.delete_record(EDGE_PARTITION, id))?;
        Ok(())
    }
}

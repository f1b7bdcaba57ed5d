//! Graph inspection handler for CLI.

use anyhow::Result;
use serde_json::json;

use crate::cli::output::{output_json_list, print_header, print_table, OutputMode};
use crate::init::AppContext;
use crate::models::EdgeFilter;
use crate::repository::GraphRepository;

pub fn show_graph(ctx: &AppContext, node_type: Option<&str>, mode: OutputMode) -> Result<()> {
    let nodes = ctx.graph_repo.list_nodes(node_type)?;
    let edges = ctx.graph_repo.list_edges(&EdgeFilter::default())?;

    if mode == OutputMode::Json {
        output_json_list(&[json!({ "nodes": nodes, "edges": edges })]);
        return Ok(());
    }

    print_header("Nodes");
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|n| {
            vec![
                n.id.to_string(),
                n.node_type.clone(),
                serde_json::Value::Object(n.properties.clone()).to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "Type", "Properties"], rows);

    print_header("Edges");
    let rows: Vec<Vec<String>> = edges
        .iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.edge_type.clone(),
                e.from_id.to_string(),
                e.to_id.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "Type", "From", "To"], rows);
    Ok(())
}

//! Tool registry: the catalogue of functions the model may call.
//!
//! Each entry pairs a name and description with a JSON schema derived from
//! its argument type and a handler that adapts the call onto the graph
//! repository. Handlers are stateless; the registry only holds the
//! repository handle.

pub mod args;
pub mod graph;

use std::sync::Arc;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::repository::GraphRepository;
use crate::AgntError;

type Handler = fn(&dyn GraphRepository, Value) -> Result<Value, AgntError>;

/// One registered tool.
#[derive(Clone, Copy)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: fn() -> Value,
    pub handler: Handler,
}

/// Declaration of a callable function as sent to the model provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// JSON schema for a tool's argument type, without the meta keys providers reject.
pub fn schema_of<T: JsonSchema>() -> Value {
    let mut value = schemars::schema_for!(T).to_value();
    if let Value::Object(map) = &mut value {
        map.remove("$schema");
        map.remove("title");
    }
    value
}

pub struct ToolRegistry {
    graph: Arc<dyn GraphRepository>,
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// Registry with the eight graph tools.
    pub fn new(graph: Arc<dyn GraphRepository>) -> Self {
        Self {
            graph,
            tools: self::graph::definitions(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Function declarations for a provider request.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name.to_string(),
                description: t.description.to_string(),
                parameters: (t.schema)(),
            })
            .collect()
    }

    /// Run a tool and serialize its result to a JSON string.
    ///
    /// Unknown tools and malformed arguments fail with
    /// [`AgntError::InvalidArgument`]; repository errors pass through unchanged.
    #[instrument(skip(self, args))]
    pub fn dispatch(&self, name: &str, args: &Map<String, Value>) -> Result<String, AgntError> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgntError::InvalidArgument(format!("unknown tool: {}", name)))?;
        let result = (tool.handler)(self.graph.as_ref(), Value::Object(args.clone()))?;
        Ok(serde_json::to_string(&result)?)
    }
}

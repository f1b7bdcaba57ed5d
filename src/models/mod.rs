pub mod chat;
pub mod graph;
pub mod message;

pub use chat::{ChatState, ChatThread};
pub use graph::{EdgeFilter, GraphEdge, GraphNode};
pub use message::{Message, MessageKind, MessagePayload, ToolCall};

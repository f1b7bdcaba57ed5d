pub mod chat;
pub mod graph;

pub use chat::{ChatRepository, StoreChatRepository};
pub use graph::{GraphRepository, StoreGraphRepository};

//! Test harness for store lifecycle management.
//!
//! Provides isolated store instances per test using tempfile.

use std::sync::Arc;
use tempfile::TempDir;

use agnt::agent::{Agent, AgentSettings};
use agnt::config::AgntConfig;
use agnt::db::connection::db_path;
use agnt::db::Store;
use agnt::llm::Provider;
use agnt::repository::{StoreChatRepository, StoreGraphRepository};
use agnt::tools::ToolRegistry;

/// Test harness that manages store lifecycle.
///
/// Each TestHarness opens an isolated store in a temporary directory.
/// The directory is removed when the harness is dropped.
pub struct TestHarness {
    pub store: Arc<Store>,
    pub chats: Arc<StoreChatRepository>,
    pub graph: Arc<StoreGraphRepository>,
    /// Temporary directory (kept alive while harness exists)
    pub temp_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness with an isolated store.
    ///
    /// Panics if the store cannot be opened (appropriate for tests).
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test store");
        Self::open_in(temp_dir)
    }

    fn open_in(temp_dir: TempDir) -> Self {
        let store = Arc::new(
            Store::open(&db_path(temp_dir.path())).expect("Failed to open test store"),
        );
        Self {
            chats: Arc::new(StoreChatRepository::new(store.clone())),
            graph: Arc::new(StoreGraphRepository::new(store.clone())),
            store,
            temp_dir,
        }
    }

    /// Close the store and open the same file again.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            chats,
            graph,
            temp_dir,
        } = self;
        drop((chats, graph, store));
        Self::open_in(temp_dir)
    }

    pub fn tools(&self) -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(self.graph.clone()))
    }

    /// Agent over this store with default settings.
    pub fn agent(&self, provider: Arc<dyn Provider>) -> Agent {
        self.agent_with(provider, AgentSettings::from(&AgntConfig::default()))
    }

    pub fn agent_with(&self, provider: Arc<dyn Provider>, settings: AgentSettings) -> Agent {
        Agent::new(self.chats.clone(), self.tools(), provider, settings)
    }
}

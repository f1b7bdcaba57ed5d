//! Shared initialization logic for the CLI and embedding consumers.

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::agent::{spawn_worker, Agent, AgentEvent, AgentSettings, GenerationQueue};
use crate::config::{load_config, resolve_data_path, AgntConfig};
use crate::db::connection::db_path;
use crate::db::Store;
use crate::llm::{OpenAiProvider, Provider};
use crate::repository::{StoreChatRepository, StoreGraphRepository};
use crate::tools::ToolRegistry;

/// Application context holding the store, repositories and the agent.
pub struct AppContext {
    pub data_path: PathBuf,
    pub config: AgntConfig,
    pub store: Arc<Store>,
    pub chat_repo: Arc<StoreChatRepository>,
    pub graph_repo: Arc<StoreGraphRepository>,
    pub tools: Arc<ToolRegistry>,
    pub agent: Arc<Agent>,
}

impl AppContext {
    /// Initialize application context with the configured OpenAI-compatible provider.
    ///
    /// Data path priority: explicit path > AGNT_DATA_PATH env > ./.agnt (if exists) > ~/.agnt
    pub fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = resolve_data_path(explicit_path);
        tracing::info!("Using data path: {}", data_path.display());

        let config = load_config(&data_path);
        if config.api_key.is_none() {
            tracing::warn!("No API key configured (AGNT_API_KEY / OPENAI_API_KEY)");
        }
        let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(&config)?);
        Self::with_provider(data_path, config, provider)
    }

    /// Initialize against an explicit provider.
    pub fn with_provider(
        data_path: PathBuf,
        config: AgntConfig,
        provider: Arc<dyn Provider>,
    ) -> Result<Self> {
        let store = Arc::new(Store::open(&db_path(&data_path))?);

        let chat_repo = Arc::new(StoreChatRepository::new(store.clone()));
        let graph_repo = Arc::new(StoreGraphRepository::new(store.clone()));
        let tools = Arc::new(ToolRegistry::new(graph_repo.clone()));

        let agent = Arc::new(Agent::new(
            chat_repo.clone(),
            tools.clone(),
            provider,
            AgentSettings::from(&config),
        ));
        agent.recover_interrupted()?;

        Ok(Self {
            data_path,
            config,
            store,
            chat_repo,
            graph_repo,
            tools,
            agent,
        })
    }

    /// Start the generation worker.
    pub fn spawn_worker(
        &self,
        cancel: CancellationToken,
    ) -> (
        GenerationQueue,
        UnboundedReceiver<AgentEvent>,
        JoinHandle<()>,
    ) {
        spawn_worker(self.agent.clone(), self.config.queue_capacity, cancel)
    }
}

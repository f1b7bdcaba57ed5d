//! CLI interface for agnt.

pub mod handlers;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use output::OutputMode;

/// agnt - personal conversational agent over a typed property graph
#[derive(Parser)]
#[command(name = "agnt", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.agnt)
    #[arg(long, env = "AGNT_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List chat threads
    Chats,

    /// Create a chat thread
    New {
        /// Display name of the chat
        name: String,
    },

    /// Print a chat transcript
    Show {
        /// Chat ID
        chat_id: u64,
    },

    /// Send a message and stream the agent's answer
    Send {
        /// Chat ID
        chat_id: u64,
        /// Message text
        text: String,
    },

    /// Run a generation round on the existing history (e.g. after an interrupted tool call)
    Resume {
        /// Chat ID
        chat_id: u64,
    },

    /// Delete a chat thread and all of its messages
    Delete {
        /// Chat ID
        chat_id: u64,
    },

    /// List graph nodes and edges
    Graph {
        /// Only show nodes of this type
        #[arg(long = "type")]
        node_type: Option<String>,
    },
}

/// Execute a CLI command.
pub async fn execute(
    command: &Commands,
    ctx: &crate::init::AppContext,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Chats => handlers::chat::list_chats(ctx, mode)?,
        Commands::New { name } => handlers::chat::create_chat(ctx, name, mode)?,
        Commands::Show { chat_id } => handlers::chat::show_chat(ctx, *chat_id, mode)?,
        Commands::Send { chat_id, text } => {
            handlers::chat::run_generation(ctx, *chat_id, Some(text.as_str())).await?
        }
        Commands::Resume { chat_id } => handlers::chat::run_generation(ctx, *chat_id, None).await?,
        Commands::Delete { chat_id } => handlers::chat::delete_chat(ctx, *chat_id)?,
        Commands::Graph { node_type } => {
            handlers::graph::show_graph(ctx, node_type.as_deref(), mode)?
        }
    }
    Ok(())
}

//! agnt - personal conversational agent
//!
//! Usage:
//!   agnt new "groceries"         Create a chat
//!   agnt send 1 "remember Ada"   Send a message and stream the answer
//!   agnt show 1                  Print a transcript
//!   agnt graph                   List graph nodes and edges
//!   agnt --help                  Show all commands

use anyhow::Result;
use clap::Parser;

use agnt::cli::output::OutputMode;
use agnt::cli::Cli;
use agnt::init::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr so streamed answers on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("agnt=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);
    let ctx = AppContext::new(cli.data_path.clone())?;
    agnt::cli::execute(&cli.command, &ctx, mode).await?;

    Ok(())
}

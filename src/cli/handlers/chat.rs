//! Chat handlers for CLI.

use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::agent::AgentEvent;
use crate::cli::output::{
    output_json_list, print_header, print_message, print_success, print_table, OutputMode,
};
use crate::init::AppContext;
use crate::models::{Message, MessagePayload};
use crate::repository::ChatRepository;
use crate::AgntError;

/// Marker stored in the progress map once a tool message has been printed.
const PRINTED_TOOL: usize = usize::MAX;

pub fn list_chats(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    let chats = ctx.chat_repo.list_chats()?;

    if mode == OutputMode::Json {
        output_json_list(&chats);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = chats
        .iter()
        .map(|c| vec![c.id.to_string(), c.name.clone(), c.state.to_string()])
        .collect();
    print_table(&["ID", "Name", "State"], rows);
    Ok(())
}

pub fn create_chat(ctx: &AppContext, name: &str, mode: OutputMode) -> Result<()> {
    let chat = ctx.chat_repo.create_chat(name)?;
    if mode == OutputMode::Json {
        output_json_list(&[chat]);
    } else {
        print_success(&format!("Created chat {} '{}'", chat.id, chat.name));
    }
    Ok(())
}

pub fn show_chat(ctx: &AppContext, chat_id: u64, mode: OutputMode) -> Result<()> {
    let chat = ctx.chat_repo.get_chat(chat_id)?;
    let messages = ctx.chat_repo.list_messages(chat_id)?;

    if mode == OutputMode::Json {
        output_json_list(&messages);
        return Ok(());
    }

    print_header(&format!("{} ({})", chat.name, chat.state));
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

pub fn delete_chat(ctx: &AppContext, chat_id: u64) -> Result<()> {
    ctx.chat_repo.delete_chat(chat_id)?;
    print_success(&format!("Deleted chat {}", chat_id));
    Ok(())
}

/// Submit a round (optionally after a new user message) and stream it to stdout.
///
/// Ctrl-C cancels the round; the chat is left idle.
pub async fn run_generation(ctx: &AppContext, chat_id: u64, text: Option<&str>) -> Result<()> {
    let cancel = CancellationToken::new();
    let (queue, mut events, worker) = ctx.spawn_worker(cancel.clone());

    let interrupt = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling generation");
            interrupt.cancel();
        }
    });

    let submitted = match text {
        Some(text) => queue.submit_user_message(chat_id, text).map(|_| ()),
        None => queue.submit(chat_id),
    };

    let outcome = match submitted {
        Err(e) => Some(e),
        Ok(()) => {
            let mut printed = HashMap::new();
            let outcome = loop {
                match events.recv().await {
                    Some(AgentEvent::Progressed {
                        chat_id,
                        message_id,
                    }) => {
                        match ctx.chat_repo.get_message(chat_id, message_id) {
                            Ok(message) => render_progress(&message, &mut printed),
                            Err(e) => tracing::warn!("Failed to load message {}: {}", message_id, e),
                        }
                    }
                    Some(AgentEvent::Completed { error, .. }) => break error,
                    None => {
                        break Some(AgntError::QueueUnavailable(
                            "generation worker has stopped".to_string(),
                        ))
                    }
                }
            };
            if !printed.is_empty() {
                println!();
            }
            outcome
        }
    };

    cancel.cancel();
    signal.abort();
    worker.await?;

    match outcome {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Print whatever part of `message` has not been shown yet.
fn render_progress(message: &Message, printed: &mut HashMap<u64, usize>) {
    match &message.payload {
        MessagePayload::Agent { text } => {
            let seen = printed.entry(message.message_id).or_insert(0);
            if *seen == 0 {
                print!("{} ", "agent>".green().bold());
            }
            if let Some(fresh) = text.get(*seen..) {
                print!("{}", fresh);
                *seen = text.len();
            }
            let _ = std::io::stdout().flush();
        }
        MessagePayload::Tool(call) if call.done => {
            if printed.insert(message.message_id, PRINTED_TOOL) != Some(PRINTED_TOOL) {
                print_message(message);
            }
        }
        MessagePayload::Tool(_) | MessagePayload::User { .. } => {}
    }
}

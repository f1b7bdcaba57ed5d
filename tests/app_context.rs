//! Tests for application startup against a store shared with a live round.

mod common;

use std::time::Duration;

use agnt::agent::noop_progress;
use agnt::config::AgntConfig;
use agnt::init::AppContext;
use agnt::llm::ResponseDelta;
use agnt::models::{ChatState, Message};
use agnt::repository::ChatRepository;
use agnt::AgntError;
use common::provider::{ScriptedProvider, Step};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn open_context(dir: &TempDir, steps: Vec<Step>) -> AppContext {
    AppContext::with_provider(
        dir.path().to_path_buf(),
        AgntConfig::default(),
        ScriptedProvider::new(steps),
    )
    .expect("Failed to build app context")
}

async fn wait_for_state(ctx: &AppContext, chat_id: u64, state: ChatState) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while ctx.chat_repo.get_chat(chat_id).unwrap().state != state {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Chat should reach the expected state");
}

#[tokio::test]
async fn test_second_context_leaves_live_round_running() {
    let dir = TempDir::new().unwrap();
    let first = open_context(
        &dir,
        vec![Step::Stall(vec![ResponseDelta::text("thinking")])],
    );
    let chat_id = first.chat_repo.create_chat("c1").unwrap().id;
    first
        .chat_repo
        .create_message(Message::user(chat_id, "hello"))
        .unwrap();

    let cancel = CancellationToken::new();
    let round = {
        let agent = first.agent.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            agent
                .generate(chat_id, noop_progress().as_ref(), &cancel)
                .await
        })
    };
    wait_for_state(&first, chat_id, ChatState::Running).await;

    let second = open_context(&dir, vec![]);
    assert_eq!(
        second.chat_repo.get_chat(chat_id).unwrap().state,
        ChatState::Running
    );
    assert!(matches!(
        second.agent.send_user_message(chat_id, "interleaved"),
        Err(AgntError::Busy(_))
    ));
    assert!(matches!(
        second
            .agent
            .generate(chat_id, noop_progress().as_ref(), &CancellationToken::new())
            .await,
        Err(AgntError::Busy(_))
    ));

    cancel.cancel();
    let result = round.await.expect("Round task should not panic");
    assert!(matches!(result, Err(AgntError::Cancelled)));
    assert_eq!(
        second.chat_repo.get_chat(chat_id).unwrap().state,
        ChatState::Idle
    );
}

#[tokio::test]
async fn test_startup_resets_round_without_live_holder() {
    let dir = TempDir::new().unwrap();
    let chat_id = {
        let ctx = open_context(&dir, vec![]);
        let chat = ctx.chat_repo.create_chat("c1").unwrap();
        ctx.chat_repo
            .set_chat_state(chat.id, ChatState::Running)
            .unwrap();
        chat.id
    };

    let ctx = open_context(&dir, vec![]);
    assert_eq!(ctx.chat_repo.get_chat(chat_id).unwrap().state, ChatState::Idle);
    ctx.agent.send_user_message(chat_id, "hello").unwrap();
}

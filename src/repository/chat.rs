use std::sync::Arc;

use crate::db::schema::{message_partition, CHAT_PARTITION};
use crate::db::store::encode_id;
use crate::db::{ReadTx, Store, WriteTx};
use crate::models::{ChatState, ChatThread, Message};
use crate::AgntError;

/// Repository trait for chat threads and their messages.
pub trait ChatRepository: Send + Sync {
    fn list_chats(&self) -> Result<Vec<ChatThread>, AgntError>;
    fn get_chat(&self, id: u64) -> Result<ChatThread, AgntError>;
    /// Create an idle chat together with its (empty) message partition.
    fn create_chat(&self, name: &str) -> Result<ChatThread, AgntError>;
    /// Remove the chat and its whole message partition.
    fn delete_chat(&self, id: u64) -> Result<(), AgntError>;
    /// Overwrite the state unconditionally. Clears any round holder.
    fn set_chat_state(&self, id: u64, state: ChatState) -> Result<ChatThread, AgntError>;

    /// Mark an idle chat `running` on behalf of `owner`.
    ///
    /// Fails with [`AgntError::Busy`] when a round already holds the chat.
    fn begin_round(&self, id: u64, owner: u32) -> Result<ChatThread, AgntError>;

    /// Reset every `running` chat whose holder `is_alive` rejects.
    ///
    /// Returns the ids that were reset.
    fn reset_abandoned(&self, is_alive: &dyn Fn(u32) -> bool) -> Result<Vec<u64>, AgntError>;

    /// Update the state from its textual form (`"idle"` or `"running"`).
    fn update_chat_state(&self, id: u64, state: &str) -> Result<ChatThread, AgntError> {
        let state = state.parse::<ChatState>()?;
        self.set_chat_state(id, state)
    }

    /// Messages of a chat in ascending id order.
    fn list_messages(&self, chat_id: u64) -> Result<Vec<Message>, AgntError>;
    /// Persist a new message, assigning the next id from the chat's sequence.
    fn create_message(&self, message: Message) -> Result<Message, AgntError>;
    /// Like [`create_message`](Self::create_message), but fails with
    /// [`AgntError::Busy`] while the chat is `running`.
    fn create_message_when_idle(&self, message: Message) -> Result<Message, AgntError>;
    fn get_message(&self, chat_id: u64, message_id: u64) -> Result<Message, AgntError>;
    /// Overwrite an existing message in place.
    fn update_message(&self, message: &Message) -> Result<(), AgntError>;
    fn delete_message(&self, chat_id: u64, message_id: u64) -> Result<(), AgntError>;
}

/// Chat repository backed by the chat index and per-chat message partitions.
pub struct StoreChatRepository {
    store: Arc<Store>,
}

impl StoreChatRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

fn chat_not_found(id: u64) -> AgntError {
    AgntError::NotFound {
        entity_type: "chat",
        id,
    }
}

fn message_not_found(id: u64) -> AgntError {
    AgntError::NotFound {
        entity_type: "message",
        id,
    }
}

fn load_chat(tx: &ReadTx<'_>, id: u64) -> Result<ChatThread, AgntError> {
    tx.get_record(CHAT_PARTITION, id)?
        .ok_or_else(|| chat_not_found(id))
}

fn insert_message(tx: &mut WriteTx<'_>, mut message: Message) -> Result<Message, AgntError> {
    let partition = messages_of(tx, message.chat_id)?;
    message.message_id = tx.next_sequence(&partition)?;
    tx.put_record(&partition, message.message_id, &message)?;
    Ok(message)
}

/// Resolve a chat's message partition, failing when the chat is gone.
fn messages_of(tx: &ReadTx<'_>, chat_id: u64) -> Result<String, AgntError> {
    let partition = message_partition(chat_id);
    if tx.partition_exists(&partition)? {
        Ok(partition)
    } else {
        Err(chat_not_found(chat_id))
    }
}

impl ChatRepository for StoreChatRepository {
    fn list_chats(&self) -> Result<Vec<ChatThread>, AgntError> {
        self.store.read(|tx| tx.scan_records(CHAT_PARTITION))
    }

    fn get_chat(&self, id: u64) -> Result<ChatThread, AgntError> {
        self.store.read(|tx| load_chat(tx, id))
    }

    fn create_chat(&self, name: &str) -> Result<ChatThread, AgntError> {
        let chat = self.store.write(|tx| {
            let chat = ChatThread {
                id: tx.next_sequence(CHAT_PARTITION)?,
                name: name.to_string(),
                state: ChatState::Idle,
                owner: None,
            };
            tx.put_record(CHAT_PARTITION, chat.id, &chat)?;
            tx.create_partition(&message_partition(chat.id))?;
            Ok(chat)
        })?;
        tracing::info!(chat_id = chat.id, "Created chat '{}'", chat.name);
        Ok(chat)
    }

    fn delete_chat(&self, id: u64) -> Result<(), AgntError> {
        self.store.write(|tx| {
            if !tx.delete_record(CHAT_PARTITION, id)? {
                return Err(chat_not_found(id));
            }
            tx.drop_partition(&message_partition(id))?;
            Ok(())
        })?;
        tracing::info!(chat_id = id, "Deleted chat");
        Ok(())
    }

    fn set_chat_state(&self, id: u64, state: ChatState) -> Result<ChatThread, AgntError> {
        self.store.write(|tx| {
            let mut chat = load_chat(tx, id)?;
            chat.state = state;
            chat.owner = None;
            tx.put_record(CHAT_PARTITION, id, &chat)?;
            Ok(chat)
        })
    }

    fn begin_round(&self, id: u64, owner: u32) -> Result<ChatThread, AgntError> {
        self.store.write(|tx| {
            let mut chat = load_chat(tx, id)?;
            if chat.is_running() {
                return Err(AgntError::Busy(id));
            }
            chat.state = ChatState::Running;
            chat.owner = Some(owner);
            tx.put_record(CHAT_PARTITION, id, &chat)?;
            Ok(chat)
        })
    }

    fn reset_abandoned(&self, is_alive: &dyn Fn(u32) -> bool) -> Result<Vec<u64>, AgntError> {
        self.store.write(|tx| {
            let chats: Vec<ChatThread> = tx.scan_records(CHAT_PARTITION)?;
            let mut reset = Vec::new();
            for mut chat in chats {
                if !chat.is_abandoned(is_alive) {
                    continue;
                }
                chat.state = ChatState::Idle;
                chat.owner = None;
                tx.put_record(CHAT_PARTITION, chat.id, &chat)?;
                reset.push(chat.id);
            }
            Ok(reset)
        })
    }

    fn list_messages(&self, chat_id: u64) -> Result<Vec<Message>, AgntError> {
        self.store.read(|tx| {
            let partition = messages_of(tx, chat_id)?;
            tx.scan_records(&partition)
        })
    }

    fn create_message(&self, message: Message) -> Result<Message, AgntError> {
        self.store.write(|tx| insert_message(tx, message))
    }

    fn create_message_when_idle(&self, message: Message) -> Result<Message, AgntError> {
        self.store.write(|tx| {
            if load_chat(tx, message.chat_id)?.is_running() {
                return Err(AgntError::Busy(message.chat_id));
            }
            insert_message(tx, message)
        })
    }

    fn get_message(&self, chat_id: u64, message_id: u64) -> Result<Message, AgntError> {
        self.store.read(|tx| {
            let partition = messages_of(tx, chat_id)?;
            tx.get_record(&partition, message_id)?
                .ok_or_else(|| message_not_found(message_id))
        })
    }

    fn update_message(&self, message: &Message) -> Result<(), AgntError> {
        self.store.write(|tx| {
            let partition = messages_of(tx, message.chat_id)?;
            if tx.get(&partition, &encode_id(message.message_id))?.is_none() {
                return Err(message_not_found(message.message_id));
            }
            tx.put_record(&partition, message.message_id, message)
        })
    }

    fn delete_message(&self, chat_id: u64, message_id: u64) -> Result<(), AgntError> {
        self.store.write(|tx| {
            let partition = messages_of(tx, chat_id)?;
            tx.delete_record(&partition, message_id)?;
            Ok(())
        })
    }
}

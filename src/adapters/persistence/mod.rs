//! Persistence adapters. Repositories, conversation state, log import.

pub mod conversation_state;
pub mod jsonl_import;
pub mod memory_repo;
pub mod sqlite_repo;

pub use conversation_state::InMemoryConversationState;
pub use jsonl_import::{ImportStats, import_jsonl};
pub use memory_repo::MemoryRepo;
pub use sqlite_repo::SqliteRepo;

//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-memory storage for tests and development
//! - `postgres` - PostgreSQL storage
//! - `console` - JSON-lines transport over stdin/stdout

pub mod console;
pub mod memory;
pub mod postgres;

pub use console::ConsoleTransport;
pub use memory::{
    InMemoryConversationStore, InMemoryDatabase, InMemoryPersistenceGateway,
    InMemoryRecordReader, InMemoryUserDirectory,
};
pub use postgres::{
    PostgresConversationStore, PostgresPersistenceGateway, PostgresRecordReader,
    PostgresUserDirectory,
};

//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresConversationStore` - In-progress conversations
//! - `PostgresPersistenceGateway` - Transactional record commit
//! - `PostgresRecordReader` - Paginated record queries
//! - `PostgresUserDirectory` - Bot user registry
//!
//! Schema lives in `migrations/`.

mod conversation_store;
mod errors;
mod persistence_gateway;
mod record_reader;
mod user_directory;

pub use conversation_store::PostgresConversationStore;
pub use persistence_gateway::PostgresPersistenceGateway;
pub use record_reader::PostgresRecordReader;
pub use user_directory::PostgresUserDirectory;

/// Embedded migrations from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

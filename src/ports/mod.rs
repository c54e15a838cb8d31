//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `ConversationStore` - In-progress dialogue state per (chat, user)
//! - `PersistenceGateway` - Atomic commit of completed dialogues
//! - `UserDirectory` - Registered bot users
//! - `RecordReader` - Paginated reads of committed records
//!
//! ## Messaging Ports
//!
//! - `Transport` - Inbound chat messages and outbound replies

mod conversation_store;
mod persistence_gateway;
mod record_reader;
mod transport;
mod user_directory;

pub use conversation_store::{ConversationStore, StoreError};
pub use persistence_gateway::{PersistenceError, PersistenceGateway};
pub use record_reader::RecordReader;
pub use transport::{InboundMessage, OutboundReply, Transport, TransportError};
pub use user_directory::UserDirectory;

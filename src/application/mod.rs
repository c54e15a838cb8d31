//! Application layer - routing messages through the dialogue engine.
//!
//! The router orchestrates domain operations and coordinates between ports.
//! The dispatcher feeds it from a transport; the sweeper runs beside both
//! as a background service.

mod dispatcher;
mod keyed_locks;
mod retry;
mod router;
mod sweeper;

pub use dispatcher::serve;
pub use keyed_locks::KeyedLocks;
pub use retry::RetryPolicy;
pub use router::{MessageRouter, RouterConfig, RouterError, RouterPorts};
pub use sweeper::{StalenessSweeper, SweeperConfig};

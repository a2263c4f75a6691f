//! The session supervisor and manager (C6/C7): spawns vendor CLIs over `tokio::process`,
//! streams normalized events to subscribers, and retires terminated sessions on a timer.
//!
//! Everything below the manager's creation gate is infallible from a caller's perspective: a
//! session handle always runs to a `session.end` event, whether the underlying process
//! completed, crashed, or was killed (§7).

pub mod config;
pub mod error;
pub mod manager;
pub mod ring_buffer;
pub mod supervisor;

pub use error::ManagerError;
pub use manager::Manager;
pub use ring_buffer::RingBuffer;
pub use supervisor::{CliSession, SessionStatus};

//! Vendor provider implementations for the freshell supervisor (C2–C5).
//!
//! Every public operation here is infallible by design: parsing and normalization skip
//! malformed input rather than surface errors, since a single bad transcript line must never
//! take down a session the supervisor is otherwise streaming correctly.

pub mod claude;
pub mod codex;
mod gitinfo;
pub mod registry;
pub mod title;
pub mod traits;

pub use registry::Registry;
pub use traits::Provider;

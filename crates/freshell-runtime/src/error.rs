//! The manager's synchronous error surface (§7).
//!
//! Everything below the manager's gate — spawn, parse, normalize — reports through the
//! event stream instead (a `session.end` payload, or nothing at all for a swallowed parse
//! failure); a session handle, once returned, never yields a Rust `Result` error to its
//! caller. `ManagerError` exists only for the two conditions that prevent a session from
//! being created at all.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// `create()` named a provider identity the registry doesn't have.
    ProviderUnknown(String),
    /// The requested provider exists but lacks the capability the request needs.
    CapabilityUnsupported { provider: String, capability: &'static str },
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::ProviderUnknown(name) => write!(f, "unknown provider: {name}"),
            ManagerError::CapabilityUnsupported { provider, capability } => {
                write!(f, "provider {provider} does not support {capability}")
            }
        }
    }
}

impl std::error::Error for ManagerError {}

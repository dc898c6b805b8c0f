//! Error types for the Rolecast domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Note that "no platform matched" and "input never appeared" are not errors
//! inside the injection engine: it treats them as normal inert states. Only
//! callers that asked for a specific outcome (the CLI) report them.

use thiserror::Error;

/// The top-level error type for all Rolecast operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Storage errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No role with id '{id}'")]
    RoleNotFound { id: String },

    // --- Host page errors ---
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("{url} is not a supported chat platform")]
    UnsupportedPage { url: String },

    // --- Cross-context messaging ---
    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage read failed: {0}")]
    Read(String),

    #[error("Storage write failed: {0}")]
    Write(String),

    #[error("Invalid role: {0}")]
    Validation(String),

    #[error("Stored data is malformed: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Element {0} is no longer attached to the document")]
    ElementDetached(u64),

    #[error("Element {0} does not accept text input")]
    NotEditable(u64),
}

#[derive(Debug, Clone, Error)]
pub enum MessagingError {
    #[error("Message channel closed")]
    Closed,

    #[error("No response within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leadflow engine.

use thiserror::Error;

/// The primary error type used across all Leadflow adapter traits and core operations.
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// LLM provider errors (API failure, malformed stream, model not found).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Broadcast transport errors (channel closed, serialization).
    #[error("broadcast error: {message}")]
    Broadcast {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A lead identifier supplied by the caller is not a valid id.
    #[error("invalid lead id: {0}")]
    InvalidLeadId(String),

    /// A lead identifier was supplied but does not resolve to a stored lead.
    #[error("lead not found: {0}")]
    LeadNotFound(String),

    /// A new-conversation request arrived without the required email.
    #[error("email is required to start a new conversation")]
    MissingEmail,

    /// Another turn is already streaming against the same lead.
    #[error("a turn is already in progress for lead {0}")]
    TurnInProgress(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

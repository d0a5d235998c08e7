//! Domain error types
//!
//! This module defines the error hierarchy for Custodia. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Custodia error type
///
/// This is the primary error type used throughout the library.
/// It wraps specific failure classes and provides context for error handling.
#[derive(Debug, Error)]
pub enum CustodiaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A key was not found, or is revoked and unusable
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Authenticated decryption failed (integrity tag mismatch)
    ///
    /// Raised whenever ciphertext fails authentication. Corrupted plaintext
    /// is never returned to the caller.
    #[error("Authentication failure: {0}")]
    AuthenticationFailure(String),

    /// Malformed envelope, record, or persisted blob
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A rights request cannot be fulfilled (e.g. erasure blocked by a legal hold)
    #[error("Request not applicable: {0}")]
    RequestNotApplicable(String),

    /// A compliance deadline has passed (informational; no notification is sent)
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// An anonymization strategy name is unknown or its parameters are invalid
    #[error("Unsupported strategy: {0}")]
    UnsupportedStrategy(String),

    /// Durable store read/write failures
    #[error("Storage error: {0}")]
    Storage(String),

    /// Low-level cryptographic failures other than tag mismatch
    /// (key derivation, nonce generation, invalid key length)
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for CustodiaError {
    fn from(err: std::io::Error) -> Self {
        CustodiaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for CustodiaError {
    fn from(err: serde_json::Error) -> Self {
        CustodiaError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for CustodiaError {
    fn from(err: toml::de::Error) -> Self {
        CustodiaError::Configuration(format!("TOML parse error: {err}"))
    }
}

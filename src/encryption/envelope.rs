//! Encrypted envelope format
//!
//! A self-describing wrapper for an encrypted value:
//!
//! ```json
//! {
//!   "encrypted": true,
//!   "key_category": "health",
//!   "algorithm": "aes-256-gcm",
//!   "compressed": false,
//!   "timestamp": "2026-08-27T12:00:00Z",
//!   "payload": "base64(nonce ‖ ciphertext+tag)"
//! }
//! ```
//!
//! The metadata fields are retained even when redundant today so envelopes
//! written by older versions stay forward-readable.

use crate::domain::{CustodiaError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Algorithm identifier recorded in every envelope
pub const ALGORITHM: &str = "aes-256-gcm";

/// Self-describing encrypted-value wrapper
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncryptedEnvelope {
    /// Discriminator; always `true`
    pub encrypted: bool,

    /// Category whose key sealed this payload
    pub key_category: String,

    /// AEAD algorithm identifier
    pub algorithm: String,

    /// Whether the plaintext was deflate-compressed before sealing
    pub compressed: bool,

    /// When the envelope was built
    pub timestamp: DateTime<Utc>,

    /// base64 of `nonce ‖ ciphertext+tag`
    pub payload: String,
}

impl EncryptedEnvelope {
    /// Assemble an envelope around sealed bytes
    pub fn new(key_category: String, compressed: bool, sealed: &[u8]) -> Self {
        Self {
            encrypted: true,
            key_category,
            algorithm: ALGORITHM.to_string(),
            compressed,
            timestamp: Utc::now(),
            payload: BASE64.encode(sealed),
        }
    }

    /// Decode the payload back to `nonce ‖ ciphertext+tag`
    pub fn sealed_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.payload)
            .map_err(|e| CustodiaError::Serialization(format!("invalid envelope payload: {e}")))
    }

    /// Cheap structural test: is this JSON value an envelope?
    pub fn is_envelope(value: &Value) -> bool {
        value
            .as_object()
            .map(|obj| {
                obj.get("encrypted").and_then(Value::as_bool) == Some(true)
                    && obj.contains_key("payload")
                    && obj.contains_key("key_category")
            })
            .unwrap_or(false)
    }

    /// Parse a JSON value into an envelope
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::Serialization`] when the value looks like an
    /// envelope but is malformed.
    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| CustodiaError::Serialization(format!("malformed envelope: {e}")))
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| CustodiaError::Serialization(format!("envelope serialization: {e}")))
    }
}

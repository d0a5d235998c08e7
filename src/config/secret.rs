//! Secure credential handling using the secrecy crate
//!
//! This module provides type aliases and utilities for handling the session
//! root secret and other sensitive credentials in memory. It uses the
//! `secrecy` crate which automatically zeros memory when secrets are dropped,
//! preventing exposure in memory dumps or crash reports.
//!
//! # Security Features
//!
//! - **Automatic Zeroization**: Memory is zeroed when `Secret<T>` is dropped
//! - **Debug Protection**: Custom Debug implementation prevents logging
//! - **Explicit Access**: Must call `expose_secret()` to access the value
//!
//! # Example
//!
//! ```rust
//! use custodia::config::secret_string;
//! use secrecy::ExposeSecret;
//!
//! let root = secret_string("session-root-secret");
//!
//! // Access the secret (only when needed)
//! let root_bytes = root.expose_secret().as_bytes();
//!
//! // Debug output is redacted
//! println!("{:?}", root); // Prints: Secret([REDACTED])
//! ```

use secrecy::{DebugSecret, Secret};
use zeroize::Zeroize;

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretValue(String);

impl DebugSecret for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        SecretValue(s)
    }
}

impl PartialEq<str> for SecretValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl SecretValue {
    /// Byte view of the secret, for key derivation
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Type alias for a secret string
///
/// This wraps a `SecretValue` in a `Secret` container that:
/// - Zeros the memory when dropped
/// - Prevents accidental logging via Debug
/// - Requires explicit `expose_secret()` to access
pub type SecretString = Secret<SecretValue>;

/// Helper function to create a SecretString
///
/// # Example
///
/// ```rust
/// use custodia::config::secret_string;
///
/// let root = secret_string("session-root-secret");
/// ```
#[inline]
pub fn secret_string(value: impl Into<String>) -> SecretString {
    Secret::new(SecretValue::from(value.into()))
}

/// Helper function to create an optional SecretString from an optional String
#[inline]
pub fn secret_string_opt(value: Option<String>) -> Option<SecretString> {
    value.map(|s| Secret::new(SecretValue::from(s)))
}

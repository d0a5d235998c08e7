//! Field-level encryption
//!
//! This module provides the [`FieldEncryptionEngine`] that protects
//! sensitive fields in JSON records before persistence and restores them on
//! load.
//!
//! # Architecture
//!
//! The engine coordinates three pieces:
//! - **Field rules**: one explicit predicate table deciding which fields are
//!   sensitive and under which category key they are sealed
//! - **Envelopes**: self-describing encrypted-value wrappers
//! - **Key manager**: the injected [`crate::keys::KeyManager`] holding all
//!   key material
//!
//! Integrity hashing ([`integrity`]) is independent of the encryption
//! channel and usable on plaintext records.

pub mod engine;
pub mod envelope;
pub mod fields;
pub mod integrity;

pub use engine::FieldEncryptionEngine;
pub use envelope::EncryptedEnvelope;
pub use fields::SensitiveFieldRules;
pub use integrity::{generate_data_hash, verify_data_hash};

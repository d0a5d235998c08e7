//! Storage abstraction traits
//!
//! This module defines the trait that durable blob stores must implement.
//! Custodia persists three independent blobs through this seam: the
//! encrypted key material, the audit history, and the compliance records.

use crate::domain::Result;
use async_trait::async_trait;

/// Durable blob store
///
/// Implementations must make `put` atomic with respect to concurrent `get`
/// calls: a reader never observes a half-written blob. The file-backed
/// implementation achieves this with write-to-temp-then-rename.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a named blob, `None` if it has never been written
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace a named blob
    async fn put(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Whether the named blob exists
    async fn exists(&self, name: &str) -> Result<bool>;
}

/// Well-known blob names used by the engines
pub mod blob_names {
    /// Encrypted category key material (sealed with the root key)
    pub const KEY_MATERIAL: &str = "keys.blob";
    /// Root-key derivation salt (not secret)
    pub const KEY_SALT: &str = "keys.salt";
    /// Bounded audit history and cumulative vulnerability list
    pub const AUDIT_HISTORY: &str = "audit-history.json";
    /// Data subjects, rights requests, and breach records
    pub const COMPLIANCE_RECORDS: &str = "compliance-records.json";
}

//! Key material and metadata types

use crate::domain::DataCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A symmetric key scoped to one data category
///
/// Key material is zeroed on drop. Keys are never deleted: rotation retains
/// the previous material for a rollback window, revocation flags the key
/// unusable but keeps the record.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CategoryKey {
    /// Stable identifier for this key record
    #[zeroize(skip)]
    pub id: Uuid,

    /// Data category this key protects
    #[zeroize(skip)]
    pub category: DataCategory,

    /// Current 32-byte key material
    pub material: Vec<u8>,

    /// Previous key material, retained after rotation for rollback decryption
    pub previous_material: Option<Vec<u8>>,

    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,

    /// Number of completed rotations
    #[zeroize(skip)]
    pub rotation_count: u32,

    /// A revoked key refuses all operations
    #[zeroize(skip)]
    pub revoked: bool,

    #[zeroize(skip)]
    pub revocation_reason: Option<String>,
}

// Key material must never reach logs.
impl std::fmt::Debug for CategoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryKey")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("material", &"[REDACTED]")
            .field("rotation_count", &self.rotation_count)
            .field("revoked", &self.revoked)
            .finish()
    }
}

impl CategoryKey {
    /// Create a fresh key for a category
    pub fn new(category: DataCategory, material: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            material,
            previous_material: None,
            created_at: Utc::now(),
            rotation_count: 0,
            revoked: false,
            revocation_reason: None,
        }
    }

    /// Non-secret view of this key
    pub fn metadata(&self) -> KeyMetadata {
        KeyMetadata {
            id: self.id,
            category: self.category.clone(),
            created_at: self.created_at,
            rotation_count: self.rotation_count,
            revoked: self.revoked,
            has_previous: self.previous_material.is_some(),
        }
    }
}

/// Non-secret metadata about a category key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMetadata {
    pub id: Uuid,
    pub category: DataCategory,
    pub created_at: DateTime<Utc>,
    pub rotation_count: u32,
    pub revoked: bool,
    pub has_previous: bool,
}

/// Aggregate key-store statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyStats {
    pub total_keys: usize,
    pub active_keys: usize,
    pub revoked_keys: usize,
    pub total_rotations: u64,
}

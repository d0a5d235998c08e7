//! Key management
//!
//! Per-category symmetric keys sealed at rest under a session-derived root
//! key. See [`KeyManager`] for the lifecycle (create, rotate, revoke) and
//! the containment-over-recoverability stance on the root secret.

pub mod aead;
pub mod manager;
pub mod material;

pub use manager::KeyManager;
pub use material::{CategoryKey, KeyMetadata, KeyStats};

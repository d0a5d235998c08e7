//! Security-level profiles
//!
//! Each [`SecurityLevel`] maps to a fixed per-engine parameter set. The
//! table trades cost for strictness: higher levels derive keys with more
//! Argon2 work, demand larger anonymity groups, inject more noise, and
//! retain a deeper audit history.

use crate::anonymization::strategies::MaskLevel;
use crate::config::schema::{CustodiaConfig, SecurityLevel};

/// Per-engine parameters derived from a security level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecurityProfile {
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    /// k-anonymity group-size floor
    pub k: usize,
    /// l-diversity distinct-value floor
    pub l: usize,
    /// Differential-privacy ε (smaller is noisier)
    pub epsilon: f64,
    pub audit_history_limit: usize,
    pub compression_enabled: bool,
    pub mask_level: MaskLevel,
}

impl SecurityProfile {
    /// The fixed level → parameter table
    pub fn for_level(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::Low => Self {
                argon2_memory_kib: 32 * 1024,
                argon2_iterations: 2,
                k: 2,
                l: 1,
                epsilon: 2.0,
                audit_history_limit: 20,
                compression_enabled: false,
                mask_level: MaskLevel::Partial,
            },
            SecurityLevel::Medium => Self {
                argon2_memory_kib: 64 * 1024,
                argon2_iterations: 3,
                k: 3,
                l: 2,
                epsilon: 1.0,
                audit_history_limit: 50,
                compression_enabled: true,
                mask_level: MaskLevel::Partial,
            },
            SecurityLevel::High => Self {
                argon2_memory_kib: 128 * 1024,
                argon2_iterations: 4,
                k: 5,
                l: 2,
                epsilon: 0.5,
                audit_history_limit: 100,
                compression_enabled: true,
                mask_level: MaskLevel::Full,
            },
            SecurityLevel::Maximum => Self {
                argon2_memory_kib: 256 * 1024,
                argon2_iterations: 5,
                k: 10,
                l: 3,
                epsilon: 0.1,
                audit_history_limit: 200,
                compression_enabled: true,
                mask_level: MaskLevel::Full,
            },
        }
    }

    /// Overwrite the profile-governed fields of a configuration
    pub fn apply(&self, config: &mut CustodiaConfig) {
        config.keys.argon2_memory_kib = self.argon2_memory_kib;
        config.keys.argon2_iterations = self.argon2_iterations;
        config.anonymization.k = self.k;
        config.anonymization.l = self.l;
        config.anonymization.epsilon = self.epsilon;
        config.audit.history_limit = self.audit_history_limit;
        config.encryption.compression_enabled = self.compression_enabled;
    }
}

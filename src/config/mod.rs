//! Configuration management for Custodia.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Custodia uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `CUSTODIA_*` environment overrides
//! - Default values for every setting
//! - Comprehensive validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use custodia::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("custodia.toml")?;
//! println!("Audit history limit: {}", config.audit.history_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! security_level = "high"
//!
//! [keys]
//! store_dir = "./custodia-state"
//!
//! [encryption]
//! compression_enabled = true
//!
//! [audit]
//! history_limit = 50
//!
//! [logging]
//! log_level = "info"
//! file_enabled = true
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    AuditConfig, CustodiaConfig, EncryptionConfig, KeysConfig, LoggingConfig, OrchestratorConfig,
    RiskThresholds, SecurityLevel, SensitiveFieldEntry, WorkflowConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};

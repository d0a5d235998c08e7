// Custodia - Data Protection & Compliance Subsystem
// Copyright (c) 2026 Custodia Contributors
// Licensed under the MIT License

//! # Custodia - Data Protection & Compliance
//!
//! Custodia is an embeddable data-protection subsystem for services that
//! handle personal and health data: field-level encryption, statistical
//! anonymization, security auditing, and regulatory compliance workflows
//! behind one orchestrated surface.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Protecting** sensitive record fields with AES-256-GCM envelopes and
//!   per-category keys
//! - **Anonymizing** records and datasets with per-field strategies,
//!   k-anonymity, l-diversity, and differential privacy
//! - **Auditing** the runtime security posture with a deterministic check
//!   battery and compliance-framework scoring
//! - **Handling** data-subject rights requests and breach reporting with
//!   regulatory deadlines
//!
//! ## Architecture
//!
//! Custodia follows a layered architecture:
//!
//! - [`domain`] - Shared error taxonomy and core types
//! - [`config`] - TOML configuration with env overrides and secret handling
//! - [`logging`] - Structured logging and observability
//! - [`storage`] - Durable blob persistence behind an async trait
//! - [`keys`] - Category key lifecycle under a session-derived root key
//! - [`encryption`] - Field-level encryption engine
//! - [`anonymization`] - Statistical anonymization engine
//! - [`audit`] - Security audit engine
//! - [`workflow`] - Compliance workflow engine
//! - [`orchestrator`] - Cross-engine coordination, events, and scheduling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use custodia::config::{secret_string, KeysConfig, EncryptionConfig};
//! use custodia::domain::DataCategory;
//! use custodia::encryption::FieldEncryptionEngine;
//! use custodia::keys::KeyManager;
//! use custodia::storage::FileBlobStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileBlobStore::new("./custodia-state").await?);
//!     let keys = Arc::new(KeyManager::new(store, KeysConfig::default()));
//!     keys.initialize(&secret_string(&std::env::var("CUSTODIA_ROOT_SECRET")?))
//!         .await?;
//!
//!     let engine = FieldEncryptionEngine::new(keys, EncryptionConfig::default())?;
//!     let record = json!({"name": "Jane Doe", "ssn": "123-45-6789", "steps": 900});
//!
//!     let protected = engine
//!         .encrypt_sensitive_fields(&record, &DataCategory::Personal)
//!         .await?;
//!     let restored = engine.decrypt_sensitive_fields(&protected).await?;
//!     assert_eq!(restored, record);
//!     Ok(())
//! }
//! ```

pub mod anonymization;
pub mod audit;
pub mod config;
pub mod domain;
pub mod encryption;
pub mod keys;
pub mod logging;
pub mod orchestrator;
pub mod storage;
pub mod workflow;

//! Configuration schema types
//!
//! This module defines the configuration structure for Custodia. The root
//! [`CustodiaConfig`] maps to a TOML file with one section per engine.

use crate::anonymization::config::AnonymizationConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overall security posture selected by the embedding application
///
/// The orchestrator maps this to concrete per-engine parameters; see
/// [`crate::orchestrator::profile::SecurityProfile`] for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

/// Main Custodia configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustodiaConfig {
    /// Overall security level; the orchestrator derives engine defaults from it
    #[serde(default)]
    pub security_level: SecurityLevel,

    /// Key management settings
    #[serde(default)]
    pub keys: KeysConfig,

    /// Field encryption settings
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Anonymization settings
    #[serde(default)]
    pub anonymization: AnonymizationConfig,

    /// Security audit settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Compliance workflow settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Orchestrator scheduling settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CustodiaConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.keys.validate()?;
        self.encryption.validate()?;
        self.anonymization.validate().map_err(|e| e.to_string())?;
        self.audit.validate()?;
        self.workflow.validate()?;
        self.orchestrator.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Key management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Directory holding the encrypted key blob and derivation salt
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Argon2id memory cost in KiB for root-key derivation
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2id iteration count
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./custodia-state")
}

fn default_argon2_memory_kib() -> u32 {
    65536
}

fn default_argon2_iterations() -> u32 {
    3
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
        }
    }
}

impl KeysConfig {
    fn validate(&self) -> Result<(), String> {
        if self.argon2_memory_kib < 8192 {
            return Err("keys.argon2_memory_kib must be at least 8192 (8 MiB)".to_string());
        }
        if self.argon2_iterations == 0 {
            return Err("keys.argon2_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Field encryption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Compress plaintext before sealing when it exceeds the threshold
    #[serde(default = "default_true")]
    pub compression_enabled: bool,

    /// Minimum plaintext size in bytes before compression is attempted
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: usize,

    /// Additional exact field names treated as sensitive, mapped to a category label
    #[serde(default)]
    pub extra_sensitive_fields: Vec<SensitiveFieldEntry>,

    /// Additional regex patterns treated as sensitive, mapped to a category label
    #[serde(default)]
    pub extra_sensitive_patterns: Vec<SensitiveFieldEntry>,
}

/// A configured sensitive-field rule entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitiveFieldEntry {
    /// Exact field name or regex pattern, depending on the list it sits in
    pub matcher: String,
    /// Category label (see [`crate::domain::DataCategory::from_label`])
    pub category: String,
}

fn default_true() -> bool {
    true
}

fn default_compression_threshold() -> usize {
    256
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            compression_enabled: default_true(),
            compression_threshold: default_compression_threshold(),
            extra_sensitive_fields: Vec::new(),
            extra_sensitive_patterns: Vec::new(),
        }
    }
}

impl EncryptionConfig {
    fn validate(&self) -> Result<(), String> {
        for entry in &self.extra_sensitive_patterns {
            regex::Regex::new(&entry.matcher).map_err(|e| {
                format!(
                    "encryption.extra_sensitive_patterns: invalid regex '{}': {}",
                    entry.matcher, e
                )
            })?;
        }
        Ok(())
    }
}

/// Security audit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Number of audit results retained in the rolling history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Risk thresholds: overall score at or above each bound maps to the level
    #[serde(default)]
    pub risk_thresholds: RiskThresholds,
}

/// Score boundaries for risk classification
///
/// `score >= very_low` → very-low risk, `score >= low` → low, and so on;
/// anything below `high` is critical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub very_low: f64,
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            very_low: 90.0,
            low: 75.0,
            medium: 60.0,
            high: 40.0,
        }
    }
}

fn default_history_limit() -> usize {
    50
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            risk_thresholds: RiskThresholds::default(),
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.history_limit == 0 {
            return Err("audit.history_limit must be at least 1".to_string());
        }
        let t = &self.risk_thresholds;
        if !(t.very_low > t.low && t.low > t.medium && t.medium > t.high) {
            return Err(
                "audit.risk_thresholds must be strictly decreasing (very_low > low > medium > high)"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// Compliance workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Days allowed to respond to a rights request
    #[serde(default = "default_response_days")]
    pub response_deadline_days: i64,

    /// Hours allowed to notify authorities of a breach
    #[serde(default = "default_notification_hours")]
    pub breach_notification_hours: i64,

    /// Default retention period in days used by the retention compliance check
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_response_days() -> i64 {
    30
}

fn default_notification_hours() -> i64 {
    72
}

fn default_retention_days() -> i64 {
    730
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            response_deadline_days: default_response_days(),
            breach_notification_hours: default_notification_hours(),
            retention_days: default_retention_days(),
        }
    }
}

impl WorkflowConfig {
    fn validate(&self) -> Result<(), String> {
        if self.response_deadline_days <= 0 {
            return Err("workflow.response_deadline_days must be positive".to_string());
        }
        if self.breach_notification_hours <= 0 {
            return Err("workflow.breach_notification_hours must be positive".to_string());
        }
        Ok(())
    }
}

/// Orchestrator scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Interval between health checks, in seconds
    #[serde(default = "default_health_check_secs")]
    pub health_check_interval_secs: u64,

    /// Interval between full security audits, in seconds
    #[serde(default = "default_full_audit_secs")]
    pub full_audit_interval_secs: u64,

    /// Interval between compliance reviews, in seconds
    #[serde(default = "default_compliance_review_secs")]
    pub compliance_review_interval_secs: u64,
}

fn default_health_check_secs() -> u64 {
    300
}

fn default_full_audit_secs() -> u64 {
    7 * 24 * 3600
}

fn default_compliance_review_secs() -> u64 {
    30 * 24 * 3600
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            health_check_interval_secs: default_health_check_secs(),
            full_audit_interval_secs: default_full_audit_secs(),
            compliance_review_interval_secs: default_compliance_review_secs(),
        }
    }
}

impl OrchestratorConfig {
    fn validate(&self) -> Result<(), String> {
        if self.health_check_interval_secs == 0
            || self.full_audit_interval_secs == 0
            || self.compliance_review_interval_secs == 0
        {
            return Err("orchestrator intervals must be positive".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable local file logging
    #[serde(default)]
    pub file_enabled: bool,

    /// Local log file directory
    #[serde(default = "default_log_dir")]
    pub file_dir: String,

    /// Log rotation strategy (hourly, daily, never)
    #[serde(default = "default_rotation")]
    pub file_rotation: String,

    /// Emit JSON-formatted log lines to the file layer
    #[serde(default = "default_true")]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "./logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            file_enabled: false,
            file_dir: default_log_dir(),
            file_rotation: default_rotation(),
            json_format: default_true(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(format!("logging.log_level: unknown level '{other}'")),
        }
        match self.file_rotation.as_str() {
            "hourly" | "daily" | "never" => Ok(()),
            other => Err(format!("logging.file_rotation: unknown strategy '{other}'")),
        }
    }
}

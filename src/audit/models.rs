//! Audit result models

use crate::domain::{RiskLevel, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of audited categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditCategory {
    Authentication,
    Authorization,
    Encryption,
    DataProtection,
    NetworkSecurity,
    InputValidation,
    SessionManagement,
    ErrorHandling,
    LoggingMonitoring,
}

impl AuditCategory {
    /// All categories in reporting order
    pub const ALL: [AuditCategory; 9] = [
        AuditCategory::Authentication,
        AuditCategory::Authorization,
        AuditCategory::Encryption,
        AuditCategory::DataProtection,
        AuditCategory::NetworkSecurity,
        AuditCategory::InputValidation,
        AuditCategory::SessionManagement,
        AuditCategory::ErrorHandling,
        AuditCategory::LoggingMonitoring,
    ];

    /// Stable kebab-case label
    pub fn label(&self) -> &'static str {
        match self {
            AuditCategory::Authentication => "authentication",
            AuditCategory::Authorization => "authorization",
            AuditCategory::Encryption => "encryption",
            AuditCategory::DataProtection => "data-protection",
            AuditCategory::NetworkSecurity => "network-security",
            AuditCategory::InputValidation => "input-validation",
            AuditCategory::SessionManagement => "session-management",
            AuditCategory::ErrorHandling => "error-handling",
            AuditCategory::LoggingMonitoring => "logging-monitoring",
        }
    }
}

/// Outcome of a single security check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckOutcome {
    Pass,
    Warning,
    Fail,
}

/// Result of one executed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub category: AuditCategory,
    pub description: String,
    pub severity: Severity,
    pub outcome: CheckOutcome,
}

/// Lifecycle of a discovered vulnerability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilityStatus {
    Open,
    Resolved,
}

/// One vulnerability, created from exactly one failed check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: Uuid,
    pub category: AuditCategory,
    pub check_id: String,
    pub description: String,
    pub severity: Severity,
    pub discovered_at: DateTime<Utc>,
    pub status: VulnerabilityStatus,
}

/// Aggregated score for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: AuditCategory,
    pub score: f64,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
    pub total: usize,
}

/// Framework compliance summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkScore {
    pub framework: String,
    pub requirements_met: usize,
    pub requirements_total: usize,
    pub score: f64,
}

/// A prioritized remediation recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1 is most urgent
    pub priority: u8,
    pub category: Option<AuditCategory>,
    pub message: String,
}

/// Complete result of one security audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResult {
    pub id: Uuid,
    pub performed_at: DateTime<Utc>,
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub categories: Vec<CategoryScore>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub frameworks: Vec<FrameworkScore>,
    pub recommendations: Vec<Recommendation>,
    pub checks_run: usize,
}

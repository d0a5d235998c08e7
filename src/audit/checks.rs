//! Security check battery
//!
//! Every audit runs the same fixed battery of named checks over a
//! [`SecuritySignals`] snapshot, so two audits over identical signals
//! produce identical outcomes. Thresholds are deliberately simple and
//! documented on each check.

use super::models::{AuditCategory, CheckOutcome};
use crate::domain::{Result, Severity};
use serde::{Deserialize, Serialize};

/// Runtime posture snapshot evaluated by the check battery
///
/// The orchestrator fills this from live engine state; defaults describe a
/// healthy, freshly initialized deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySignals {
    pub failed_login_attempts: u64,
    pub unauthorized_access_attempts: u64,
    pub encryption_failures: u64,
    pub decryption_failures: u64,
    pub validation_failures: u64,
    pub requests_last_minute: u64,
    pub open_sessions: u64,
    pub stale_sessions: u64,
    pub active_keys: usize,
    pub revoked_keys: usize,
    pub keys_overdue_rotation: usize,
    pub root_key_loaded: bool,
    pub anonymization_k: usize,
    pub retention_days: u32,
    pub audit_logging_active: bool,
    pub unresolved_error_reports: u64,
}

impl Default for SecuritySignals {
    fn default() -> Self {
        Self {
            failed_login_attempts: 0,
            unauthorized_access_attempts: 0,
            encryption_failures: 0,
            decryption_failures: 0,
            validation_failures: 0,
            requests_last_minute: 0,
            open_sessions: 0,
            stale_sessions: 0,
            active_keys: 1,
            revoked_keys: 0,
            keys_overdue_rotation: 0,
            root_key_loaded: true,
            anonymization_k: 3,
            retention_days: 730,
            audit_logging_active: true,
            unresolved_error_reports: 0,
        }
    }
}

/// One named check in the audit battery
pub struct SecurityCheck {
    pub id: &'static str,
    pub category: AuditCategory,
    pub description: &'static str,
    pub severity: Severity,
    eval: fn(&SecuritySignals) -> Result<CheckOutcome>,
}

impl SecurityCheck {
    /// Evaluate the check against a signals snapshot
    pub fn evaluate(&self, signals: &SecuritySignals) -> Result<CheckOutcome> {
        (self.eval)(signals)
    }
}

fn graded(value: u64, warn_above: u64, fail_above: u64) -> Result<CheckOutcome> {
    Ok(if value > fail_above {
        CheckOutcome::Fail
    } else if value > warn_above {
        CheckOutcome::Warning
    } else {
        CheckOutcome::Pass
    })
}

/// The fixed check battery, in category order
pub fn all_checks() -> Vec<SecurityCheck> {
    vec![
        // authentication
        SecurityCheck {
            id: "auth-brute-force",
            category: AuditCategory::Authentication,
            description: "Failed login attempts stay below brute-force thresholds",
            severity: Severity::High,
            eval: |s| graded(s.failed_login_attempts, 4, 10),
        },
        SecurityCheck {
            id: "auth-root-secret",
            category: AuditCategory::Authentication,
            description: "Root key is derived and loaded for the session",
            severity: Severity::Critical,
            eval: |s| {
                Ok(if s.root_key_loaded {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Fail
                })
            },
        },
        SecurityCheck {
            id: "auth-credential-stuffing",
            category: AuditCategory::Authentication,
            description: "No sustained credential-stuffing pattern in login failures",
            severity: Severity::Medium,
            eval: |s| graded(s.failed_login_attempts, 20, 50),
        },
        // authorization
        SecurityCheck {
            id: "authz-unauthorized-access",
            category: AuditCategory::Authorization,
            description: "No unauthorized access attempts against protected resources",
            severity: Severity::Critical,
            eval: |s| graded(s.unauthorized_access_attempts, 0, 5),
        },
        SecurityCheck {
            id: "authz-key-path",
            category: AuditCategory::Authorization,
            description: "At least one non-revoked key path remains for authorized callers",
            severity: Severity::High,
            eval: |s| {
                Ok(if s.revoked_keys > 0 && s.active_keys == 0 {
                    CheckOutcome::Fail
                } else {
                    CheckOutcome::Pass
                })
            },
        },
        SecurityCheck {
            id: "authz-denial-review",
            category: AuditCategory::Authorization,
            description: "Access denials are within reviewable volume",
            severity: Severity::Low,
            eval: |s| graded(s.unauthorized_access_attempts, 0, u64::MAX),
        },
        // encryption
        SecurityCheck {
            id: "enc-authenticated-mode",
            category: AuditCategory::Encryption,
            description: "No authenticated-encryption integrity violations observed",
            severity: Severity::Critical,
            eval: |s| {
                Ok(if s.encryption_failures > 0 || s.decryption_failures > 0 {
                    CheckOutcome::Fail
                } else {
                    CheckOutcome::Pass
                })
            },
        },
        SecurityCheck {
            id: "enc-key-availability",
            category: AuditCategory::Encryption,
            description: "Category keys are provisioned",
            severity: Severity::High,
            eval: |s| {
                Ok(if s.active_keys == 0 {
                    CheckOutcome::Warning
                } else {
                    CheckOutcome::Pass
                })
            },
        },
        SecurityCheck {
            id: "enc-key-rotation",
            category: AuditCategory::Encryption,
            description: "No category keys overdue for rotation",
            severity: Severity::Medium,
            eval: |s| graded(s.keys_overdue_rotation as u64, 0, 3),
        },
        // data-protection
        SecurityCheck {
            id: "dp-k-threshold",
            category: AuditCategory::DataProtection,
            description: "k-anonymity group-size floor is at least 2",
            severity: Severity::High,
            eval: |s| {
                Ok(if s.anonymization_k >= 2 {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Fail
                })
            },
        },
        SecurityCheck {
            id: "dp-retention-bounds",
            category: AuditCategory::DataProtection,
            description: "Retention window is bounded and non-zero",
            severity: Severity::Medium,
            eval: |s| {
                Ok(if s.retention_days > 0 && s.retention_days <= 3650 {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Warning
                })
            },
        },
        SecurityCheck {
            id: "dp-revocation-hygiene",
            category: AuditCategory::DataProtection,
            description: "Revoked keys do not outnumber active keys",
            severity: Severity::Low,
            eval: |s| {
                Ok(if s.revoked_keys > s.active_keys {
                    CheckOutcome::Warning
                } else {
                    CheckOutcome::Pass
                })
            },
        },
        // network-security
        SecurityCheck {
            id: "net-request-flood",
            category: AuditCategory::NetworkSecurity,
            description: "Request rate is below flood thresholds",
            severity: Severity::High,
            eval: |s| graded(s.requests_last_minute, 500, 1000),
        },
        SecurityCheck {
            id: "net-session-exposure",
            category: AuditCategory::NetworkSecurity,
            description: "Concurrent session count is within expected bounds",
            severity: Severity::Medium,
            eval: |s| graded(s.open_sessions, 100, u64::MAX),
        },
        SecurityCheck {
            id: "net-throttle-headroom",
            category: AuditCategory::NetworkSecurity,
            description: "Request rate leaves throttling headroom",
            severity: Severity::Low,
            eval: |s| graded(s.requests_last_minute, 200, u64::MAX),
        },
        // input-validation
        SecurityCheck {
            id: "input-reject-rate",
            category: AuditCategory::InputValidation,
            description: "Malformed-input rejection volume is not anomalous",
            severity: Severity::Medium,
            eval: |s| graded(s.validation_failures, 20, 100),
        },
        SecurityCheck {
            id: "input-strict-schema",
            category: AuditCategory::InputValidation,
            description: "Inputs parse cleanly against their schemas",
            severity: Severity::Low,
            eval: |s| graded(s.validation_failures, 0, u64::MAX),
        },
        // session-management
        SecurityCheck {
            id: "sess-stale-cleanup",
            category: AuditCategory::SessionManagement,
            description: "Stale sessions are cleaned up promptly",
            severity: Severity::Medium,
            eval: |s| graded(s.stale_sessions, 0, 10),
        },
        SecurityCheck {
            id: "sess-concurrency",
            category: AuditCategory::SessionManagement,
            description: "Session concurrency stays within limits",
            severity: Severity::Low,
            eval: |s| graded(s.open_sessions, 500, u64::MAX),
        },
        // error-handling
        SecurityCheck {
            id: "err-unresolved-reports",
            category: AuditCategory::ErrorHandling,
            description: "Error reports are triaged, not accumulating",
            severity: Severity::Medium,
            eval: |s| graded(s.unresolved_error_reports, 0, 10),
        },
        SecurityCheck {
            id: "err-decrypt-anomalies",
            category: AuditCategory::ErrorHandling,
            description: "Decryption anomalies are rare and investigated",
            severity: Severity::High,
            eval: |s| graded(s.decryption_failures, 0, 5),
        },
        // logging-monitoring
        SecurityCheck {
            id: "log-audit-trail",
            category: AuditCategory::LoggingMonitoring,
            description: "The audit trail is active",
            severity: Severity::Medium,
            eval: |s| {
                Ok(if s.audit_logging_active {
                    CheckOutcome::Pass
                } else {
                    CheckOutcome::Fail
                })
            },
        },
        SecurityCheck {
            id: "log-event-review",
            category: AuditCategory::LoggingMonitoring,
            description: "Security events are reviewable through the audit trail",
            severity: Severity::Low,
            eval: |s| {
                let events = s.failed_login_attempts + s.unauthorized_access_attempts;
                Ok(if events > 0 && !s.audit_logging_active {
                    CheckOutcome::Fail
                } else {
                    CheckOutcome::Pass
                })
            },
        },
    ]
}

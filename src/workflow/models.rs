//! Compliance workflow models

use super::jurisdiction::Jurisdiction;
use crate::domain::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Legal basis for a processing purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalBasis {
    Consent,
    Contract,
    LegalObligation,
    LegitimateInterest,
    VitalInterest,
    PublicTask,
}

/// Consent state for one processing purpose
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consent {
    pub granted: bool,
    pub basis: LegalBasis,
    pub updated_at: DateTime<Utc>,
}

impl Consent {
    pub fn granted(basis: LegalBasis) -> Self {
        Self {
            granted: true,
            basis,
            updated_at: Utc::now(),
        }
    }
}

/// A registered data subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSubject {
    pub id: String,
    pub country_code: String,
    pub jurisdiction: Jurisdiction,
    pub registered_at: DateTime<Utc>,
    /// Processing purpose → consent state
    pub consents: HashMap<String, Consent>,
    pub processing_activities: HashSet<String>,
    pub restricted_activities: HashSet<String>,
    /// Data categories held for this subject (e.g. "billing", "medical_record")
    pub data_categories: Vec<String>,
    pub legal_hold: bool,
    pub legitimate_interest_override: bool,
    pub erased_at: Option<DateTime<Utc>>,
    pub exports: Vec<ExportRecord>,
    /// Rights this subject has exercised, in request order
    #[serde(default)]
    pub rights_exercised: Vec<ExercisedRight>,
}

/// One right exercised by a data subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExercisedRight {
    pub request_id: Uuid,
    pub request_type: RightsRequestType,
    pub exercised_at: DateTime<Utc>,
}

/// Registration details for a new data subject
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectDetails {
    pub country_code: String,
    #[serde(default)]
    pub data_categories: Vec<String>,
    #[serde(default)]
    pub consents: HashMap<String, Consent>,
    #[serde(default)]
    pub processing_activities: Vec<String>,
    #[serde(default)]
    pub legal_hold: bool,
    #[serde(default)]
    pub legitimate_interest_override: bool,
}

/// Supported rights-request types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightsRequestType {
    Access,
    Rectification,
    Erasure,
    Portability,
    Restriction,
    Objection,
    WithdrawConsent,
}

/// Request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Received,
    Processing,
    Completed,
    Rejected,
}

/// Export format for portability requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// A recorded portability export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub exported_at: DateTime<Utc>,
    pub format: ExportFormat,
    pub included_metadata: bool,
}

/// Per-type parameters for a rights request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestDetails {
    /// Rectification: field name → corrected value
    pub corrections: Option<serde_json::Map<String, Value>>,
    /// Erasure: restrict deletion to these categories; `None` means all
    pub target_categories: Option<Vec<String>>,
    /// Portability export format
    #[serde(default)]
    pub export_format: ExportFormat,
    /// Portability: include processing metadata in the export
    #[serde(default)]
    pub include_metadata: bool,
    /// Withdraw-consent / objection: purposes or activities concerned
    pub purposes: Option<Vec<String>>,
    /// Restriction: activities to restrict
    pub activities: Option<Vec<String>>,
}

/// One entry in a request's processing log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub at: DateTime<Utc>,
    pub status: RequestStatus,
    pub note: Option<String>,
}

/// A data-subject rights request and its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsRequest {
    pub id: Uuid,
    pub subject_id: String,
    pub request_type: RightsRequestType,
    pub submitted_at: DateTime<Utc>,
    pub response_deadline: DateTime<Utc>,
    pub status: RequestStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub outcome: Option<Value>,
    pub rejection_reason: Option<String>,
    /// Every status transition, oldest first
    #[serde(default)]
    pub processing_log: Vec<ProcessingLogEntry>,
}

impl RightsRequest {
    /// Move the request to `status` and append a processing-log entry
    pub fn transition(&mut self, status: RequestStatus, note: Option<String>) {
        self.status = status;
        self.processing_log.push(ProcessingLogEntry {
            at: Utc::now(),
            status,
            note,
        });
    }
}

/// Breach classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachType {
    Confidentiality,
    Integrity,
    Availability,
}

/// Details for reporting a data breach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachDetails {
    pub breach_type: BreachType,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub affected_subjects: Vec<String>,
    #[serde(default)]
    pub affected_data_types: Vec<String>,
}

/// A recorded data breach
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBreachRecord {
    pub id: Uuid,
    pub reported_at: DateTime<Utc>,
    pub notification_deadline: DateTime<Utc>,
    pub breach_type: BreachType,
    pub severity: Severity,
    pub description: String,
    pub affected_subjects: Vec<String>,
    pub affected_data_types: Vec<String>,
    pub notification_required: bool,
    pub notified_at: Option<DateTime<Utc>>,
    pub anonymization_triggered: bool,
}

/// Rights-request SLA summary for the compliance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSlaSummary {
    pub total: usize,
    pub completed: usize,
    pub rejected: usize,
    pub overdue: usize,
    pub within_sla_pct: f64,
}

/// Breach-notification summary for the compliance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachSummary {
    pub total: usize,
    pub notification_required: usize,
    pub notified_on_time: usize,
    pub notification_overdue: usize,
}

/// Retention summary for the compliance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSummary {
    pub retention_days: i64,
    pub subjects_past_retention: usize,
}

/// Aggregated compliance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub generated_at: DateTime<Utc>,
    pub subject_count: usize,
    pub jurisdiction_counts: HashMap<String, usize>,
    pub processing_activities: Vec<String>,
    pub rights_requests: RequestSlaSummary,
    pub breaches: BreachSummary,
    pub retention: RetentionSummary,
}

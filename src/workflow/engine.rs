//! Compliance workflow engine
//!
//! Owns data-subject registrations, rights requests, and breach records.
//! Subject data itself lives behind the [`SubjectDataProvider`] seam; the
//! engine coordinates requests against it and keeps the durable compliance
//! record.
//!
//! Deadlines follow the configured windows: rights requests get a
//! 30-day response deadline and breaches a 72-hour notification deadline
//! by default.

use super::jurisdiction::Jurisdiction;
use super::models::{
    BreachDetails, BreachSummary, BreachType, ComplianceReport, DataBreachRecord, DataSubject,
    ExercisedRight, ExportFormat, ExportRecord, LegalBasis, RequestDetails, RequestSlaSummary,
    RequestStatus, RetentionSummary, RightsRequest, RightsRequestType, SubjectDetails,
};
use super::provider::SubjectDataProvider;
use crate::config::schema::WorkflowConfig;
use crate::domain::{CustodiaError, Result, Severity};
use crate::storage::{blob_names, BlobStore};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Data categories kept under legal retention obligations; erasure requests
/// touching them are not applicable
const RETENTION_CATEGORIES: &[&str] = &["billing", "medical_record"];

/// Special data categories that always require breach notification
const SPECIAL_CATEGORIES: &[&str] = &[
    "health",
    "medical",
    "medical_record",
    "biometric",
    "genetic",
    "ethnicity",
    "religion",
    "sexual_orientation",
];

#[derive(Debug, Default, Serialize, Deserialize)]
struct WorkflowState {
    subjects: HashMap<String, DataSubject>,
    requests: Vec<RightsRequest>,
    breaches: Vec<DataBreachRecord>,
}

/// Data-subject rights and breach workflow engine
pub struct ComplianceWorkflowEngine {
    config: WorkflowConfig,
    store: Arc<dyn BlobStore>,
    provider: Arc<dyn SubjectDataProvider>,
    state: RwLock<WorkflowState>,
}

impl ComplianceWorkflowEngine {
    /// Create an engine and load any persisted compliance records
    pub async fn new(
        store: Arc<dyn BlobStore>,
        provider: Arc<dyn SubjectDataProvider>,
        config: WorkflowConfig,
    ) -> Result<Self> {
        let state = match store.get(blob_names::COMPLIANCE_RECORDS).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => WorkflowState::default(),
        };
        Ok(Self {
            config,
            store,
            provider,
            state: RwLock::new(state),
        })
    }

    /// Register a data subject, inferring jurisdiction from the country code
    pub async fn register_data_subject(
        &self,
        subject_id: &str,
        details: SubjectDetails,
    ) -> Result<DataSubject> {
        let jurisdiction = Jurisdiction::from_country_code(&details.country_code);
        let subject = DataSubject {
            id: subject_id.to_string(),
            country_code: details.country_code.trim().to_ascii_uppercase(),
            jurisdiction,
            registered_at: Utc::now(),
            consents: details.consents,
            processing_activities: details.processing_activities.into_iter().collect(),
            restricted_activities: HashSet::new(),
            data_categories: details.data_categories,
            legal_hold: details.legal_hold,
            legitimate_interest_override: details.legitimate_interest_override,
            erased_at: None,
            exports: Vec::new(),
            rights_exercised: Vec::new(),
        };

        let mut state = self.state.write().await;
        state.subjects.insert(subject_id.to_string(), subject.clone());
        self.persist(&state).await?;

        info!(
            subject = subject_id,
            regulation = jurisdiction.regulation(),
            "Data subject registered"
        );
        Ok(subject)
    }

    /// Handle a data-subject rights request
    ///
    /// The request is recorded whatever its outcome; a request the engine
    /// cannot lawfully fulfil is recorded as rejected and the call fails
    /// with `RequestNotApplicable`.
    pub async fn handle_rights_request(
        &self,
        subject_id: &str,
        request_type: RightsRequestType,
        details: RequestDetails,
    ) -> Result<RightsRequest> {
        let submitted_at = Utc::now();
        let mut request = RightsRequest {
            id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            request_type,
            submitted_at,
            response_deadline: submitted_at + Duration::days(self.config.response_deadline_days),
            status: RequestStatus::Received,
            completed_at: None,
            outcome: None,
            rejection_reason: None,
            processing_log: Vec::new(),
        };
        request.transition(RequestStatus::Received, None);

        let mut state = self.state.write().await;
        if !state.subjects.contains_key(subject_id) {
            return Err(CustodiaError::Validation(format!(
                "unknown data subject '{subject_id}'"
            )));
        }

        request.transition(RequestStatus::Processing, None);
        let dispatch = self
            .dispatch(&mut state, subject_id, request_type, &details)
            .await;

        let result = match dispatch {
            Ok(outcome) => {
                request.transition(RequestStatus::Completed, None);
                request.completed_at = Some(Utc::now());
                request.outcome = Some(outcome);
                Ok(())
            }
            Err(error) => {
                warn!(subject = subject_id, ?request_type, %error, "Rights request rejected");
                request.transition(RequestStatus::Rejected, Some(error.to_string()));
                request.rejection_reason = Some(error.to_string());
                Err(error)
            }
        };

        if let Ok(subject) = subject_mut(&mut state, subject_id) {
            subject.rights_exercised.push(ExercisedRight {
                request_id: request.id,
                request_type,
                exercised_at: submitted_at,
            });
        }
        state.requests.push(request.clone());
        self.persist(&state).await?;
        drop(state);

        result.map(|_| request)
    }

    async fn dispatch(
        &self,
        state: &mut WorkflowState,
        subject_id: &str,
        request_type: RightsRequestType,
        details: &RequestDetails,
    ) -> Result<Value> {
        match request_type {
            RightsRequestType::Access => self.compile_access_package(state, subject_id).await,
            RightsRequestType::Rectification => {
                let corrections = details.corrections.as_ref().ok_or_else(|| {
                    CustodiaError::Validation(
                        "rectification request carries no corrections".to_string(),
                    )
                })?;
                self.provider
                    .apply_corrections(subject_id, corrections)
                    .await?;
                Ok(json!({
                    "corrected_fields": corrections.keys().collect::<Vec<_>>(),
                }))
            }
            RightsRequestType::Erasure => {
                self.erase_subject(state, subject_id, details.target_categories.as_deref())
                    .await
            }
            RightsRequestType::Portability => {
                self.export_portable_data(state, subject_id, details).await
            }
            RightsRequestType::Restriction => {
                let subject = subject_mut(state, subject_id)?;
                let activities = details.activities.clone().unwrap_or_default();
                for activity in &activities {
                    subject.restricted_activities.insert(activity.clone());
                }
                Ok(json!({"restricted_activities": activities}))
            }
            RightsRequestType::Objection => {
                let subject = subject_mut(state, subject_id)?;
                let purposes = details.purposes.clone().unwrap_or_default();
                for purpose in &purposes {
                    subject.processing_activities.remove(purpose);
                }
                Ok(json!({"ceased_activities": purposes}))
            }
            RightsRequestType::WithdrawConsent => {
                let subject = subject_mut(state, subject_id)?;
                let purposes = details.purposes.clone().unwrap_or_default();
                let now = Utc::now();
                let mut withdrawn = Vec::new();
                for purpose in &purposes {
                    if let Some(consent) = subject.consents.get_mut(purpose) {
                        consent.granted = false;
                        consent.updated_at = now;
                        withdrawn.push(purpose.clone());
                    }
                }
                Ok(json!({"withdrawn": withdrawn}))
            }
        }
    }

    /// Compile the access package: registration record, processing
    /// metadata, and the personal data held by the provider
    async fn compile_access_package(
        &self,
        state: &WorkflowState,
        subject_id: &str,
    ) -> Result<Value> {
        let subject = subject_ref(state, subject_id)?;
        let data = self.provider.fetch_subject_data(subject_id).await?;
        Ok(json!({
            "subject": {
                "id": subject.id,
                "jurisdiction": subject.jurisdiction,
                "regulation": subject.jurisdiction.regulation(),
                "registered_at": subject.registered_at,
            },
            "processing": {
                "activities": subject.processing_activities,
                "restricted": subject.restricted_activities,
                "consents": subject.consents,
            },
            "data": data,
        }))
    }

    async fn erase_subject(
        &self,
        state: &mut WorkflowState,
        subject_id: &str,
        target_categories: Option<&[String]>,
    ) -> Result<Value> {
        {
            let subject = subject_ref(state, subject_id)?;
            if let Some(reason) = erasure_block_reason(subject) {
                return Err(CustodiaError::RequestNotApplicable(reason));
            }
        }

        let erased = self
            .provider
            .erase_subject_data(subject_id, target_categories)
            .await?;

        let subject = subject_mut(state, subject_id)?;
        match target_categories {
            Some(categories) => {
                subject
                    .data_categories
                    .retain(|c| !categories.contains(c));
            }
            None => {
                subject.data_categories.clear();
                subject.consents.clear();
                subject.processing_activities.clear();
                subject.erased_at = Some(Utc::now());
            }
        }

        Ok(json!({"records_erased": erased}))
    }

    /// Export data held under consent or contract basis only
    async fn export_portable_data(
        &self,
        state: &mut WorkflowState,
        subject_id: &str,
        details: &RequestDetails,
    ) -> Result<Value> {
        let eligible = {
            let subject = subject_ref(state, subject_id)?;
            subject.consents.values().any(|c| {
                c.granted && matches!(c.basis, LegalBasis::Consent | LegalBasis::Contract)
            })
        };

        let data = if eligible {
            self.provider.fetch_subject_data(subject_id).await?
        } else {
            Value::Null
        };

        let subject = subject_mut(state, subject_id)?;
        let export = match details.export_format {
            ExportFormat::Json => {
                if details.include_metadata {
                    json!({
                        "subject_id": subject.id,
                        "exported_at": Utc::now(),
                        "data": data,
                    })
                } else {
                    data
                }
            }
            ExportFormat::Csv => Value::String(to_csv(&data)),
        };

        subject.exports.push(ExportRecord {
            exported_at: Utc::now(),
            format: details.export_format,
            included_metadata: details.include_metadata,
        });

        Ok(json!({
            "format": details.export_format,
            "export": export,
        }))
    }

    /// Record a data breach
    ///
    /// Notification is required for high or critical severity, or whenever
    /// special data categories are affected. A high-severity
    /// confidentiality breach triggers anonymization of the affected
    /// subjects' data through the provider.
    pub async fn report_data_breach(&self, details: BreachDetails) -> Result<DataBreachRecord> {
        let reported_at = Utc::now();
        let notification_required = matches!(details.severity, Severity::High | Severity::Critical)
            || details
                .affected_data_types
                .iter()
                .any(|t| SPECIAL_CATEGORIES.contains(&t.to_ascii_lowercase().as_str()));

        let anonymize = details.breach_type == BreachType::Confidentiality
            && details.severity == Severity::High;
        if anonymize {
            for subject_id in &details.affected_subjects {
                if let Err(error) = self.provider.anonymize_subject_data(subject_id).await {
                    warn!(subject = %subject_id, %error, "Breach-response anonymization failed");
                }
            }
        }

        let record = DataBreachRecord {
            id: Uuid::new_v4(),
            reported_at,
            notification_deadline: reported_at
                + Duration::hours(self.config.breach_notification_hours),
            breach_type: details.breach_type,
            severity: details.severity,
            description: details.description,
            affected_subjects: details.affected_subjects,
            affected_data_types: details.affected_data_types,
            notification_required,
            notified_at: None,
            anonymization_triggered: anonymize,
        };

        let mut state = self.state.write().await;
        state.breaches.push(record.clone());
        self.persist(&state).await?;

        info!(
            breach = %record.id,
            severity = ?record.severity,
            notification_required,
            "Data breach recorded"
        );
        Ok(record)
    }

    /// Record that authorities were notified of a breach
    ///
    /// The notification timestamp is recorded even when late; a late
    /// notification additionally fails with `DeadlineExceeded` so callers
    /// see the SLA miss.
    pub async fn record_breach_notification(&self, breach_id: Uuid) -> Result<DataBreachRecord> {
        let now = Utc::now();
        let mut state = self.state.write().await;
        let breach = state
            .breaches
            .iter_mut()
            .find(|b| b.id == breach_id)
            .ok_or_else(|| {
                CustodiaError::Validation(format!("unknown breach '{breach_id}'"))
            })?;
        breach.notified_at = Some(now);
        let record = breach.clone();
        self.persist(&state).await?;

        if now > record.notification_deadline {
            let late = now - record.notification_deadline;
            return Err(CustodiaError::DeadlineExceeded(format!(
                "breach notification recorded {} hours past the deadline",
                late.num_hours().max(1)
            )));
        }
        Ok(record)
    }

    /// Aggregate the compliance posture across subjects, requests, and breaches
    pub async fn generate_compliance_report(&self) -> ComplianceReport {
        let state = self.state.read().await;
        let now = Utc::now();

        let mut jurisdiction_counts: HashMap<String, usize> = HashMap::new();
        for subject in state.subjects.values() {
            *jurisdiction_counts
                .entry(subject.jurisdiction.regulation().to_string())
                .or_default() += 1;
        }

        let mut processing_activities: Vec<String> = state
            .subjects
            .values()
            .flat_map(|s| s.processing_activities.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        processing_activities.sort();

        let total = state.requests.len();
        let completed = state
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Completed)
            .count();
        let rejected = state
            .requests
            .iter()
            .filter(|r| r.status == RequestStatus::Rejected)
            .count();
        let overdue = state
            .requests
            .iter()
            .filter(|r| match r.completed_at {
                Some(done) => done > r.response_deadline,
                None => {
                    matches!(r.status, RequestStatus::Received | RequestStatus::Processing)
                        && now > r.response_deadline
                }
            })
            .count();
        let within_sla_pct = if total == 0 {
            100.0
        } else {
            ((total - overdue) as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };

        let required: Vec<&DataBreachRecord> = state
            .breaches
            .iter()
            .filter(|b| b.notification_required)
            .collect();
        let notified_on_time = required
            .iter()
            .filter(|b| matches!(b.notified_at, Some(at) if at <= b.notification_deadline))
            .count();
        let notification_overdue = required
            .iter()
            .filter(|b| match b.notified_at {
                Some(at) => at > b.notification_deadline,
                None => now > b.notification_deadline,
            })
            .count();

        let retention_cutoff = now - Duration::days(self.config.retention_days);
        let subjects_past_retention = state
            .subjects
            .values()
            .filter(|s| s.erased_at.is_none() && !s.legal_hold && s.registered_at < retention_cutoff)
            .count();

        ComplianceReport {
            generated_at: now,
            subject_count: state.subjects.len(),
            jurisdiction_counts,
            processing_activities,
            rights_requests: RequestSlaSummary {
                total,
                completed,
                rejected,
                overdue,
                within_sla_pct,
            },
            breaches: BreachSummary {
                total: state.breaches.len(),
                notification_required: required.len(),
                notified_on_time,
                notification_overdue,
            },
            retention: RetentionSummary {
                retention_days: self.config.retention_days,
                subjects_past_retention,
            },
        }
    }

    /// Look up a registered subject
    pub async fn subject(&self, subject_id: &str) -> Option<DataSubject> {
        self.state.read().await.subjects.get(subject_id).cloned()
    }

    /// All recorded rights requests, oldest first
    pub async fn requests(&self) -> Vec<RightsRequest> {
        self.state.read().await.requests.clone()
    }

    /// All recorded breaches, oldest first
    pub async fn breaches(&self) -> Vec<DataBreachRecord> {
        self.state.read().await.breaches.clone()
    }

    async fn persist(&self, state: &WorkflowState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        self.store.put(blob_names::COMPLIANCE_RECORDS, &bytes).await
    }
}

fn subject_ref<'a>(state: &'a WorkflowState, subject_id: &str) -> Result<&'a DataSubject> {
    state
        .subjects
        .get(subject_id)
        .ok_or_else(|| CustodiaError::Validation(format!("unknown data subject '{subject_id}'")))
}

fn subject_mut<'a>(state: &'a mut WorkflowState, subject_id: &str) -> Result<&'a mut DataSubject> {
    state
        .subjects
        .get_mut(subject_id)
        .ok_or_else(|| CustodiaError::Validation(format!("unknown data subject '{subject_id}'")))
}

/// Why an erasure request cannot be fulfilled, if it cannot
fn erasure_block_reason(subject: &DataSubject) -> Option<String> {
    if subject.legal_hold {
        return Some("subject data is under legal hold".to_string());
    }
    if let Some(category) = subject
        .data_categories
        .iter()
        .find(|c| RETENTION_CATEGORIES.contains(&c.as_str()))
    {
        return Some(format!(
            "retention obligation applies to category '{category}'"
        ));
    }
    if subject.legitimate_interest_override {
        return Some("a legitimate-interest override applies".to_string());
    }
    None
}

/// Flatten a JSON object into a two-line CSV (header, values)
fn to_csv(data: &Value) -> String {
    let Value::Object(map) = data else {
        return String::new();
    };
    let headers: Vec<String> = map.keys().map(|k| csv_escape(k)).collect();
    let values: Vec<String> = map
        .values()
        .map(|v| match v {
            Value::String(s) => csv_escape(s),
            other => csv_escape(&other.to_string()),
        })
        .collect();
    format!("{}\n{}", headers.join(","), values.join(","))
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use crate::workflow::models::Consent;
    use crate::workflow::provider::test_support::MemoryProvider;
    use serde_json::json;

    fn consent(purpose: &str, basis: LegalBasis) -> (String, Consent) {
        (purpose.to_string(), Consent::granted(basis))
    }

    async fn engine_with(
        provider: Arc<MemoryProvider>,
    ) -> (ComplianceWorkflowEngine, Arc<MemoryProvider>) {
        let engine = ComplianceWorkflowEngine::new(
            Arc::new(MemoryBlobStore::new()),
            provider.clone(),
            WorkflowConfig::default(),
        )
        .await
        .unwrap();
        (engine, provider)
    }

    fn details_for(country: &str) -> SubjectDetails {
        SubjectDetails {
            country_code: country.to_string(),
            data_categories: vec!["profile".to_string()],
            consents: [consent("marketing", LegalBasis::Consent)].into_iter().collect(),
            processing_activities: vec!["analytics".to_string()],
            legal_hold: false,
            legitimate_interest_override: false,
        }
    }

    #[tokio::test]
    async fn test_registration_infers_jurisdiction() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let subject = engine
            .register_data_subject("s1", details_for("de"))
            .await
            .unwrap();
        assert_eq!(subject.jurisdiction, Jurisdiction::Eu);
        assert_eq!(subject.country_code, "DE");
    }

    #[tokio::test]
    async fn test_access_request_compiles_package() {
        let provider = Arc::new(MemoryProvider::with_subject(
            "s1",
            json!({"name": "Jane", "steps": 900}),
        ));
        let (engine, _) = engine_with(provider).await;
        engine
            .register_data_subject("s1", details_for("FR"))
            .await
            .unwrap();

        let request = engine
            .handle_rights_request("s1", RightsRequestType::Access, RequestDetails::default())
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Completed);
        let outcome = request.outcome.unwrap();
        assert_eq!(outcome["data"]["name"], json!("Jane"));
        assert_eq!(outcome["subject"]["regulation"], json!("GDPR"));
    }

    #[tokio::test]
    async fn test_response_deadline_is_thirty_days() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        engine
            .register_data_subject("s1", details_for("US"))
            .await
            .unwrap();

        let request = engine
            .handle_rights_request("s1", RightsRequestType::Access, RequestDetails::default())
            .await
            .unwrap();

        let window = request.response_deadline - request.submitted_at;
        assert_eq!(window.num_days(), 30);
    }

    #[tokio::test]
    async fn test_unknown_subject_rejected() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let result = engine
            .handle_rights_request("ghost", RightsRequestType::Access, RequestDetails::default())
            .await;
        assert!(matches!(result, Err(CustodiaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_erasure_blocked_by_legal_hold() {
        let (engine, provider) = engine_with(Arc::new(MemoryProvider::default())).await;
        let mut details = details_for("DE");
        details.legal_hold = true;
        engine.register_data_subject("s1", details).await.unwrap();

        let result = engine
            .handle_rights_request("s1", RightsRequestType::Erasure, RequestDetails::default())
            .await;

        assert!(matches!(result, Err(CustodiaError::RequestNotApplicable(_))));
        assert!(provider.erased.lock().unwrap().is_empty());

        // The rejection is still on the record, with the reason logged
        let requests = engine.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].status, RequestStatus::Rejected);
        let last = requests[0].processing_log.last().unwrap();
        assert_eq!(last.status, RequestStatus::Rejected);
        assert!(last.note.is_some());
    }

    #[tokio::test]
    async fn test_request_keeps_processing_log_and_rights_exercised() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();

        let request = engine
            .handle_rights_request("s1", RightsRequestType::Access, RequestDetails::default())
            .await
            .unwrap();

        let statuses: Vec<RequestStatus> =
            request.processing_log.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            [
                RequestStatus::Received,
                RequestStatus::Processing,
                RequestStatus::Completed,
            ]
        );

        let subject = engine.subject("s1").await.unwrap();
        assert_eq!(subject.rights_exercised.len(), 1);
        assert_eq!(
            subject.rights_exercised[0].request_type,
            RightsRequestType::Access
        );
        assert_eq!(subject.rights_exercised[0].request_id, request.id);
    }

    #[tokio::test]
    async fn test_erasure_blocked_by_retention_category() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let mut details = details_for("DE");
        details.data_categories = vec!["billing".to_string()];
        engine.register_data_subject("s1", details).await.unwrap();

        let result = engine
            .handle_rights_request("s1", RightsRequestType::Erasure, RequestDetails::default())
            .await;
        assert!(matches!(result, Err(CustodiaError::RequestNotApplicable(_))));
    }

    #[tokio::test]
    async fn test_erasure_clears_subject_state() {
        let provider = Arc::new(MemoryProvider::with_subject("s1", json!({"name": "Jane"})));
        let (engine, provider) = engine_with(provider).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();

        let request = engine
            .handle_rights_request("s1", RightsRequestType::Erasure, RequestDetails::default())
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Completed);
        assert_eq!(provider.erased.lock().unwrap().as_slice(), ["s1"]);
        let subject = engine.subject("s1").await.unwrap();
        assert!(subject.erased_at.is_some());
        assert!(subject.consents.is_empty());
    }

    #[tokio::test]
    async fn test_rectification_applies_corrections() {
        let provider = Arc::new(MemoryProvider::with_subject("s1", json!({"name": "Jnae"})));
        let (engine, provider) = engine_with(provider).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();

        let mut corrections = serde_json::Map::new();
        corrections.insert("name".to_string(), json!("Jane"));
        engine
            .handle_rights_request(
                "s1",
                RightsRequestType::Rectification,
                RequestDetails {
                    corrections: Some(corrections),
                    ..RequestDetails::default()
                },
            )
            .await
            .unwrap();

        let data = provider.data.lock().unwrap();
        assert_eq!(data["s1"]["name"], json!("Jane"));
    }

    #[tokio::test]
    async fn test_portability_csv_export() {
        let provider = Arc::new(MemoryProvider::with_subject(
            "s1",
            json!({"name": "Jane", "steps": 900}),
        ));
        let (engine, _) = engine_with(provider).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();

        let request = engine
            .handle_rights_request(
                "s1",
                RightsRequestType::Portability,
                RequestDetails {
                    export_format: ExportFormat::Csv,
                    ..RequestDetails::default()
                },
            )
            .await
            .unwrap();

        let outcome = request.outcome.unwrap();
        let csv = outcome["export"].as_str().unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.starts_with("name,steps"));

        let subject = engine.subject("s1").await.unwrap();
        assert_eq!(subject.exports.len(), 1);
    }

    #[tokio::test]
    async fn test_portability_without_eligible_basis_exports_nothing() {
        let provider = Arc::new(MemoryProvider::with_subject("s1", json!({"name": "Jane"})));
        let (engine, _) = engine_with(provider).await;
        let mut details = details_for("DE");
        details.consents =
            [consent("fraud", LegalBasis::LegalObligation)].into_iter().collect();
        engine.register_data_subject("s1", details).await.unwrap();

        let request = engine
            .handle_rights_request(
                "s1",
                RightsRequestType::Portability,
                RequestDetails::default(),
            )
            .await
            .unwrap();

        assert_eq!(request.outcome.unwrap()["export"], Value::Null);
    }

    #[tokio::test]
    async fn test_withdraw_consent() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();

        engine
            .handle_rights_request(
                "s1",
                RightsRequestType::WithdrawConsent,
                RequestDetails {
                    purposes: Some(vec!["marketing".to_string()]),
                    ..RequestDetails::default()
                },
            )
            .await
            .unwrap();

        let subject = engine.subject("s1").await.unwrap();
        assert!(!subject.consents["marketing"].granted);
    }

    #[tokio::test]
    async fn test_breach_notification_deadline_is_72_hours() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let record = engine
            .report_data_breach(BreachDetails {
                breach_type: BreachType::Availability,
                severity: Severity::Medium,
                description: "storage outage".to_string(),
                affected_subjects: vec![],
                affected_data_types: vec!["technical".to_string()],
            })
            .await
            .unwrap();

        let window = record.notification_deadline - record.reported_at;
        assert_eq!(window.num_hours(), 72);
        assert!(!record.notification_required);
    }

    #[tokio::test]
    async fn test_special_categories_require_notification() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let record = engine
            .report_data_breach(BreachDetails {
                breach_type: BreachType::Integrity,
                severity: Severity::Low,
                description: "checksum mismatch".to_string(),
                affected_subjects: vec![],
                affected_data_types: vec!["health".to_string()],
            })
            .await
            .unwrap();
        assert!(record.notification_required);
    }

    #[tokio::test]
    async fn test_confidentiality_high_triggers_anonymization() {
        let (engine, provider) = engine_with(Arc::new(MemoryProvider::default())).await;
        let record = engine
            .report_data_breach(BreachDetails {
                breach_type: BreachType::Confidentiality,
                severity: Severity::High,
                description: "exposed export bucket".to_string(),
                affected_subjects: vec!["s1".to_string(), "s2".to_string()],
                affected_data_types: vec!["profile".to_string()],
            })
            .await
            .unwrap();

        assert!(record.anonymization_triggered);
        assert_eq!(provider.anonymized.lock().unwrap().as_slice(), ["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_on_time_notification_recorded() {
        let (engine, _) = engine_with(Arc::new(MemoryProvider::default())).await;
        let record = engine
            .report_data_breach(BreachDetails {
                breach_type: BreachType::Confidentiality,
                severity: Severity::Critical,
                description: "credential leak".to_string(),
                affected_subjects: vec![],
                affected_data_types: vec![],
            })
            .await
            .unwrap();

        let notified = engine.record_breach_notification(record.id).await.unwrap();
        assert!(notified.notified_at.is_some());
    }

    #[tokio::test]
    async fn test_compliance_report_counts() {
        let provider = Arc::new(MemoryProvider::with_subject("s1", json!({"a": 1})));
        let (engine, _) = engine_with(provider).await;
        engine
            .register_data_subject("s1", details_for("DE"))
            .await
            .unwrap();
        engine
            .register_data_subject("s2", details_for("US"))
            .await
            .unwrap();
        engine
            .handle_rights_request("s1", RightsRequestType::Access, RequestDetails::default())
            .await
            .unwrap();

        let report = engine.generate_compliance_report().await;
        assert_eq!(report.subject_count, 2);
        assert_eq!(report.jurisdiction_counts["GDPR"], 1);
        assert_eq!(report.jurisdiction_counts["CCPA/HIPAA"], 1);
        assert_eq!(report.rights_requests.total, 1);
        assert_eq!(report.rights_requests.completed, 1);
        assert_eq!(report.rights_requests.within_sla_pct, 100.0);
        assert_eq!(report.retention.subjects_past_retention, 0);
    }

    #[tokio::test]
    async fn test_state_survives_reload() {
        let store = Arc::new(MemoryBlobStore::new());
        let provider = Arc::new(MemoryProvider::default());
        {
            let engine = ComplianceWorkflowEngine::new(
                store.clone(),
                provider.clone(),
                WorkflowConfig::default(),
            )
            .await
            .unwrap();
            engine
                .register_data_subject("s1", details_for("BR"))
                .await
                .unwrap();
        }

        let reloaded =
            ComplianceWorkflowEngine::new(store, provider, WorkflowConfig::default())
                .await
                .unwrap();
        let subject = reloaded.subject("s1").await.unwrap();
        assert_eq!(subject.jurisdiction, Jurisdiction::Brazil);
    }
}

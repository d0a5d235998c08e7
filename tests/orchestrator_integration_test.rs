//! Integration tests wiring all five engines through the orchestrator

use async_trait::async_trait;
use custodia::anonymization::{AnonymizationConfig, AnonymizationEngine};
use custodia::audit::AuditEngine;
use custodia::config::{
    secret_string, AuditConfig, EncryptionConfig, KeysConfig, OrchestratorConfig, SecurityLevel,
    WorkflowConfig,
};
use custodia::domain::{DataCategory, Result, RiskLevel};
use custodia::encryption::FieldEncryptionEngine;
use custodia::keys::KeyManager;
use custodia::orchestrator::{SecurityEvent, SecurityOrchestrator};
use custodia::storage::{BlobStore, MemoryBlobStore};
use custodia::workflow::{
    BreachDetails, BreachType, ComplianceWorkflowEngine, SubjectDataProvider,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

struct NullProvider;

#[async_trait]
impl SubjectDataProvider for NullProvider {
    async fn fetch_subject_data(&self, _subject_id: &str) -> Result<Value> {
        Ok(Value::Null)
    }
    async fn apply_corrections(
        &self,
        _subject_id: &str,
        _corrections: &Map<String, Value>,
    ) -> Result<()> {
        Ok(())
    }
    async fn erase_subject_data(
        &self,
        _subject_id: &str,
        _categories: Option<&[String]>,
    ) -> Result<u64> {
        Ok(0)
    }
    async fn anonymize_subject_data(&self, _subject_id: &str) -> Result<()> {
        Ok(())
    }
}

async fn build_orchestrator(level: SecurityLevel) -> Arc<SecurityOrchestrator> {
    let store: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::new());
    let keys = Arc::new(KeyManager::new(
        store.clone(),
        KeysConfig {
            argon2_memory_kib: 8192,
            argon2_iterations: 1,
            ..KeysConfig::default()
        },
    ));
    let encryption =
        Arc::new(FieldEncryptionEngine::new(keys.clone(), EncryptionConfig::default()).unwrap());
    let anonymization =
        Arc::new(AnonymizationEngine::new(AnonymizationConfig::default()).unwrap());
    let audit = Arc::new(
        AuditEngine::new(store.clone(), AuditConfig::default())
            .await
            .unwrap(),
    );
    let workflow = Arc::new(
        ComplianceWorkflowEngine::new(store, Arc::new(NullProvider), WorkflowConfig::default())
            .await
            .unwrap(),
    );

    Arc::new(SecurityOrchestrator::new(
        level,
        OrchestratorConfig::default(),
        WorkflowConfig::default(),
        keys,
        encryption,
        anonymization,
        audit,
        workflow,
    ))
}

#[tokio::test]
async fn test_initialization_and_status() {
    let orchestrator = build_orchestrator(SecurityLevel::Maximum).await;
    let status = orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();

    assert!(status.services.keys);
    assert!(status.services.encryption);
    assert!(status.services.workflow);
    assert_eq!(status.security_level, SecurityLevel::Maximum);
    assert_eq!(orchestrator.profile().k, 10);
}

#[tokio::test]
async fn test_audit_through_orchestrated_signals() {
    let orchestrator = build_orchestrator(SecurityLevel::High).await;
    orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();
    orchestrator
        .keys()
        .get_or_create_key(&DataCategory::Health)
        .await
        .unwrap();

    let result = orchestrator.run_full_audit().await.unwrap();
    assert_eq!(result.risk_level, RiskLevel::VeryLow);
    assert_eq!(result.overall_score, 100.0);
}

#[tokio::test]
async fn test_encryption_failure_reaction_rotates_key() {
    let orchestrator = build_orchestrator(SecurityLevel::High).await;
    orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();
    orchestrator
        .keys()
        .get_or_create_key(&DataCategory::Financial)
        .await
        .unwrap();
    orchestrator.start();

    orchestrator.record_encryption_failure(DataCategory::Financial, "tag mismatch");
    tokio::time::sleep(Duration::from_millis(150)).await;

    let metadata = orchestrator.keys().list_metadata().await;
    assert_eq!(metadata[0].rotation_count, 1);

    // The failure also degrades the next audit
    let result = orchestrator.run_full_audit().await.unwrap();
    assert!(result.overall_score < 100.0);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_breach_event_flows_into_workflow() {
    let orchestrator = build_orchestrator(SecurityLevel::High).await;
    orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();
    orchestrator.start();

    orchestrator.publish(SecurityEvent::BreachConfirmed {
        details: BreachDetails {
            breach_type: BreachType::Confidentiality,
            severity: custodia::domain::Severity::Critical,
            description: "stolen laptop".to_string(),
            affected_subjects: vec!["u1".to_string()],
            affected_data_types: vec!["health".to_string()],
        },
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    let breaches = orchestrator.workflow().breaches().await;
    assert_eq!(breaches.len(), 1);
    assert!(breaches[0].notification_required);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_aggregate_report() {
    let orchestrator = build_orchestrator(SecurityLevel::Medium).await;
    orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();
    orchestrator.run_full_audit().await.unwrap();

    let report = orchestrator.report().await;
    assert_eq!(report.security_level, SecurityLevel::Medium);
    assert!(report.latest_audit.is_some());
    assert_eq!(report.open_vulnerabilities, 0);
    assert_eq!(report.compliance.subject_count, 0);
}

#[tokio::test]
async fn test_manual_compliance_review() {
    let orchestrator = build_orchestrator(SecurityLevel::High).await;
    orchestrator
        .initialize(&secret_string("orchestrated secret"))
        .await
        .unwrap();

    let review = orchestrator.run_compliance_review().await.unwrap();
    assert_eq!(review.breaches.total, 0);
    assert_eq!(review.rights_requests.within_sla_pct, 100.0);
}

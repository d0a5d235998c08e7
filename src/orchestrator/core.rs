//! Security orchestrator
//!
//! Composes the five engines behind one coordination surface: a security
//! profile derived from the configured level, an in-process event bus with
//! wired reactions, and three independent interval tasks (health check,
//! full audit, compliance review), each with its own re-entrancy guard so a
//! manual trigger never overlaps a scheduled run of the same task.
//!
//! Initialization follows a partial-degradation posture: a subordinate
//! that fails to initialize is logged and marked inactive, and the rest of
//! the subsystem keeps running.

use super::events::{EventBus, SecurityEvent};
use super::profile::SecurityProfile;
use crate::anonymization::AnonymizationEngine;
use crate::audit::{AuditEngine, AuditResult, SecuritySignals};
use crate::config::schema::{OrchestratorConfig, SecurityLevel, WorkflowConfig};
use crate::config::SecretString;
use crate::domain::{CustodiaError, DataCategory, Result, RiskLevel};
use crate::encryption::FieldEncryptionEngine;
use crate::keys::{KeyManager, KeyStats};
use crate::workflow::{ComplianceReport, ComplianceWorkflowEngine};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Keys older than this without a rotation count as overdue
const ROTATION_OVERDUE_DAYS: i64 = 90;

/// Which subordinate services are active
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub keys: bool,
    pub encryption: bool,
    pub anonymization: bool,
    pub audit: bool,
    pub workflow: bool,
}

/// Orchestrator status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    pub security_level: SecurityLevel,
    pub services: ServiceStatus,
    pub schedulers_running: bool,
    pub initialized_at: Option<DateTime<Utc>>,
}

/// Aggregated security report across all engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub generated_at: DateTime<Utc>,
    pub security_level: SecurityLevel,
    pub key_stats: KeyStats,
    pub latest_audit: Option<AuditResult>,
    pub compliance: ComplianceReport,
    pub open_vulnerabilities: usize,
}

/// Runtime counters feeding the audit signals snapshot
#[derive(Default)]
struct SignalCounters {
    failed_logins: AtomicU64,
    unauthorized_access: AtomicU64,
    encryption_failures: AtomicU64,
    decryption_failures: AtomicU64,
    validation_failures: AtomicU64,
    requests_last_minute: AtomicU64,
    open_sessions: AtomicU64,
    stale_sessions: AtomicU64,
}

/// Top-level coordinator for the data-protection subsystem
pub struct SecurityOrchestrator {
    level: SecurityLevel,
    profile: SecurityProfile,
    config: OrchestratorConfig,
    workflow_config: WorkflowConfig,

    keys: Arc<KeyManager>,
    encryption: Arc<FieldEncryptionEngine>,
    anonymization: Arc<AnonymizationEngine>,
    audit: Arc<AuditEngine>,
    workflow: Arc<ComplianceWorkflowEngine>,

    bus: EventBus,
    counters: SignalCounters,

    keys_active: AtomicBool,
    initialized_at: Mutex<Option<DateTime<Utc>>>,

    health_running: AtomicBool,
    audit_trigger_running: AtomicBool,
    review_running: AtomicBool,
    followup_pending: AtomicBool,

    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SecurityOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        level: SecurityLevel,
        config: OrchestratorConfig,
        workflow_config: WorkflowConfig,
        keys: Arc<KeyManager>,
        encryption: Arc<FieldEncryptionEngine>,
        anonymization: Arc<AnonymizationEngine>,
        audit: Arc<AuditEngine>,
        workflow: Arc<ComplianceWorkflowEngine>,
    ) -> Self {
        Self {
            level,
            profile: SecurityProfile::for_level(level),
            config,
            workflow_config,
            keys,
            encryption,
            anonymization,
            audit,
            workflow,
            bus: EventBus::default(),
            counters: SignalCounters::default(),
            keys_active: AtomicBool::new(false),
            initialized_at: Mutex::new(None),
            health_running: AtomicBool::new(false),
            audit_trigger_running: AtomicBool::new(false),
            review_running: AtomicBool::new(false),
            followup_pending: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Initialize subordinate services
    ///
    /// A failing subordinate is logged and marked inactive; the remaining
    /// services stay available.
    pub async fn initialize(&self, root_secret: &SecretString) -> Result<OrchestratorStatus> {
        match self.keys.initialize(root_secret).await {
            Ok(()) => {
                self.keys_active.store(true, Ordering::SeqCst);
            }
            Err(e) => {
                error!(%e, "Key manager initialization failed; continuing degraded");
                self.keys_active.store(false, Ordering::SeqCst);
            }
        }

        if let Ok(mut at) = self.initialized_at.lock() {
            *at = Some(Utc::now());
        }

        let status = self.status().await;
        info!(
            level = ?self.level,
            keys_active = status.services.keys,
            "Security orchestrator initialized"
        );
        Ok(status)
    }

    /// Spawn the event-reaction loop and the three interval tasks
    pub fn start(self: &Arc<Self>) {
        let mut handles = Vec::with_capacity(4);

        let orchestrator = Arc::clone(self);
        let mut receiver = self.bus.subscribe();
        handles.push(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => orchestrator.react(event).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Event subscriber lagged; events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));

        handles.push(self.spawn_interval(
            self.config.health_check_interval_secs,
            |orchestrator| async move {
                if let Err(e) = orchestrator.run_health_check().await {
                    warn!(%e, "Scheduled health check skipped");
                }
            },
        ));
        handles.push(self.spawn_interval(
            self.config.full_audit_interval_secs,
            |orchestrator| async move {
                if let Err(e) = orchestrator.run_full_audit().await {
                    warn!(%e, "Scheduled audit skipped");
                }
            },
        ));
        handles.push(self.spawn_interval(
            self.config.compliance_review_interval_secs,
            |orchestrator| async move {
                if let Err(e) = orchestrator.run_compliance_review().await {
                    warn!(%e, "Scheduled compliance review skipped");
                }
            },
        ));

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.extend(handles);
        }
    }

    fn spawn_interval<F, Fut>(self: &Arc<Self>, secs: u64, run: F) -> JoinHandle<()>
    where
        F: Fn(Arc<Self>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick fires immediately; skip it so intervals start after one period
            ticker.tick().await;
            loop {
                ticker.tick().await;
                run(Arc::clone(&orchestrator)).await;
            }
        })
    }

    /// Stop all background tasks
    pub async fn shutdown(&self) {
        let handles = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            handle.abort();
        }
        info!("Security orchestrator stopped");
    }

    /// Publish an event onto the bus
    pub fn publish(&self, event: SecurityEvent) -> usize {
        self.bus.publish(event)
    }

    /// Subscribe to the event bus
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SecurityEvent> {
        self.bus.subscribe()
    }

    async fn react(&self, event: SecurityEvent) {
        match event {
            SecurityEvent::EncryptionFailure { category, detail } => {
                warn!(category = category.label(), detail, "Encryption failure; rotating key");
                match self.keys.rotate(&category).await {
                    Ok(_) => {
                        self.bus.publish(SecurityEvent::KeyRotated { category });
                    }
                    Err(e) => warn!(%e, "Reactive key rotation failed"),
                }
            }
            SecurityEvent::UnauthorizedAccess { resource, principal } => {
                warn!(
                    resource,
                    principal = principal.as_deref().unwrap_or("unknown"),
                    "Unauthorized access; resource flagged for advisory lock"
                );
            }
            SecurityEvent::BreachConfirmed { details } => {
                if let Err(e) = self.workflow.report_data_breach(details).await {
                    error!(%e, "Failed to record confirmed breach");
                }
            }
            SecurityEvent::AuditCompleted { risk_level, .. } => match risk_level {
                RiskLevel::High | RiskLevel::Critical => {
                    if !self.followup_pending.swap(true, Ordering::SeqCst) {
                        info!("High-risk audit result; running follow-up audit");
                        if let Err(e) = self.run_full_audit().await {
                            warn!(%e, "Follow-up audit skipped");
                        }
                    }
                }
                RiskLevel::VeryLow | RiskLevel::Low => {
                    self.followup_pending.store(false, Ordering::SeqCst);
                }
                RiskLevel::Medium => {}
            },
            SecurityEvent::KeyRotated { category } => {
                info!(category = category.label(), "Key rotated");
            }
        }
    }

    /// Record a failed login attempt
    pub fn record_failed_login(&self) {
        self.counters.failed_logins.fetch_add(1, Ordering::Relaxed);
    }

    /// Record and publish an unauthorized access attempt
    pub fn record_unauthorized_access(&self, resource: &str, principal: Option<&str>) {
        self.counters
            .unauthorized_access
            .fetch_add(1, Ordering::Relaxed);
        self.bus.publish(SecurityEvent::UnauthorizedAccess {
            resource: resource.to_string(),
            principal: principal.map(str::to_string),
        });
    }

    /// Record and publish an encryption failure for a category
    pub fn record_encryption_failure(&self, category: DataCategory, detail: &str) {
        self.counters
            .encryption_failures
            .fetch_add(1, Ordering::Relaxed);
        self.bus.publish(SecurityEvent::EncryptionFailure {
            category,
            detail: detail.to_string(),
        });
    }

    /// Record a failed decrypt (authentication failure on an envelope)
    pub fn record_decryption_failure(&self) {
        self.counters
            .decryption_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected input
    pub fn record_validation_failure(&self) {
        self.counters
            .validation_failures
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Update the request-rate sample
    pub fn set_request_rate(&self, requests_last_minute: u64) {
        self.counters
            .requests_last_minute
            .store(requests_last_minute, Ordering::Relaxed);
    }

    /// Update the session counts sampled by session-management checks
    pub fn set_session_counts(&self, open: u64, stale: u64) {
        self.counters.open_sessions.store(open, Ordering::Relaxed);
        self.counters.stale_sessions.store(stale, Ordering::Relaxed);
    }

    /// Assemble the signals snapshot the audit battery evaluates
    pub async fn snapshot_signals(&self) -> SecuritySignals {
        let key_stats = self.keys.stats().await;
        let overdue_cutoff = Utc::now() - ChronoDuration::days(ROTATION_OVERDUE_DAYS);
        let keys_overdue_rotation = self
            .keys
            .list_metadata()
            .await
            .iter()
            .filter(|m| !m.revoked && m.rotation_count == 0 && m.created_at < overdue_cutoff)
            .count();

        SecuritySignals {
            failed_login_attempts: self.counters.failed_logins.load(Ordering::Relaxed),
            unauthorized_access_attempts: self
                .counters
                .unauthorized_access
                .load(Ordering::Relaxed),
            encryption_failures: self.counters.encryption_failures.load(Ordering::Relaxed),
            decryption_failures: self.counters.decryption_failures.load(Ordering::Relaxed),
            validation_failures: self.counters.validation_failures.load(Ordering::Relaxed),
            requests_last_minute: self.counters.requests_last_minute.load(Ordering::Relaxed),
            open_sessions: self.counters.open_sessions.load(Ordering::Relaxed),
            stale_sessions: self.counters.stale_sessions.load(Ordering::Relaxed),
            active_keys: key_stats.active_keys,
            revoked_keys: key_stats.revoked_keys,
            keys_overdue_rotation,
            root_key_loaded: self.keys.is_initialized().await,
            anonymization_k: self.profile.k,
            retention_days: self.workflow_config.retention_days.max(0) as u32,
            audit_logging_active: true,
            unresolved_error_reports: 0,
        }
    }

    /// Collect a signals snapshot and log anything alarming
    pub async fn run_health_check(&self) -> Result<SecuritySignals> {
        let _guard = TaskGuard::acquire(&self.health_running, "health check")?;

        let signals = self.snapshot_signals().await;
        if signals.encryption_failures > 0 || signals.decryption_failures > 0 {
            warn!(
                encryption = signals.encryption_failures,
                decryption = signals.decryption_failures,
                "Health check: cryptographic failures observed"
            );
        }
        if !signals.root_key_loaded {
            warn!("Health check: key manager is not initialized");
        }
        info!(
            active_keys = signals.active_keys,
            failed_logins = signals.failed_login_attempts,
            "Health check complete"
        );
        Ok(signals)
    }

    /// Run a full security audit over the current signals
    pub async fn run_full_audit(&self) -> Result<AuditResult> {
        let _guard = TaskGuard::acquire(&self.audit_trigger_running, "security audit")?;

        let signals = self.snapshot_signals().await;
        let result = self.audit.perform_security_audit(&signals).await?;
        self.bus.publish(SecurityEvent::AuditCompleted {
            audit_id: result.id,
            risk_level: result.risk_level,
            overall_score: result.overall_score,
        });
        Ok(result)
    }

    /// Run a compliance review
    pub async fn run_compliance_review(&self) -> Result<ComplianceReport> {
        let _guard = TaskGuard::acquire(&self.review_running, "compliance review")?;

        let report = self.workflow.generate_compliance_report().await;
        if report.retention.subjects_past_retention > 0 {
            warn!(
                count = report.retention.subjects_past_retention,
                "Compliance review: subjects past the retention window"
            );
        }
        if report.breaches.notification_overdue > 0 {
            warn!(
                count = report.breaches.notification_overdue,
                "Compliance review: overdue breach notifications"
            );
        }
        Ok(report)
    }

    /// Current orchestrator status
    pub async fn status(&self) -> OrchestratorStatus {
        let schedulers_running = self
            .tasks
            .lock()
            .map(|t| t.iter().any(|h| !h.is_finished()))
            .unwrap_or(false);
        OrchestratorStatus {
            security_level: self.level,
            services: ServiceStatus {
                keys: self.keys_active.load(Ordering::SeqCst),
                encryption: true,
                anonymization: true,
                audit: true,
                workflow: true,
            },
            schedulers_running,
            initialized_at: self.initialized_at.lock().ok().and_then(|at| *at),
        }
    }

    /// Aggregate report across key stats, latest audit, and compliance
    pub async fn report(&self) -> SecurityReport {
        SecurityReport {
            generated_at: Utc::now(),
            security_level: self.level,
            key_stats: self.keys.stats().await,
            latest_audit: self.audit.latest().await,
            compliance: self.workflow.generate_compliance_report().await,
            open_vulnerabilities: self.audit.open_vulnerabilities().await.len(),
        }
    }

    /// The profile derived from the configured security level
    pub fn profile(&self) -> &SecurityProfile {
        &self.profile
    }

    pub fn keys(&self) -> &Arc<KeyManager> {
        &self.keys
    }

    pub fn encryption(&self) -> &Arc<FieldEncryptionEngine> {
        &self.encryption
    }

    pub fn anonymization(&self) -> &Arc<AnonymizationEngine> {
        &self.anonymization
    }

    pub fn audit_engine(&self) -> &Arc<AuditEngine> {
        &self.audit
    }

    pub fn workflow(&self) -> &Arc<ComplianceWorkflowEngine> {
        &self.workflow
    }
}

/// Re-entrancy guard for one named task; released on drop
struct TaskGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TaskGuard<'a> {
    fn acquire(flag: &'a AtomicBool, task: &str) -> Result<Self> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CustodiaError::Validation(format!(
                "{task} already in progress"
            )));
        }
        Ok(Self { flag })
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

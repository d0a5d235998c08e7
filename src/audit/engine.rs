//! Security audit engine
//!
//! Runs the fixed check battery over a [`SecuritySignals`] snapshot, scores
//! each category, derives an overall risk level, evaluates compliance
//! frameworks, and keeps a bounded durable history of results.
//!
//! Scoring is deterministic: identical check outcomes always produce
//! identical scores, risk levels, and framework results.

use super::checks::{all_checks, SecurityCheck, SecuritySignals};
use super::models::{
    AuditCategory, AuditResult, CategoryScore, CheckOutcome, CheckResult, FrameworkScore,
    Recommendation, Vulnerability, VulnerabilityStatus,
};
use crate::config::schema::AuditConfig;
use crate::domain::{CustodiaError, Result, RiskLevel};
use crate::storage::{blob_names, BlobStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Compliance frameworks evaluated on every audit
const FRAMEWORKS: &[(&str, &[&str])] = &[
    (
        "GDPR",
        &[
            "dp-k-threshold",
            "dp-retention-bounds",
            "enc-authenticated-mode",
            "log-audit-trail",
            "authz-unauthorized-access",
        ],
    ),
    (
        "HIPAA",
        &[
            "enc-authenticated-mode",
            "enc-key-availability",
            "auth-root-secret",
            "log-audit-trail",
            "sess-stale-cleanup",
        ],
    ),
    (
        "SOC2",
        &[
            "auth-brute-force",
            "authz-unauthorized-access",
            "log-audit-trail",
            "err-unresolved-reports",
            "net-request-flood",
        ],
    ),
    (
        "ISO27001",
        &[
            "auth-root-secret",
            "enc-key-rotation",
            "dp-revocation-hygiene",
            "input-reject-rate",
            "sess-concurrency",
        ],
    ),
];

/// Durable audit state: bounded result history plus cumulative vulnerabilities
#[derive(Debug, Default, Serialize, Deserialize)]
struct AuditState {
    history: Vec<AuditResult>,
    vulnerabilities: Vec<Vulnerability>,
}

/// Security audit engine
pub struct AuditEngine {
    config: AuditConfig,
    store: Arc<dyn BlobStore>,
    running: AtomicBool,
    state: RwLock<AuditState>,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AuditEngine {
    /// Create an engine and load any persisted audit history
    pub async fn new(store: Arc<dyn BlobStore>, config: AuditConfig) -> Result<Self> {
        let state = match store.get(blob_names::AUDIT_HISTORY).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => AuditState::default(),
        };
        Ok(Self {
            config,
            store,
            running: AtomicBool::new(false),
            state: RwLock::new(state),
        })
    }

    /// Run the full check battery against a signals snapshot
    ///
    /// # Errors
    ///
    /// Returns `Validation` when an audit is already in progress; results
    /// are otherwise deterministic for identical signals.
    pub async fn perform_security_audit(&self, signals: &SecuritySignals) -> Result<AuditResult> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CustodiaError::Validation(
                "security audit already in progress".to_string(),
            ));
        }
        let _guard = RunningGuard(&self.running);

        let now = Utc::now();
        let checks = all_checks();
        let mut results = Vec::with_capacity(checks.len());
        let mut vulnerabilities = Vec::new();

        for check in &checks {
            let outcome = match check.evaluate(signals) {
                Ok(outcome) => outcome,
                Err(error) => {
                    // A broken check degrades to a warning, never aborts
                    warn!(check = check.id, %error, "Security check errored");
                    CheckOutcome::Warning
                }
            };
            if outcome == CheckOutcome::Fail {
                vulnerabilities.push(Vulnerability {
                    id: Uuid::new_v4(),
                    category: check.category,
                    check_id: check.id.to_string(),
                    description: check.description.to_string(),
                    severity: check.severity,
                    discovered_at: now,
                    status: VulnerabilityStatus::Open,
                });
            }
            results.push(CheckResult {
                check_id: check.id.to_string(),
                category: check.category,
                description: check.description.to_string(),
                severity: check.severity,
                outcome,
            });
        }

        let categories = score_categories(&results);
        let overall_score = round2(
            categories.iter().map(|c| c.score).sum::<f64>() / categories.len() as f64,
        );
        let risk_level = self.classify(overall_score);
        let frameworks = score_frameworks(&results);
        let recommendations = build_recommendations(&vulnerabilities, &categories, overall_score);

        let result = AuditResult {
            id: Uuid::new_v4(),
            performed_at: now,
            overall_score,
            risk_level,
            categories,
            vulnerabilities: vulnerabilities.clone(),
            frameworks,
            recommendations,
            checks_run: checks.len(),
        };

        self.record(&checks, &results, vulnerabilities, result.clone())
            .await?;

        info!(
            score = overall_score,
            risk = ?risk_level,
            vulnerabilities = result.vulnerabilities.len(),
            "Security audit complete"
        );

        Ok(result)
    }

    /// Latest audit result, if any
    pub async fn latest(&self) -> Option<AuditResult> {
        self.state.read().await.history.last().cloned()
    }

    /// Full retained history, oldest first
    pub async fn history(&self) -> Vec<AuditResult> {
        self.state.read().await.history.clone()
    }

    /// Cumulative vulnerabilities still open
    pub async fn open_vulnerabilities(&self) -> Vec<Vulnerability> {
        self.state
            .read()
            .await
            .vulnerabilities
            .iter()
            .filter(|v| v.status == VulnerabilityStatus::Open)
            .cloned()
            .collect()
    }

    fn classify(&self, score: f64) -> RiskLevel {
        let t = &self.config.risk_thresholds;
        if score >= t.very_low {
            RiskLevel::VeryLow
        } else if score >= t.low {
            RiskLevel::Low
        } else if score >= t.medium {
            RiskLevel::Medium
        } else if score >= t.high {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Append the result, reconcile the cumulative vulnerability list, persist
    async fn record(
        &self,
        checks: &[SecurityCheck],
        results: &[CheckResult],
        new_vulnerabilities: Vec<Vulnerability>,
        result: AuditResult,
    ) -> Result<()> {
        let passed_now: HashSet<&str> = results
            .iter()
            .filter(|r| r.outcome == CheckOutcome::Pass)
            .map(|r| r.check_id.as_str())
            .collect();
        let known_checks: HashSet<&str> = checks.iter().map(|c| c.id).collect();

        let mut state = self.state.write().await;

        for vulnerability in state.vulnerabilities.iter_mut() {
            if vulnerability.status == VulnerabilityStatus::Open
                && known_checks.contains(vulnerability.check_id.as_str())
                && passed_now.contains(vulnerability.check_id.as_str())
            {
                vulnerability.status = VulnerabilityStatus::Resolved;
            }
        }

        // One open entry per check id; repeated failures do not duplicate
        for vulnerability in new_vulnerabilities {
            let already_open = state.vulnerabilities.iter().any(|v| {
                v.status == VulnerabilityStatus::Open && v.check_id == vulnerability.check_id
            });
            if !already_open {
                state.vulnerabilities.push(vulnerability);
            }
        }

        state.history.push(result);
        let limit = self.config.history_limit.max(1);
        if state.history.len() > limit {
            let excess = state.history.len() - limit;
            state.history.drain(..excess);
        }

        let bytes = serde_json::to_vec_pretty(&*state)?;
        self.store.put(blob_names::AUDIT_HISTORY, &bytes).await
    }
}

fn score_categories(results: &[CheckResult]) -> Vec<CategoryScore> {
    AuditCategory::ALL
        .iter()
        .map(|&category| {
            let in_category: Vec<&CheckResult> =
                results.iter().filter(|r| r.category == category).collect();
            let passed = in_category
                .iter()
                .filter(|r| r.outcome == CheckOutcome::Pass)
                .count();
            let warnings = in_category
                .iter()
                .filter(|r| r.outcome == CheckOutcome::Warning)
                .count();
            let failed = in_category
                .iter()
                .filter(|r| r.outcome == CheckOutcome::Fail)
                .count();
            let total = in_category.len();
            let score = if total == 0 {
                100.0
            } else {
                round2((passed as f64 + 0.5 * warnings as f64) / total as f64 * 100.0)
            };
            CategoryScore {
                category,
                score,
                passed,
                warnings,
                failed,
                total,
            }
        })
        .collect()
}

fn score_frameworks(results: &[CheckResult]) -> Vec<FrameworkScore> {
    FRAMEWORKS
        .iter()
        .map(|(framework, requirements)| {
            let met = requirements
                .iter()
                .filter(|id| {
                    results
                        .iter()
                        .any(|r| r.check_id == **id && r.outcome != CheckOutcome::Fail)
                })
                .count();
            FrameworkScore {
                framework: framework.to_string(),
                requirements_met: met,
                requirements_total: requirements.len(),
                score: round2(met as f64 / requirements.len() as f64 * 100.0),
            }
        })
        .collect()
}

fn build_recommendations(
    vulnerabilities: &[Vulnerability],
    categories: &[CategoryScore],
    overall_score: f64,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = vulnerabilities
        .iter()
        .map(|v| Recommendation {
            priority: v.severity.priority(),
            category: Some(v.category),
            message: format!("Remediate failed check {}: {}", v.check_id, v.description),
        })
        .collect();

    if overall_score < 70.0 {
        recommendations.push(Recommendation {
            priority: 2,
            category: None,
            message: "Overall security score is below 70; schedule a remediation review"
                .to_string(),
        });
    }

    for category in categories.iter().filter(|c| c.score < 60.0) {
        recommendations.push(Recommendation {
            priority: 3,
            category: Some(category.category),
            message: format!(
                "Category {} scored {:.0}; review its failed and warned checks",
                category.category.label(),
                category.score
            ),
        });
    }

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;

    async fn engine() -> AuditEngine {
        AuditEngine::new(Arc::new(MemoryBlobStore::new()), AuditConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthy_signals_score_100() {
        let engine = engine().await;
        let result = engine
            .perform_security_audit(&SecuritySignals::default())
            .await
            .unwrap();

        assert_eq!(result.overall_score, 100.0);
        assert_eq!(result.risk_level, RiskLevel::VeryLow);
        assert!(result.vulnerabilities.is_empty());
        for framework in &result.frameworks {
            assert_eq!(framework.score, 100.0);
        }
    }

    #[tokio::test]
    async fn test_audit_is_deterministic() {
        let engine = engine().await;
        let signals = SecuritySignals {
            failed_login_attempts: 7,
            stale_sessions: 2,
            ..SecuritySignals::default()
        };

        let a = engine.perform_security_audit(&signals).await.unwrap();
        let b = engine.perform_security_audit(&signals).await.unwrap();

        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.risk_level, b.risk_level);
        assert_eq!(a.vulnerabilities.len(), b.vulnerabilities.len());
    }

    #[tokio::test]
    async fn test_failed_check_yields_one_vulnerability() {
        let engine = engine().await;
        let signals = SecuritySignals {
            unauthorized_access_attempts: 6,
            ..SecuritySignals::default()
        };
        let result = engine.perform_security_audit(&signals).await.unwrap();

        let matching: Vec<&Vulnerability> = result
            .vulnerabilities
            .iter()
            .filter(|v| v.check_id == "authz-unauthorized-access")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].severity, crate::domain::Severity::Critical);
    }

    #[tokio::test]
    async fn test_vulnerability_resolved_when_check_recovers() {
        let engine = engine().await;
        let bad = SecuritySignals {
            audit_logging_active: false,
            ..SecuritySignals::default()
        };
        engine.perform_security_audit(&bad).await.unwrap();
        assert_eq!(engine.open_vulnerabilities().await.len(), 1);

        engine
            .perform_security_audit(&SecuritySignals::default())
            .await
            .unwrap();
        assert!(engine.open_vulnerabilities().await.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_failure_does_not_duplicate_vulnerability() {
        let engine = engine().await;
        let bad = SecuritySignals {
            audit_logging_active: false,
            ..SecuritySignals::default()
        };
        engine.perform_security_audit(&bad).await.unwrap();
        engine.perform_security_audit(&bad).await.unwrap();
        assert_eq!(engine.open_vulnerabilities().await.len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let config = AuditConfig {
            history_limit: 3,
            ..AuditConfig::default()
        };
        let engine = AuditEngine::new(Arc::new(MemoryBlobStore::new()), config)
            .await
            .unwrap();
        for _ in 0..5 {
            engine
                .perform_security_audit(&SecuritySignals::default())
                .await
                .unwrap();
        }
        assert_eq!(engine.history().await.len(), 3);
    }

    #[tokio::test]
    async fn test_history_survives_reload() {
        let store = Arc::new(MemoryBlobStore::new());
        {
            let engine = AuditEngine::new(store.clone(), AuditConfig::default())
                .await
                .unwrap();
            engine
                .perform_security_audit(&SecuritySignals::default())
                .await
                .unwrap();
        }
        let reloaded = AuditEngine::new(store, AuditConfig::default())
            .await
            .unwrap();
        assert!(reloaded.latest().await.is_some());
    }

    #[tokio::test]
    async fn test_recommendations_sorted_by_priority() {
        let engine = engine().await;
        let signals = SecuritySignals {
            root_key_loaded: false,
            stale_sessions: 20,
            audit_logging_active: false,
            ..SecuritySignals::default()
        };
        let result = engine.perform_security_audit(&signals).await.unwrap();

        assert!(!result.recommendations.is_empty());
        let priorities: Vec<u8> = result.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }
}

//! Security auditing
//!
//! A fixed battery of named checks evaluates a runtime signals snapshot,
//! producing per-category scores, an overall risk level, compliance
//! framework results, vulnerabilities, and prioritized recommendations.

pub mod checks;
pub mod engine;
pub mod models;

pub use checks::{all_checks, SecurityCheck, SecuritySignals};
pub use engine::AuditEngine;
pub use models::{
    AuditCategory, AuditResult, CategoryScore, CheckOutcome, FrameworkScore, Recommendation,
    Vulnerability, VulnerabilityStatus,
};

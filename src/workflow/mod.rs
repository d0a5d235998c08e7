//! Regulatory compliance workflows
//!
//! Data-subject registration with jurisdiction inference, rights-request
//! handling with response deadlines, breach reporting with notification
//! deadlines, and aggregated compliance reporting. Subject data lives
//! behind the [`SubjectDataProvider`] seam.

pub mod engine;
pub mod jurisdiction;
pub mod models;
pub mod provider;

pub use engine::ComplianceWorkflowEngine;
pub use jurisdiction::Jurisdiction;
pub use models::{
    BreachDetails, BreachType, ComplianceReport, Consent, DataBreachRecord, DataSubject,
    ExercisedRight, ExportFormat, LegalBasis, ProcessingLogEntry, RequestDetails, RequestStatus,
    RightsRequest, RightsRequestType, SubjectDetails,
};
pub use provider::SubjectDataProvider;

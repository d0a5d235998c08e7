//! Security orchestration
//!
//! The [`SecurityOrchestrator`] composes the key, encryption,
//! anonymization, audit, and workflow engines behind one coordination
//! surface: security-level profiles, a broadcast event bus with wired
//! reactions, and guarded interval schedulers.

pub mod core;
pub mod events;
pub mod profile;

pub use self::core::{OrchestratorStatus, SecurityOrchestrator, SecurityReport, ServiceStatus};
pub use events::{EventBus, SecurityEvent};
pub use profile::SecurityProfile;

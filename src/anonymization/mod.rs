//! Statistical anonymization
//!
//! This module turns identifiable records into privacy-preserving ones.
//! Per-field strategies (removal, generalization, suppression, perturbation,
//! pseudonymization, date and location generalization) handle single records;
//! dataset passes (k-anonymity, l-diversity, differential privacy) handle
//! arrays of records. [`validate::validate_anonymization`] scores the result.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod strategies;
pub mod validate;

pub use config::{AnonymizationConfig, AnonymizationLevel};
pub use engine::{AnonymizationEngine, AnonymizationOptions, AnonymizedData};
pub use strategies::{AnonymizationRule, Strategy};
pub use validate::{validate_anonymization, ValidationReport};

//! Shared domain enums used across engines

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of protected data
///
/// Every category key, envelope, and sensitive-field rule is tagged with a
/// category. Categories partition key material: rotating or revoking one
/// category never touches another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Health and medical data
    Health,
    /// Directly identifying personal data (names, national IDs)
    Personal,
    /// Financial and payment data
    Financial,
    /// Biometric measurements
    Biometric,
    /// Contact details (email, phone, address)
    Contact,
    /// Technical identifiers (device IDs, IP addresses)
    Technical,
    /// Caller-defined category
    #[serde(untagged)]
    Other(String),
}

impl DataCategory {
    /// Stable string label used in envelopes and the key store
    pub fn label(&self) -> &str {
        match self {
            DataCategory::Health => "health",
            DataCategory::Personal => "personal",
            DataCategory::Financial => "financial",
            DataCategory::Biometric => "biometric",
            DataCategory::Contact => "contact",
            DataCategory::Technical => "technical",
            DataCategory::Other(s) => s.as_str(),
        }
    }

    /// Parse a label back into a category
    pub fn from_label(label: &str) -> Self {
        match label {
            "health" => DataCategory::Health,
            "personal" => DataCategory::Personal,
            "financial" => DataCategory::Financial,
            "biometric" => DataCategory::Biometric,
            "contact" => DataCategory::Contact,
            "technical" => DataCategory::Technical,
            other => DataCategory::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Severity of a vulnerability, check, or breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Recommendation priority derived from severity (1 = most urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Critical => 1,
            Severity::High => 2,
            Severity::Medium => 3,
            Severity::Low => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Overall risk classification of an audit result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::VeryLow => "very-low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

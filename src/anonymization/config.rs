//! Anonymization configuration

use crate::domain::{CustodiaError, Result};
use serde::{Deserialize, Serialize};

/// How aggressively records are anonymized when no explicit rules are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizationLevel {
    /// Pseudonymize direct identifiers, keep everything else
    Low,
    /// Suppress direct identifiers, generalize quasi-identifiers
    Medium,
    /// Remove direct identifiers, generalize quasi-identifiers
    #[default]
    High,
}

/// Anonymization configuration and dataset-pass parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    /// Default level applied when a call supplies no options
    #[serde(default)]
    pub level: AnonymizationLevel,

    /// Minimum group size for the k-anonymity pass
    #[serde(default = "default_k")]
    pub k: usize,

    /// Minimum distinct sensitive values per group for the l-diversity pass
    #[serde(default = "default_l")]
    pub l: usize,

    /// Privacy parameter for the differential-privacy pass (noise scale = 1/ε)
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Field names treated as quasi-identifiers in dataset passes
    #[serde(default = "default_quasi_identifiers")]
    pub quasi_identifiers: Vec<String>,

    /// Field names treated as sensitive attributes for l-diversity
    #[serde(default = "default_sensitive_attributes")]
    pub sensitive_attributes: Vec<String>,
}

fn default_k() -> usize {
    3
}

fn default_l() -> usize {
    2
}

fn default_epsilon() -> f64 {
    1.0
}

fn default_quasi_identifiers() -> Vec<String> {
    vec![
        "age".to_string(),
        "zip_code".to_string(),
        "postal_code".to_string(),
        "gender".to_string(),
        "city".to_string(),
    ]
}

fn default_sensitive_attributes() -> Vec<String> {
    vec!["diagnosis".to_string(), "health_condition".to_string()]
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            level: AnonymizationLevel::default(),
            k: default_k(),
            l: default_l(),
            epsilon: default_epsilon(),
            quasi_identifiers: default_quasi_identifiers(),
            sensitive_attributes: default_sensitive_attributes(),
        }
    }
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.k < 2 {
            return Err(CustodiaError::Configuration(
                "anonymization.k must be at least 2".to_string(),
            ));
        }
        if self.l < 1 {
            return Err(CustodiaError::Configuration(
                "anonymization.l must be at least 1".to_string(),
            ));
        }
        if self.epsilon <= 0.0 {
            return Err(CustodiaError::Configuration(
                "anonymization.epsilon must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnonymizationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_k_below_two_rejected() {
        let config = AnonymizationConfig {
            k: 1,
            ..AnonymizationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_epsilon_rejected() {
        let config = AnonymizationConfig {
            epsilon: 0.0,
            ..AnonymizationConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

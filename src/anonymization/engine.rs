//! Main anonymization engine
//!
//! Dispatches on the shape of the input (record, dataset, scalar), applies
//! per-field strategies, and runs the dataset-level passes in fixed order:
//! k-anonymity, l-diversity, differential privacy.
//!
//! # Examples
//!
//! ```
//! use custodia::anonymization::{AnonymizationEngine, AnonymizationOptions};
//! use custodia::anonymization::config::AnonymizationConfig;
//! use serde_json::json;
//!
//! # fn example() -> custodia::domain::Result<()> {
//! let engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//!
//! let record = json!({"name": "Jane", "ssn": "123-45-6789", "age": 41});
//! let result = engine.anonymize_data(&record, &AnonymizationOptions::default())?;
//!
//! assert!(result.data.get("name").is_none());
//! assert_eq!(result.data["age"], json!("35-44"));
//! # Ok(())
//! # }
//! ```

use super::config::{AnonymizationConfig, AnonymizationLevel};
use super::dataset::{
    apply_differential_privacy, apply_k_anonymity, apply_l_diversity, DatasetPassStats,
};
use super::strategies::{
    AnonymizationRule, DateGranularity, MaskLevel, Strategy, StrategyApplicator,
};
use crate::domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Per-call overrides for a single anonymization pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizationOptions {
    /// Level override; falls back to the configured default
    pub level: Option<AnonymizationLevel>,

    /// Explicit field rules; empty means "derive from level"
    #[serde(default)]
    pub rules: Vec<AnonymizationRule>,

    /// k override for the k-anonymity pass
    pub k: Option<usize>,

    /// l override for the l-diversity pass
    pub l: Option<usize>,

    /// ε override for the differential-privacy pass
    pub epsilon: Option<f64>,

    /// Quasi-identifier override
    pub quasi_identifiers: Option<Vec<String>>,

    /// Sensitive-attribute override
    pub sensitive_attributes: Option<Vec<String>>,
}

/// Provenance metadata attached to every anonymization result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizationMetadata {
    pub original_count: usize,
    pub final_count: usize,
    pub level: AnonymizationLevel,
    pub techniques: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// An anonymized value together with its provenance metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizedData {
    pub data: Value,
    pub metadata: AnonymizationMetadata,
}

/// Statistical anonymization engine
///
/// Thread-safe; pseudonymization keys are session-scoped and live inside
/// the engine, so pseudonyms are stable for the engine's lifetime.
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    applicator: StrategyApplicator,
}

impl AnonymizationEngine {
    /// Create an engine with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: AnonymizationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            applicator: StrategyApplicator::new(),
        })
    }

    /// Anonymize a value, dispatching on its shape
    ///
    /// - object → per-field strategy pass
    /// - array of objects → per-record pass, then k-anonymity, l-diversity,
    ///   and differential privacy in that order
    /// - scalar → full suppression
    pub fn anonymize_data(
        &self,
        data: &Value,
        options: &AnonymizationOptions,
    ) -> Result<AnonymizedData> {
        let level = options.level.unwrap_or(self.config.level);
        let rules = if options.rules.is_empty() {
            default_rules_for_level(level)
        } else {
            options.rules.clone()
        };

        let mut techniques = Vec::new();

        let (result, original_count, final_count) = match data {
            Value::Array(records) => {
                let anonymized = self.anonymize_dataset(records, &rules, options, &mut techniques)?;
                let counts = (records.len(), anonymized.len());
                (Value::Array(anonymized), counts.0, counts.1)
            }
            Value::Object(_) => {
                let record = self.anonymize_record(data, &rules, &mut techniques)?;
                (record, 1, 1)
            }
            scalar => {
                techniques.push("suppression".to_string());
                let suppressed = self.applicator.apply(
                    &Strategy::Suppression {
                        level: MaskLevel::Full,
                    },
                    scalar,
                )?;
                (suppressed.unwrap_or(Value::Null), 1, 1)
            }
        };

        techniques.sort();
        techniques.dedup();

        debug!(
            original = original_count,
            retained = final_count,
            level = ?level,
            "Anonymization pass complete"
        );

        Ok(AnonymizedData {
            data: result,
            metadata: AnonymizationMetadata {
                original_count,
                final_count,
                level,
                techniques,
                timestamp: Utc::now(),
            },
        })
    }

    fn anonymize_dataset(
        &self,
        records: &[Value],
        rules: &[AnonymizationRule],
        options: &AnonymizationOptions,
        techniques: &mut Vec<String>,
    ) -> Result<Vec<Value>> {
        let mut anonymized = Vec::with_capacity(records.len());
        for record in records {
            anonymized.push(self.anonymize_record(record, rules, techniques)?);
        }

        let k = options.k.unwrap_or(self.config.k);
        let l = options.l.unwrap_or(self.config.l);
        let epsilon = options.epsilon.unwrap_or(self.config.epsilon);
        let quasi = options
            .quasi_identifiers
            .as_ref()
            .unwrap_or(&self.config.quasi_identifiers);
        let sensitive = options
            .sensitive_attributes
            .as_ref()
            .unwrap_or(&self.config.sensitive_attributes);

        let mut stats = DatasetPassStats::default();

        let after_k = apply_k_anonymity(anonymized, quasi, k, &mut stats);
        techniques.push("k-anonymity".to_string());

        let after_l = apply_l_diversity(after_k, quasi, sensitive, l, &mut stats);
        techniques.push("l-diversity".to_string());

        let after_dp = apply_differential_privacy(after_l, quasi, epsilon, &mut stats);
        techniques.push("differential-privacy".to_string());

        debug!(
            groups = stats.groups_formed,
            dropped_k = stats.records_dropped_k,
            dropped_groups_l = stats.groups_dropped_l,
            noised = stats.fields_noised,
            "Dataset passes complete"
        );

        Ok(after_dp)
    }

    /// Apply field rules to one record, recursing into nested objects
    fn anonymize_record(
        &self,
        record: &Value,
        rules: &[AnonymizationRule],
        techniques: &mut Vec<String>,
    ) -> Result<Value> {
        match record {
            Value::Object(map) => {
                let mut out = Map::new();
                for (field, value) in map {
                    match rules.iter().find(|r| r.field.eq_ignore_ascii_case(field)) {
                        Some(rule) => {
                            techniques.push(technique_name(&rule.strategy).to_string());
                            if let Some(replacement) = self.applicator.apply(&rule.strategy, value)? {
                                out.insert(field.clone(), replacement);
                            }
                            // Removal: field omitted entirely
                        }
                        None => {
                            let child = self.anonymize_record(value, rules, techniques)?;
                            out.insert(field.clone(), child);
                        }
                    }
                }
                Ok(Value::Object(out))
            }
            Value::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for item in arr {
                    out.push(self.anonymize_record(item, rules, techniques)?);
                }
                Ok(Value::Array(out))
            }
            scalar => Ok(scalar.clone()),
        }
    }
}

fn technique_name(strategy: &Strategy) -> &'static str {
    match strategy {
        Strategy::Removal => "removal",
        Strategy::Generalization { .. } => "generalization",
        Strategy::Suppression { .. } => "suppression",
        Strategy::Perturbation { .. } => "perturbation",
        Strategy::Pseudonymization { .. } => "pseudonymization",
        Strategy::DateGeneralization { .. } => "date-generalization",
        Strategy::LocationGeneralization { .. } => "location-generalization",
    }
}

/// Field rules derived from a level when a call supplies none
pub fn default_rules_for_level(level: AnonymizationLevel) -> Vec<AnonymizationRule> {
    let identifier_fields = [
        "name",
        "full_name",
        "first_name",
        "last_name",
        "email",
        "phone",
        "phone_number",
        "address",
    ];
    let id_number_fields = ["ssn", "social_security_number", "national_id", "passport_number"];
    let dob_fields = ["dob", "date_of_birth", "birth_date"];

    let mut rules = Vec::new();

    let identifier_strategy = match level {
        AnonymizationLevel::Low => Strategy::Pseudonymization {
            category: "subject".to_string(),
        },
        AnonymizationLevel::Medium => Strategy::Suppression {
            level: MaskLevel::Partial,
        },
        AnonymizationLevel::High => Strategy::Removal,
    };

    for field in identifier_fields {
        rules.push(AnonymizationRule {
            field: field.to_string(),
            strategy: identifier_strategy.clone(),
        });
    }

    let id_number_strategy = match level {
        AnonymizationLevel::Low => Strategy::Suppression {
            level: MaskLevel::Partial,
        },
        _ => Strategy::Suppression {
            level: MaskLevel::Full,
        },
    };
    for field in id_number_fields {
        rules.push(AnonymizationRule {
            field: field.to_string(),
            strategy: id_number_strategy.clone(),
        });
    }

    if level != AnonymizationLevel::Low {
        rules.push(AnonymizationRule {
            field: "age".to_string(),
            strategy: Strategy::Generalization {
                precision: None,
                hierarchy: None,
                age_buckets: true,
            },
        });
        for field in dob_fields {
            rules.push(AnonymizationRule {
                field: field.to_string(),
                strategy: Strategy::DateGeneralization {
                    granularity: DateGranularity::Year,
                },
            });
        }
        rules.push(AnonymizationRule {
            field: "location".to_string(),
            strategy: Strategy::LocationGeneralization {
                grid_meters: 1000.0,
                address_parts: 2,
            },
        });
    }

    rules
}

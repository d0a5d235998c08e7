//! Sensitive-field detection rules
//!
//! One explicit, testable predicate table: an exact-name set plus compiled
//! regex patterns, each mapping a field name to a [`DataCategory`]. All
//! sensitivity decisions go through [`SensitiveFieldRules::match_field`];
//! nothing else in the crate inspects field names.

use crate::config::EncryptionConfig;
use crate::domain::{CustodiaError, DataCategory, Result};
use regex::Regex;
use std::collections::HashMap;

/// Field-name predicate table mapping matches to data categories
pub struct SensitiveFieldRules {
    exact: HashMap<String, DataCategory>,
    patterns: Vec<(Regex, DataCategory)>,
}

impl SensitiveFieldRules {
    /// Built-in rule set covering common identifying, health, financial,
    /// contact, biometric, and technical field names
    pub fn builtin() -> Self {
        let mut exact = HashMap::new();

        for name in ["ssn", "social_security_number", "national_id", "passport_number"] {
            exact.insert(name.to_string(), DataCategory::Personal);
        }
        for name in [
            "name",
            "first_name",
            "last_name",
            "full_name",
            "maiden_name",
            "dob",
            "date_of_birth",
            "birth_date",
        ] {
            exact.insert(name.to_string(), DataCategory::Personal);
        }
        for name in ["email", "phone", "phone_number", "address", "street_address"] {
            exact.insert(name.to_string(), DataCategory::Contact);
        }
        for name in [
            "medical_record_number",
            "diagnosis",
            "medication",
            "health_condition",
            "blood_type",
            "weight",
            "height",
            "heart_rate",
        ] {
            exact.insert(name.to_string(), DataCategory::Health);
        }
        for name in [
            "account_number",
            "credit_card",
            "card_number",
            "iban",
            "routing_number",
            "salary",
        ] {
            exact.insert(name.to_string(), DataCategory::Financial);
        }
        for name in ["fingerprint", "face_scan", "voice_print"] {
            exact.insert(name.to_string(), DataCategory::Biometric);
        }
        for name in ["password", "api_key", "access_token", "refresh_token", "device_id", "ip_address"] {
            exact.insert(name.to_string(), DataCategory::Technical);
        }

        let patterns = vec![
            (Regex::new(r"(?i)_ssn$").unwrap(), DataCategory::Personal),
            (Regex::new(r"(?i)^medical_").unwrap(), DataCategory::Health),
            (Regex::new(r"(?i)^health_").unwrap(), DataCategory::Health),
            (Regex::new(r"(?i)_dob$").unwrap(), DataCategory::Personal),
            (Regex::new(r"(?i)email").unwrap(), DataCategory::Contact),
            (Regex::new(r"(?i)phone").unwrap(), DataCategory::Contact),
            (Regex::new(r"(?i)password|secret|_token$").unwrap(), DataCategory::Technical),
            (Regex::new(r"(?i)card_number|_account$").unwrap(), DataCategory::Financial),
            (Regex::new(r"(?i)^biometric_").unwrap(), DataCategory::Biometric),
        ];

        Self { exact, patterns }
    }

    /// Built-in rules extended with configured extras
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::Configuration`] for an invalid extra regex.
    pub fn from_config(config: &EncryptionConfig) -> Result<Self> {
        let mut rules = Self::builtin();

        for entry in &config.extra_sensitive_fields {
            rules.exact.insert(
                entry.matcher.to_lowercase(),
                DataCategory::from_label(&entry.category),
            );
        }

        for entry in &config.extra_sensitive_patterns {
            let re = Regex::new(&entry.matcher).map_err(|e| {
                CustodiaError::Configuration(format!(
                    "invalid sensitive-field pattern '{}': {}",
                    entry.matcher, e
                ))
            })?;
            rules
                .patterns
                .push((re, DataCategory::from_label(&entry.category)));
        }

        Ok(rules)
    }

    /// Category for a field name, `None` if the field is not sensitive
    ///
    /// Exact matches (case-insensitive) win over patterns; patterns apply in
    /// declaration order.
    pub fn match_field(&self, field_name: &str) -> Option<&DataCategory> {
        let normalized = field_name.to_lowercase();
        if let Some(category) = self.exact.get(&normalized) {
            return Some(category);
        }
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(field_name))
            .map(|(_, category)| category)
    }
}

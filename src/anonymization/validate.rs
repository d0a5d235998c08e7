//! Anonymization quality validation
//!
//! Compares a record (or dataset) before and after anonymization and scores
//! the result on three weighted axes:
//!
//! - identifier removal (50%): direct identifiers gone or transformed
//! - utility retention (30%): non-identifying fields still usable
//! - residual risk (20%): quasi-identifiers no longer exact

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Direct identifiers checked during validation
const DIRECT_IDENTIFIERS: &[&str] = &[
    "name",
    "full_name",
    "first_name",
    "last_name",
    "email",
    "phone",
    "phone_number",
    "address",
    "ssn",
    "social_security_number",
    "national_id",
    "passport_number",
];

/// Quasi-identifiers checked for residual linkage risk
const QUASI_IDENTIFIERS: &[&str] = &["age", "zip_code", "postal_code", "gender", "city", "dob"];

/// Outcome of an anonymization validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Weighted total in 0..=100
    pub compliance_score: f64,
    /// Direct identifiers removed or transformed, 0..=100
    pub identifier_removal_score: f64,
    /// Non-identifying fields retained, 0..=100
    pub utility_score: f64,
    /// 100 minus residual re-identification exposure, 0..=100
    pub risk_score: f64,
    /// Direct identifiers that survived unchanged
    pub residual_identifiers: Vec<String>,
}

impl ValidationReport {
    /// True when no direct identifier survived unchanged
    pub fn is_compliant(&self) -> bool {
        self.residual_identifiers.is_empty()
    }
}

/// Score an anonymized value against its original
///
/// Arrays are validated record by record and the scores averaged; a
/// dataset that dropped records is compared over the retained prefix
/// count only, since dropped records leak nothing.
pub fn validate_anonymization(original: &Value, anonymized: &Value) -> ValidationReport {
    match (original, anonymized) {
        (Value::Array(before), Value::Array(after)) => {
            if after.is_empty() {
                return perfect_empty_report();
            }
            let reports: Vec<ValidationReport> = after
                .iter()
                .zip(before.iter())
                .map(|(a, b)| validate_record(b, a))
                .collect();
            average_reports(&reports)
        }
        _ => validate_record(original, anonymized),
    }
}

fn validate_record(original: &Value, anonymized: &Value) -> ValidationReport {
    let mut identifiers_seen = 0usize;
    let mut identifiers_neutralized = 0usize;
    let mut residual_identifiers = Vec::new();

    for field in DIRECT_IDENTIFIERS {
        let Some(before) = original.get(field) else {
            continue;
        };
        if before.is_null() {
            continue;
        }
        identifiers_seen += 1;
        match anonymized.get(field) {
            None => identifiers_neutralized += 1,
            Some(after) if after != before => identifiers_neutralized += 1,
            Some(_) => residual_identifiers.push(field.to_string()),
        }
    }

    let identifier_removal_score = if identifiers_seen == 0 {
        100.0
    } else {
        identifiers_neutralized as f64 / identifiers_seen as f64 * 100.0
    };

    let utility_score = utility(original, anonymized);
    let risk_score = residual_risk(original, anonymized);

    let compliance_score =
        identifier_removal_score * 0.5 + utility_score * 0.3 + risk_score * 0.2;

    ValidationReport {
        compliance_score: round2(compliance_score),
        identifier_removal_score: round2(identifier_removal_score),
        utility_score: round2(utility_score),
        risk_score: round2(risk_score),
        residual_identifiers,
    }
}

/// Fraction of non-identifying original fields still present
fn utility(original: &Value, anonymized: &Value) -> f64 {
    let Value::Object(before) = original else {
        return if anonymized.is_null() { 0.0 } else { 100.0 };
    };

    let non_identifying: Vec<&String> = before
        .keys()
        .filter(|k| !DIRECT_IDENTIFIERS.contains(&k.as_str()))
        .collect();

    if non_identifying.is_empty() {
        return 100.0;
    }

    let retained = non_identifying
        .iter()
        .filter(|k| {
            anonymized
                .get(k.as_str())
                .map(|v| !v.is_null())
                .unwrap_or(false)
        })
        .count();

    retained as f64 / non_identifying.len() as f64 * 100.0
}

/// 100 minus the share of quasi-identifiers that survived exactly
fn residual_risk(original: &Value, anonymized: &Value) -> f64 {
    let mut present = 0usize;
    let mut unchanged = 0usize;

    for field in QUASI_IDENTIFIERS {
        let Some(before) = original.get(field) else {
            continue;
        };
        if before.is_null() {
            continue;
        }
        present += 1;
        if anonymized.get(field) == Some(before) {
            unchanged += 1;
        }
    }

    if present == 0 {
        return 100.0;
    }
    100.0 - (unchanged as f64 / present as f64 * 100.0)
}

fn average_reports(reports: &[ValidationReport]) -> ValidationReport {
    let n = reports.len() as f64;
    let mut residual: Vec<String> = reports
        .iter()
        .flat_map(|r| r.residual_identifiers.iter().cloned())
        .collect();
    residual.sort();
    residual.dedup();

    ValidationReport {
        compliance_score: round2(reports.iter().map(|r| r.compliance_score).sum::<f64>() / n),
        identifier_removal_score: round2(
            reports.iter().map(|r| r.identifier_removal_score).sum::<f64>() / n,
        ),
        utility_score: round2(reports.iter().map(|r| r.utility_score).sum::<f64>() / n),
        risk_score: round2(reports.iter().map(|r| r.risk_score).sum::<f64>() / n),
        residual_identifiers: residual,
    }
}

fn perfect_empty_report() -> ValidationReport {
    ValidationReport {
        compliance_score: 100.0,
        identifier_removal_score: 100.0,
        utility_score: 0.0,
        risk_score: 100.0,
        residual_identifiers: Vec::new(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fully_anonymized_record_scores_high() {
        let original = json!({"name": "Jane", "ssn": "123-45-6789", "age": 41, "steps": 900});
        let anonymized = json!({"ssn": "***", "age": "35-44", "steps": 900});

        let report = validate_anonymization(&original, &anonymized);
        assert!(report.is_compliant());
        assert_eq!(report.identifier_removal_score, 100.0);
        assert_eq!(report.utility_score, 100.0);
        assert_eq!(report.risk_score, 100.0);
        assert_eq!(report.compliance_score, 100.0);
    }

    #[test]
    fn test_surviving_identifier_flagged() {
        let original = json!({"name": "Jane", "email": "j@example.com"});
        let anonymized = json!({"name": "Jane"});

        let report = validate_anonymization(&original, &anonymized);
        assert!(!report.is_compliant());
        assert_eq!(report.residual_identifiers, vec!["name".to_string()]);
        assert_eq!(report.identifier_removal_score, 50.0);
    }

    #[test]
    fn test_unchanged_quasi_identifier_raises_risk() {
        let original = json!({"age": 41, "zip_code": "12345"});
        let anonymized = json!({"age": "35-44", "zip_code": "12345"});

        let report = validate_anonymization(&original, &anonymized);
        assert_eq!(report.risk_score, 50.0);
    }

    #[test]
    fn test_dropped_fields_reduce_utility() {
        let original = json!({"steps": 900, "heart_rate": 70});
        let anonymized = json!({"steps": 900});

        let report = validate_anonymization(&original, &anonymized);
        assert_eq!(report.utility_score, 50.0);
    }

    #[test]
    fn test_dataset_scores_averaged() {
        let original = json!([
            {"name": "A", "steps": 1},
            {"name": "B", "steps": 2},
        ]);
        let anonymized = json!([
            {"steps": 1},
            {"name": "B", "steps": 2},
        ]);

        let report = validate_anonymization(&original, &anonymized);
        assert_eq!(report.identifier_removal_score, 50.0);
        assert_eq!(report.residual_identifiers, vec!["name".to_string()]);
    }

    #[test]
    fn test_empty_anonymized_dataset_is_compliant() {
        let original = json!([{"name": "A"}]);
        let anonymized = json!([]);
        let report = validate_anonymization(&original, &anonymized);
        assert!(report.is_compliant());
    }
}

//! Integration tests for the anonymization engine, covering single-record
//! strategies, dataset passes, and result validation

use custodia::anonymization::{
    validate_anonymization, AnonymizationConfig, AnonymizationEngine, AnonymizationLevel,
    AnonymizationOptions, AnonymizationRule, Strategy,
};
use serde_json::{json, Value};

fn engine() -> AnonymizationEngine {
    AnonymizationEngine::new(AnonymizationConfig::default()).unwrap()
}

fn patient_dataset() -> Value {
    json!([
        {"age": 30, "zip_code": "12345", "diagnosis": "flu", "steps": 900},
        {"age": 30, "zip_code": "12345", "diagnosis": "cold", "steps": 1100},
        {"age": 30, "zip_code": "12345", "diagnosis": "flu", "steps": 1000},
    ])
}

#[test]
fn test_high_level_record_anonymization() {
    let record = json!({"name": "Jane", "ssn": "123-45-6789", "age": 41});
    let result = engine()
        .anonymize_data(&record, &AnonymizationOptions::default())
        .unwrap();

    assert!(result.data.get("name").is_none());
    assert_eq!(result.data["ssn"], json!("***"));
    assert_eq!(result.data["age"], json!("35-44"));
}

#[test]
fn test_k_anonymity_retains_matching_group_and_drops_singleton() {
    let options = AnonymizationOptions {
        k: Some(2),
        l: Some(1),
        ..AnonymizationOptions::default()
    };

    // Two records sharing quasi-identifiers with k = 2 are both retained
    let pair = json!([
        {"age": 30, "zip_code": "12345"},
        {"age": 30, "zip_code": "12345"},
    ]);
    let result = engine().anonymize_data(&pair, &options).unwrap();
    assert_eq!(result.metadata.final_count, 2);

    // A unique third record forms a singleton group and is dropped
    let with_outlier = json!([
        {"age": 30, "zip_code": "12345"},
        {"age": 30, "zip_code": "12345"},
        {"age": 85, "zip_code": "99999"},
    ]);
    let result = engine().anonymize_data(&with_outlier, &options).unwrap();
    assert_eq!(result.metadata.original_count, 3);
    assert_eq!(result.metadata.final_count, 2);
}

#[test]
fn test_l_diversity_drops_homogeneous_groups() {
    let dataset = json!([
        {"age": 30, "zip_code": "1", "diagnosis": "flu"},
        {"age": 30, "zip_code": "1", "diagnosis": "flu"},
        {"age": 40, "zip_code": "2", "diagnosis": "flu"},
        {"age": 40, "zip_code": "2", "diagnosis": "cold"},
    ]);
    let options = AnonymizationOptions {
        k: Some(2),
        l: Some(2),
        ..AnonymizationOptions::default()
    };

    let result = engine().anonymize_data(&dataset, &options).unwrap();
    let records = result.data.as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Only the diverse age-40 group survives
    for record in records {
        assert_ne!(record["diagnosis"], json!(Value::Null));
    }
}

#[test]
fn test_differential_privacy_keeps_values_non_negative() {
    let options = AnonymizationOptions {
        k: Some(2),
        l: Some(1),
        epsilon: Some(0.1),
        ..AnonymizationOptions::default()
    };
    let result = engine().anonymize_data(&patient_dataset(), &options).unwrap();

    for record in result.data.as_array().unwrap() {
        if let Some(age) = record["age"].as_f64() {
            assert!(age >= 0.0);
        }
    }
    assert!(result
        .metadata
        .techniques
        .contains(&"differential-privacy".to_string()));
}

#[test]
fn test_explicit_rules_with_custom_strategies() {
    let record = json!({
        "patient_id": "p-1001",
        "admission_date": "2026-03-14",
        "address": "12 Main St, Springfield, IL",
        "weight": 180.0,
    });
    let options = AnonymizationOptions {
        rules: vec![
            AnonymizationRule {
                field: "patient_id".to_string(),
                strategy: Strategy::Pseudonymization {
                    category: "patient".to_string(),
                },
            },
            AnonymizationRule {
                field: "admission_date".to_string(),
                strategy: Strategy::from_name("date_generalization").unwrap(),
            },
            AnonymizationRule {
                field: "address".to_string(),
                strategy: Strategy::from_name("location_generalization").unwrap(),
            },
            AnonymizationRule {
                field: "weight".to_string(),
                strategy: Strategy::Perturbation { noise_factor: 0.05 },
            },
        ],
        ..AnonymizationOptions::default()
    };

    let result = engine().anonymize_data(&record, &options).unwrap();

    assert!(result.data["patient_id"].as_str().unwrap().starts_with("PATIENT_"));
    assert_eq!(result.data["admission_date"], json!("2026"));
    assert_eq!(result.data["address"], json!("Springfield, IL"));
    let weight = result.data["weight"].as_f64().unwrap();
    assert!(weight >= 0.0 && (weight - 180.0).abs() <= 9.01);
}

#[test]
fn test_pseudonyms_stable_within_session() {
    let engine = engine();
    let options = AnonymizationOptions {
        level: Some(AnonymizationLevel::Low),
        ..AnonymizationOptions::default()
    };
    let record = json!({"name": "Jane"});

    let a = engine.anonymize_data(&record, &options).unwrap();
    let b = engine.anonymize_data(&record, &options).unwrap();
    assert_eq!(a.data["name"], b.data["name"]);
}

#[test]
fn test_unknown_strategy_name_is_rejected() {
    assert!(Strategy::from_name("homomorphic").is_err());
}

#[test]
fn test_validation_scores_default_pipeline_compliant() {
    let original = json!({"name": "Jane", "ssn": "123-45-6789", "age": 41, "steps": 900});
    let result = engine()
        .anonymize_data(&original, &AnonymizationOptions::default())
        .unwrap();

    let report = validate_anonymization(&original, &result.data);
    assert!(report.is_compliant());
    assert!(report.compliance_score > 90.0);
}

#[test]
fn test_validation_flags_untouched_copy() {
    let original = json!({"name": "Jane", "age": 41});
    let report = validate_anonymization(&original, &original);

    assert!(!report.is_compliant());
    assert_eq!(report.identifier_removal_score, 0.0);
    assert_eq!(report.risk_score, 0.0);
}

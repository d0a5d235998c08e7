//! Dataset-level privacy passes
//!
//! Three passes run in fixed order over arrays of records:
//!
//! 1. **k-anonymity**: group records by their quasi-identifier combination;
//!    groups smaller than k get one generalization round where a
//!    quasi-identifier supports it, then still-small groups are dropped.
//! 2. **l-diversity**: each retained group must contain at least l distinct
//!    values per declared sensitive attribute, else the group is dropped.
//! 3. **differential privacy**: Laplace noise of scale 1/ε on numeric
//!    quasi-identifiers, clamped non-negative.
//!
//! The Laplace mechanism here is a simplified per-field noise injection,
//! not a formal privacy-budget accountant.

use super::strategies::age_bucket;
use rand::Rng;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Outcome of the dataset passes
#[derive(Debug, Clone, Default)]
pub struct DatasetPassStats {
    pub groups_formed: usize,
    pub records_dropped_k: usize,
    pub groups_dropped_l: usize,
    pub fields_noised: usize,
    pub generalization_rounds: usize,
}

/// Enforce k-anonymity over quasi-identifier combinations
///
/// Every retained group has size ≥ k; records in groups that stay below k
/// after one generalization round are dropped.
pub fn apply_k_anonymity(
    records: Vec<Value>,
    quasi_identifiers: &[String],
    k: usize,
    stats: &mut DatasetPassStats,
) -> Vec<Value> {
    if records.is_empty() || quasi_identifiers.is_empty() {
        return records;
    }

    let groups = group_by_signature(&records, quasi_identifiers);
    let any_small = groups.values().any(|idxs| idxs.len() < k);

    let records = if any_small {
        // One generalization round: widen quasi-identifiers, then regroup
        stats.generalization_rounds += 1;
        records
            .into_iter()
            .map(|r| generalize_quasi_identifiers(r, quasi_identifiers))
            .collect()
    } else {
        records
    };

    let groups = group_by_signature(&records, quasi_identifiers);
    stats.groups_formed = groups.len();

    let keep: HashSet<usize> = groups
        .values()
        .filter(|idxs| idxs.len() >= k)
        .flat_map(|idxs| idxs.iter().copied())
        .collect();

    stats.records_dropped_k = records.len() - keep.len();

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect()
}

/// Enforce l-diversity within each quasi-identifier group
///
/// A group that does not reach l distinct values for every declared
/// sensitive attribute is dropped entirely. Attributes with no non-null
/// value anywhere in the group carry no disclosure risk and do not count
/// against it.
pub fn apply_l_diversity(
    records: Vec<Value>,
    quasi_identifiers: &[String],
    sensitive_attributes: &[String],
    l: usize,
    stats: &mut DatasetPassStats,
) -> Vec<Value> {
    if records.is_empty() || sensitive_attributes.is_empty() || l <= 1 {
        return records;
    }

    let groups = group_by_signature(&records, quasi_identifiers);

    let keep: HashSet<usize> = groups
        .values()
        .filter(|idxs| {
            sensitive_attributes.iter().all(|attr| {
                let distinct: HashSet<String> = idxs
                    .iter()
                    .filter_map(|&i| records[i].get(attr))
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect();
                distinct.is_empty() || distinct.len() >= l
            })
        })
        .flat_map(|idxs| idxs.iter().copied())
        .collect();

    stats.groups_dropped_l = groups
        .values()
        .filter(|idxs| idxs.iter().any(|i| !keep.contains(i)))
        .count();

    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect()
}

/// Add Laplace noise to numeric quasi-identifiers
///
/// Noise scale is 1/ε; results are clamped non-negative and rounded to two
/// decimals.
pub fn apply_differential_privacy(
    records: Vec<Value>,
    quasi_identifiers: &[String],
    epsilon: f64,
    stats: &mut DatasetPassStats,
) -> Vec<Value> {
    let scale = 1.0 / epsilon;

    records
        .into_iter()
        .map(|mut record| {
            if let Value::Object(ref mut map) = record {
                for field in quasi_identifiers {
                    if let Some(Value::Number(n)) = map.get(field) {
                        let v = n.as_f64().unwrap_or(0.0);
                        let noised = (v + laplace_noise(scale)).max(0.0);
                        map.insert(field.clone(), json!((noised * 100.0).round() / 100.0));
                        stats.fields_noised += 1;
                    }
                }
            }
            record
        })
        .collect()
}

/// Sample Laplace(0, scale) by inverse CDF
fn laplace_noise(scale: f64) -> f64 {
    let u: f64 = rand::thread_rng().gen_range(-0.5..0.5);
    -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
}

/// Group record indices by their quasi-identifier signature
fn group_by_signature(
    records: &[Value],
    quasi_identifiers: &[String],
) -> HashMap<String, Vec<usize>> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let signature: Vec<String> = quasi_identifiers
            .iter()
            .map(|field| {
                record
                    .get(field)
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "\u{0}".to_string())
            })
            .collect();
        groups.entry(signature.join("|")).or_default().push(i);
    }
    groups
}

/// Widen quasi-identifier values one step
///
/// Ages collapse into buckets, other numerics round to tens, strings of
/// length > 3 (postal codes, cities) truncate to a 3-character prefix.
fn generalize_quasi_identifiers(mut record: Value, quasi_identifiers: &[String]) -> Value {
    let Value::Object(ref mut map) = record else {
        return record;
    };

    for field in quasi_identifiers {
        let Some(value) = map.get(field) else { continue };
        let widened = widen(field, value);
        if let Some(widened) = widened {
            map.insert(field.clone(), widened);
        }
    }
    record
}

fn widen(field: &str, value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64()?;
            if field.contains("age") {
                Some(Value::String(age_bucket(v).to_string()))
            } else {
                Some(json!((v / 10.0).round() * 10.0))
            }
        }
        Value::String(s) if s.chars().count() > 3 => {
            let prefix: String = s.chars().take(3).collect();
            Some(Value::String(format!("{prefix}*")))
        }
        _ => None,
    }
}

//! Per-field anonymization strategies
//!
//! Each strategy transforms one field value. Strategy application is pure
//! except for pseudonymization, which keys an HMAC digest with
//! session-scoped random material so pseudonyms are stable within a session
//! and unlinkable across sessions.

use crate::domain::{CustodiaError, Result};
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::Mutex;

type HmacSha256 = Hmac<Sha256>;

/// Masking depth for suppression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaskLevel {
    /// Replace the entire value with `***`
    #[default]
    Full,
    /// Keep leading and trailing characters, mask the middle
    Partial,
}

/// Date truncation granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    #[default]
    Year,
    Quarter,
    Month,
}

/// A per-field strategy with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Strategy {
    /// Drop the field entirely
    Removal,
    /// Age buckets, numeric rounding, hierarchy lookup, or text masking
    Generalization {
        /// Rounding step for numeric values (e.g. 10.0 rounds to tens)
        #[serde(default)]
        precision: Option<f64>,
        /// Categorical hierarchy; unmatched values become "other"
        #[serde(default)]
        hierarchy: Option<HashMap<String, String>>,
        /// Treat numeric values as ages and bucket them
        #[serde(default)]
        age_buckets: bool,
    },
    /// Full or partial masking
    Suppression {
        #[serde(default)]
        level: MaskLevel,
    },
    /// Magnitude-scaled noise, sign-preserving for non-negative inputs
    Perturbation {
        #[serde(default = "default_noise_factor")]
        noise_factor: f64,
    },
    /// Keyed digest, stable per session per category
    Pseudonymization {
        #[serde(default = "default_pseudonym_category")]
        category: String,
    },
    /// Truncate a date string to year, quarter, or month
    DateGeneralization {
        #[serde(default)]
        granularity: DateGranularity,
    },
    /// Snap coordinates to a grid or truncate an address
    LocationGeneralization {
        #[serde(default = "default_grid_meters")]
        grid_meters: f64,
        /// Number of trailing address components to keep
        #[serde(default = "default_address_parts")]
        address_parts: usize,
    },
}

fn default_noise_factor() -> f64 {
    0.1
}

fn default_pseudonym_category() -> String {
    "subject".to_string()
}

fn default_grid_meters() -> f64 {
    1000.0
}

fn default_address_parts() -> usize {
    2
}

impl Strategy {
    /// Parse a bare strategy name with default parameters
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::UnsupportedStrategy`] for unknown names.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "removal" => Ok(Strategy::Removal),
            "generalization" => Ok(Strategy::Generalization {
                precision: None,
                hierarchy: None,
                age_buckets: false,
            }),
            "suppression" => Ok(Strategy::Suppression {
                level: MaskLevel::default(),
            }),
            "perturbation" => Ok(Strategy::Perturbation {
                noise_factor: default_noise_factor(),
            }),
            "pseudonymization" => Ok(Strategy::Pseudonymization {
                category: default_pseudonym_category(),
            }),
            "date_generalization" => Ok(Strategy::DateGeneralization {
                granularity: DateGranularity::default(),
            }),
            "location_generalization" => Ok(Strategy::LocationGeneralization {
                grid_meters: default_grid_meters(),
                address_parts: default_address_parts(),
            }),
            other => Err(CustodiaError::UnsupportedStrategy(other.to_string())),
        }
    }
}

/// A field-to-strategy binding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationRule {
    /// Field name the rule applies to
    pub field: String,
    /// Strategy with parameters
    #[serde(flatten)]
    pub strategy: Strategy,
}

/// Applies strategies to field values
///
/// Holds the session-scoped pseudonymization keys; all other strategies are
/// stateless.
pub struct StrategyApplicator {
    pseudonym_keys: Mutex<HashMap<String, [u8; 32]>>,
}

impl StrategyApplicator {
    pub fn new() -> Self {
        Self {
            pseudonym_keys: Mutex::new(HashMap::new()),
        }
    }

    /// Apply a strategy to a value
    ///
    /// Returns `None` when the field should be removed from the record.
    pub fn apply(&self, strategy: &Strategy, value: &Value) -> Result<Option<Value>> {
        match strategy {
            Strategy::Removal => Ok(None),
            Strategy::Generalization {
                precision,
                hierarchy,
                age_buckets,
            } => Ok(Some(generalize(value, *precision, hierarchy.as_ref(), *age_buckets))),
            Strategy::Suppression { level } => Ok(Some(suppress(value, *level))),
            Strategy::Perturbation { noise_factor } => Ok(Some(perturb(value, *noise_factor))),
            Strategy::Pseudonymization { category } => {
                Ok(Some(Value::String(self.pseudonymize(category, value))))
            }
            Strategy::DateGeneralization { granularity } => {
                Ok(Some(generalize_date(value, *granularity)))
            }
            Strategy::LocationGeneralization {
                grid_meters,
                address_parts,
            } => Ok(Some(generalize_location(value, *grid_meters, *address_parts))),
        }
    }

    /// Keyed digest pseudonym, stable per session per category
    fn pseudonymize(&self, category: &str, value: &Value) -> String {
        let key = {
            let mut keys = self.pseudonym_keys.lock().unwrap();
            *keys.entry(category.to_string()).or_insert_with(|| {
                let mut key = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                key
            })
        };

        let canonical = value.to_string();
        let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
        mac.update(canonical.as_bytes());
        let digest = mac.finalize().into_bytes();
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();

        format!("{}_{}", category.to_uppercase(), &hex[..16])
    }
}

impl Default for StrategyApplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed age buckets used by generalization
pub fn age_bucket(age: f64) -> &'static str {
    match age as i64 {
        i64::MIN..=17 => "<18",
        18..=24 => "18-24",
        25..=34 => "25-34",
        35..=44 => "35-44",
        45..=54 => "45-54",
        55..=64 => "55-64",
        _ => "65+",
    }
}

fn generalize(
    value: &Value,
    precision: Option<f64>,
    hierarchy: Option<&HashMap<String, String>>,
    age_buckets: bool,
) -> Value {
    match value {
        Value::Number(n) => {
            let v = n.as_f64().unwrap_or(0.0);
            if age_buckets {
                return Value::String(age_bucket(v).to_string());
            }
            let step = precision.unwrap_or(10.0);
            let rounded = (v / step).round() * step;
            json!(rounded)
        }
        Value::String(s) => {
            if let Some(hierarchy) = hierarchy {
                return Value::String(
                    hierarchy
                        .get(s)
                        .cloned()
                        .unwrap_or_else(|| "other".to_string()),
                );
            }
            // Text: keep the first character, mask the rest
            let masked = match s.chars().next() {
                Some(first) => format!("{first}***"),
                None => "***".to_string(),
            };
            Value::String(masked)
        }
        other => other.clone(),
    }
}

fn suppress(value: &Value, level: MaskLevel) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match level {
        MaskLevel::Full => Value::String("***".to_string()),
        MaskLevel::Partial => {
            if text.chars().count() <= 4 {
                return Value::String("***".to_string());
            }
            let chars: Vec<char> = text.chars().collect();
            let masked: String = chars
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    if i < 2 || i >= chars.len() - 2 {
                        *c
                    } else {
                        '*'
                    }
                })
                .collect();
            Value::String(masked)
        }
    }
}

fn perturb(value: &Value, noise_factor: f64) -> Value {
    let Value::Number(n) = value else {
        return value.clone();
    };
    let v = n.as_f64().unwrap_or(0.0);

    let magnitude = v.abs().max(1.0);
    let noise = rand::thread_rng().gen_range(-1.0..1.0) * noise_factor * magnitude;
    let mut perturbed = v + noise;

    // An originally non-negative value never goes negative
    if v >= 0.0 {
        perturbed = perturbed.max(0.0);
    }

    json!((perturbed * 100.0).round() / 100.0)
}

fn generalize_date(value: &Value, granularity: DateGranularity) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };

    // Expect an ISO-ish prefix: YYYY-MM-...
    let year: String = s.chars().take(4).collect();
    if year.chars().count() < 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return Value::String("***".to_string());
    }

    let month: Option<u32> = s
        .get(5..7)
        .and_then(|m| m.parse().ok())
        .filter(|m| (1..=12).contains(m));

    let generalized = match (granularity, month) {
        (DateGranularity::Year, _) | (_, None) => year.to_string(),
        (DateGranularity::Month, Some(m)) => format!("{year}-{m:02}"),
        (DateGranularity::Quarter, Some(m)) => format!("{year}-Q{}", (m - 1) / 3 + 1),
    };
    Value::String(generalized)
}

fn generalize_location(value: &Value, grid_meters: f64, address_parts: usize) -> Value {
    match value {
        Value::Object(map) if map.contains_key("lat") && map.contains_key("lon") => {
            let lat = map.get("lat").and_then(Value::as_f64).unwrap_or(0.0);
            let lon = map.get("lon").and_then(Value::as_f64).unwrap_or(0.0);

            // One degree of latitude is roughly 111,320 meters
            let cell = grid_meters / 111_320.0;
            let snap = |coord: f64| ((coord / cell).floor() * cell * 1e6).round() / 1e6;

            json!({"lat": snap(lat), "lon": snap(lon)})
        }
        Value::String(address) => {
            let parts: Vec<&str> = address.split(',').map(str::trim).collect();
            if parts.len() <= address_parts {
                return Value::String(address.clone());
            }
            Value::String(parts[parts.len() - address_parts..].join(", "))
        }
        other => other.clone(),
    }
}

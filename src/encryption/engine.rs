//! Field encryption engine
//!
//! Walks arbitrary nested JSON records, replaces sensitive leaves with
//! [`EncryptedEnvelope`]s on the way to persistence, and restores them on
//! load. Whole-value protection is available via [`FieldEncryptionEngine::encrypt_data`].
//!
//! # Examples
//!
//! ```no_run
//! use custodia::config::{secret_string, EncryptionConfig, KeysConfig};
//! use custodia::domain::DataCategory;
//! use custodia::encryption::FieldEncryptionEngine;
//! use custodia::keys::KeyManager;
//! use custodia::storage::MemoryBlobStore;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> custodia::domain::Result<()> {
//! let keys = Arc::new(KeyManager::new(Arc::new(MemoryBlobStore::new()), KeysConfig::default()));
//! keys.initialize(&secret_string("session-secret")).await?;
//!
//! let engine = FieldEncryptionEngine::new(keys, EncryptionConfig::default())?;
//!
//! let record = json!({"weight": 180, "note": "post-workout"});
//! let protected = engine.encrypt_sensitive_fields(&record, &DataCategory::Health).await?;
//! let restored = engine.decrypt_sensitive_fields(&protected).await?;
//! assert_eq!(restored, record);
//! # Ok(())
//! # }
//! ```

use super::envelope::EncryptedEnvelope;
use super::fields::SensitiveFieldRules;
use crate::config::EncryptionConfig;
use crate::domain::{CustodiaError, DataCategory, Result};
use crate::keys::KeyManager;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;
use std::io::{Read, Write};
use std::sync::Arc;
use tracing::debug;

/// One step into a nested JSON value
#[derive(Debug, Clone, PartialEq)]
enum PathSeg {
    Key(String),
    Index(usize),
}

/// Encrypts and decrypts sensitive fields in JSON records
///
/// Field sensitivity is decided by one [`SensitiveFieldRules`] predicate
/// table; key material stays inside the injected [`KeyManager`].
pub struct FieldEncryptionEngine {
    keys: Arc<KeyManager>,
    rules: SensitiveFieldRules,
    config: EncryptionConfig,
}

impl FieldEncryptionEngine {
    /// Create an engine over a key manager
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::Configuration`] for invalid extra
    /// sensitive-field patterns.
    pub fn new(keys: Arc<KeyManager>, config: EncryptionConfig) -> Result<Self> {
        let rules = SensitiveFieldRules::from_config(&config)?;
        Ok(Self {
            keys,
            rules,
            config,
        })
    }

    /// Replace every matched sensitive leaf with an encrypted envelope
    ///
    /// Recursively walks nested objects and arrays. Null leaves and values
    /// that are already envelopes are left untouched. Fields whose name
    /// matches a rule use the rule's category; `default_category` is used
    /// for the metadata of untagged matches only in the sense that a
    /// rule-less caller can still force whole-record protection via
    /// [`Self::encrypt_data`].
    pub async fn encrypt_sensitive_fields(
        &self,
        record: &Value,
        default_category: &DataCategory,
    ) -> Result<Value> {
        let mut targets = Vec::new();
        collect_sensitive_paths(&self.rules, record, &mut Vec::new(), &mut targets);

        let mut output = record.clone();
        let target_count = targets.len();
        for (path, category) in targets {
            let category = category.unwrap_or_else(|| default_category.clone());
            let current = get_at_path(&output, &path)
                .ok_or_else(|| CustodiaError::Other("path vanished during walk".to_string()))?
                .clone();
            let envelope = self.build_envelope(&current, &category).await?;
            replace_at_path(&mut output, &path, envelope.to_value()?);
        }

        debug!(fields = target_count, "Encrypted sensitive fields");
        Ok(output)
    }

    /// Restore every envelope found anywhere in the record
    ///
    /// # Errors
    ///
    /// - [`CustodiaError::AuthenticationFailure`] for tampered payloads
    /// - [`CustodiaError::KeyNotFound`] when a recorded category's key is
    ///   missing or revoked
    /// - [`CustodiaError::Serialization`] for malformed envelopes
    pub async fn decrypt_sensitive_fields(&self, record: &Value) -> Result<Value> {
        let mut targets = Vec::new();
        collect_envelope_paths(record, &mut Vec::new(), &mut targets);

        let mut output = record.clone();
        for path in targets {
            let current = get_at_path(&output, &path)
                .ok_or_else(|| CustodiaError::Other("path vanished during walk".to_string()))?
                .clone();
            let envelope = EncryptedEnvelope::from_value(&current)?;
            let plaintext = self.open_envelope(&envelope).await?;
            replace_at_path(&mut output, &path, plaintext);
        }

        Ok(output)
    }

    /// Encrypt a whole value into a single envelope
    pub async fn encrypt_data(&self, value: &Value, category: &DataCategory) -> Result<Value> {
        let envelope = self.build_envelope(value, category).await?;
        envelope.to_value()
    }

    /// Decrypt a value produced by [`Self::encrypt_data`]
    pub async fn decrypt_data(&self, value: &Value) -> Result<Value> {
        if !EncryptedEnvelope::is_envelope(value) {
            return Err(CustodiaError::Serialization(
                "value is not an encrypted envelope".to_string(),
            ));
        }
        let envelope = EncryptedEnvelope::from_value(value)?;
        self.open_envelope(&envelope).await
    }

    async fn build_envelope(
        &self,
        value: &Value,
        category: &DataCategory,
    ) -> Result<EncryptedEnvelope> {
        let plaintext = serde_json::to_vec(value)?;

        let (body, compressed) = self.maybe_compress(&plaintext)?;
        let sealed = self.keys.encrypt_for_category(category, &body).await?;

        Ok(EncryptedEnvelope::new(
            category.label().to_string(),
            compressed,
            &sealed,
        ))
    }

    async fn open_envelope(&self, envelope: &EncryptedEnvelope) -> Result<Value> {
        let category = DataCategory::from_label(&envelope.key_category);
        let sealed = envelope.sealed_bytes()?;
        let body = self.keys.decrypt_for_category(&category, &sealed).await?;

        let plaintext = if envelope.compressed {
            decompress(&body)?
        } else {
            body
        };

        serde_json::from_slice(&plaintext)
            .map_err(|e| CustodiaError::Serialization(format!("malformed plaintext: {e}")))
    }

    fn maybe_compress(&self, plaintext: &[u8]) -> Result<(Vec<u8>, bool)> {
        if !self.config.compression_enabled || plaintext.len() < self.config.compression_threshold
        {
            return Ok((plaintext.to_vec(), false));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(plaintext)
            .and_then(|_| encoder.finish())
            .map(|compressed| {
                if compressed.len() < plaintext.len() {
                    (compressed, true)
                } else {
                    (plaintext.to_vec(), false)
                }
            })
            .map_err(|e| CustodiaError::Crypto(format!("compression failed: {e}")))
    }
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| CustodiaError::Serialization(format!("decompression failed: {e}")))?;
    Ok(out)
}

/// Collect paths of sensitive, non-null, not-yet-encrypted leaves
fn collect_sensitive_paths(
    rules: &SensitiveFieldRules,
    value: &Value,
    path: &mut Vec<PathSeg>,
    out: &mut Vec<(Vec<PathSeg>, Option<DataCategory>)>,
) {
    match value {
        Value::Object(map) => {
            if EncryptedEnvelope::is_envelope(value) {
                return;
            }
            for (key, child) in map {
                path.push(PathSeg::Key(key.clone()));
                if let Some(category) = rules.match_field(key) {
                    if !child.is_null() && !EncryptedEnvelope::is_envelope(child) {
                        out.push((path.clone(), Some(category.clone())));
                    }
                } else {
                    collect_sensitive_paths(rules, child, path, out);
                }
                path.pop();
            }
        }
        Value::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                path.push(PathSeg::Index(i));
                collect_sensitive_paths(rules, child, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Collect paths of every envelope in the value
fn collect_envelope_paths(value: &Value, path: &mut Vec<PathSeg>, out: &mut Vec<Vec<PathSeg>>) {
    if EncryptedEnvelope::is_envelope(value) {
        out.push(path.clone());
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                path.push(PathSeg::Key(key.clone()));
                collect_envelope_paths(child, path, out);
                path.pop();
            }
        }
        Value::Array(arr) => {
            for (i, child) in arr.iter().enumerate() {
                path.push(PathSeg::Index(i));
                collect_envelope_paths(child, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

fn get_at_path<'a>(value: &'a Value, path: &[PathSeg]) -> Option<&'a Value> {
    let mut current = value;
    for seg in path {
        current = match seg {
            PathSeg::Key(k) => current.get(k)?,
            PathSeg::Index(i) => current.get(i)?,
        };
    }
    Some(current)
}

fn replace_at_path(value: &mut Value, path: &[PathSeg], replacement: Value) {
    let Some((last, rest)) = path.split_last() else {
        *value = replacement;
        return;
    };

    let mut current = value;
    for seg in rest {
        current = match seg {
            PathSeg::Key(k) => match current.get_mut(k) {
                Some(v) => v,
                None => return,
            },
            PathSeg::Index(i) => match current.get_mut(i) {
                Some(v) => v,
                None => return,
            },
        };
    }

    match last {
        PathSeg::Key(k) => {
            if let Value::Object(map) = current {
                map.insert(k.clone(), replacement);
            }
        }
        PathSeg::Index(i) => {
            if let Value::Array(arr) = current {
                if *i < arr.len() {
                    arr[*i] = replacement;
                }
            }
        }
    }
}

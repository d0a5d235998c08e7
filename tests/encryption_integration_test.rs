//! Integration tests for the key manager and field encryption engine
//! running against an on-disk blob store

use custodia::config::{secret_string, EncryptionConfig, KeysConfig};
use custodia::domain::{CustodiaError, DataCategory};
use custodia::encryption::{generate_data_hash, verify_data_hash, FieldEncryptionEngine};
use custodia::keys::KeyManager;
use custodia::storage::FileBlobStore;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn fast_keys_config(dir: &TempDir) -> KeysConfig {
    KeysConfig {
        store_dir: dir.path().to_path_buf(),
        argon2_memory_kib: 8192,
        argon2_iterations: 1,
    }
}

async fn engine_in(dir: &TempDir) -> (FieldEncryptionEngine, Arc<KeyManager>) {
    let store = Arc::new(FileBlobStore::new(dir.path()).await.unwrap());
    let keys = Arc::new(KeyManager::new(store, fast_keys_config(dir)));
    keys.initialize(&secret_string("integration secret")).await.unwrap();
    let engine = FieldEncryptionEngine::new(keys.clone(), EncryptionConfig::default()).unwrap();
    (engine, keys)
}

#[tokio::test]
async fn test_whole_value_round_trip() {
    let dir = TempDir::new().unwrap();
    let (engine, _) = engine_in(&dir).await;

    let value = json!({"weight": 180});
    let sealed = engine.encrypt_data(&value, &DataCategory::Health).await.unwrap();
    assert_eq!(sealed["encrypted"], json!(true));
    assert_eq!(sealed["algorithm"], json!("aes-256-gcm"));

    let restored = engine.decrypt_data(&sealed).await.unwrap();
    assert_eq!(restored, value);
}

#[tokio::test]
async fn test_sensitive_field_round_trip_through_disk_store() {
    let dir = TempDir::new().unwrap();
    let (engine, _) = engine_in(&dir).await;

    let record = json!({
        "patient": {
            "name": "Jane Doe",
            "ssn": "123-45-6789",
            "diagnosis": "hypertension",
        },
        "visits": [{"email": "jane@example.com", "steps": 900}],
    });

    let protected = engine
        .encrypt_sensitive_fields(&record, &DataCategory::Personal)
        .await
        .unwrap();

    // Sensitive leaves are envelopes, non-sensitive ones untouched
    assert_eq!(protected["patient"]["name"]["encrypted"], json!(true));
    assert_eq!(protected["patient"]["ssn"]["encrypted"], json!(true));
    assert_eq!(protected["visits"][0]["email"]["encrypted"], json!(true));
    assert_eq!(protected["visits"][0]["steps"], json!(900));

    let restored = engine.decrypt_sensitive_fields(&protected).await.unwrap();
    assert_eq!(restored, record);
}

#[tokio::test]
async fn test_tampered_payload_fails_authentication() {
    let dir = TempDir::new().unwrap();
    let (engine, _) = engine_in(&dir).await;

    let sealed = engine
        .encrypt_data(&json!({"weight": 180}), &DataCategory::Health)
        .await
        .unwrap();

    let mut tampered = sealed.clone();
    let payload = tampered["payload"].as_str().unwrap().to_string();
    let mut bytes: Vec<char> = payload.chars().collect();
    let mid = bytes.len() / 2;
    bytes[mid] = if bytes[mid] == 'A' { 'B' } else { 'A' };
    tampered["payload"] = json!(bytes.into_iter().collect::<String>());

    let result = engine.decrypt_data(&tampered).await;
    assert!(matches!(
        result,
        Err(CustodiaError::AuthenticationFailure(_)) | Err(CustodiaError::Serialization(_))
    ));
}

#[tokio::test]
async fn test_decryption_survives_key_rotation() {
    let dir = TempDir::new().unwrap();
    let (engine, keys) = engine_in(&dir).await;

    let sealed = engine
        .encrypt_data(&json!({"weight": 180}), &DataCategory::Health)
        .await
        .unwrap();

    // The previous key is retained for a rollback window
    keys.rotate(&DataCategory::Health).await.unwrap();
    let restored = engine.decrypt_data(&sealed).await.unwrap();
    assert_eq!(restored, json!({"weight": 180}));
}

#[tokio::test]
async fn test_revoked_category_rejects_encryption() {
    let dir = TempDir::new().unwrap();
    let (engine, keys) = engine_in(&dir).await;

    keys.get_or_create_key(&DataCategory::Financial).await.unwrap();
    keys.revoke(&DataCategory::Financial, "suspected compromise")
        .await
        .unwrap();

    let result = engine
        .encrypt_data(&json!({"iban": "DE89"}), &DataCategory::Financial)
        .await;
    assert!(matches!(result, Err(CustodiaError::KeyNotFound(_))));
}

#[tokio::test]
async fn test_keys_persist_across_restart() {
    let dir = TempDir::new().unwrap();
    let sealed = {
        let (engine, _) = engine_in(&dir).await;
        engine
            .encrypt_data(&json!({"weight": 180}), &DataCategory::Health)
            .await
            .unwrap()
    };

    // A fresh manager over the same directory and secret opens the blob
    let (engine, _) = engine_in(&dir).await;
    let restored = engine.decrypt_data(&sealed).await.unwrap();
    assert_eq!(restored, json!({"weight": 180}));
}

#[tokio::test]
async fn test_wrong_root_secret_cannot_open_store() {
    let dir = TempDir::new().unwrap();
    {
        let (_, keys) = engine_in(&dir).await;
        keys.get_or_create_key(&DataCategory::Health).await.unwrap();
    }

    let store = Arc::new(FileBlobStore::new(dir.path()).await.unwrap());
    let keys = KeyManager::new(store, fast_keys_config(&dir));
    let result = keys.initialize(&secret_string("wrong secret")).await;
    assert!(matches!(result, Err(CustodiaError::AuthenticationFailure(_))));
}

#[tokio::test]
async fn test_integrity_hash_detects_mutation() {
    let record = json!({"b": 2, "a": 1});
    let hash = generate_data_hash(&record).unwrap();

    // Key order does not matter, values do
    assert!(verify_data_hash(&json!({"a": 1, "b": 2}), &hash).unwrap());
    assert!(!verify_data_hash(&json!({"a": 1, "b": 3}), &hash).unwrap());
}

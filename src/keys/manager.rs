//! Key manager
//!
//! Owns all category keys, sealed at rest in a single blob under a root key
//! derived from the session root secret. The root secret is intentionally
//! never durably persisted: losing it makes the key blob unrecoverable
//! (containment over recoverability).

use super::aead;
use super::material::{CategoryKey, KeyMetadata, KeyStats};
use crate::config::{KeysConfig, SecretString};
use crate::domain::{CustodiaError, DataCategory, Result};
use crate::storage::{blob_names, BlobStore};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

const SALT_LEN: usize = 16;

struct Inner {
    root_key: Option<Zeroizing<Vec<u8>>>,
    keys: HashMap<String, CategoryKey>,
}

/// Generates, stores, rotates, and revokes symmetric keys per data category
///
/// All mutations hold the internal write lock across mutate-then-persist, so
/// a concurrent reader never observes a half-written key store.
///
/// # Examples
///
/// ```no_run
/// use custodia::config::{secret_string, KeysConfig};
/// use custodia::domain::DataCategory;
/// use custodia::keys::KeyManager;
/// use custodia::storage::MemoryBlobStore;
/// use std::sync::Arc;
///
/// # async fn example() -> custodia::domain::Result<()> {
/// let store = Arc::new(MemoryBlobStore::new());
/// let manager = KeyManager::new(store, KeysConfig::default());
/// manager.initialize(&secret_string("session-secret")).await?;
///
/// let meta = manager.get_or_create_key(&DataCategory::Health).await?;
/// println!("key {} created", meta.id);
/// # Ok(())
/// # }
/// ```
pub struct KeyManager {
    store: Arc<dyn BlobStore>,
    config: KeysConfig,
    inner: RwLock<Inner>,
}

impl KeyManager {
    /// Create an uninitialized manager over a blob store
    pub fn new(store: Arc<dyn BlobStore>, config: KeysConfig) -> Self {
        Self {
            store,
            config,
            inner: RwLock::new(Inner {
                root_key: None,
                keys: HashMap::new(),
            }),
        }
    }

    /// Establish the root key and load the durable key blob
    ///
    /// Derives a 32-byte root key from the session root secret via Argon2id
    /// with a persisted salt, then opens the encrypted key blob if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::AuthenticationFailure`] when an existing key
    /// blob does not open under the derived root key (wrong root secret),
    /// and [`CustodiaError::Configuration`] for derivation-parameter
    /// failures.
    pub async fn initialize(&self, root_secret: &SecretString) -> Result<()> {
        let salt = self.load_or_create_salt().await?;
        let root_key = self.derive_root_key(root_secret, &salt)?;

        let keys = match self.store.get(blob_names::KEY_MATERIAL).await? {
            Some(sealed) => {
                let plaintext = aead::open(&root_key, &sealed)?;
                let keys: HashMap<String, CategoryKey> = serde_json::from_slice(&plaintext)
                    .map_err(|e| {
                        CustodiaError::Serialization(format!("malformed key blob: {e}"))
                    })?;
                debug!(key_count = keys.len(), "Loaded existing key blob");
                keys
            }
            None => {
                debug!("No key blob found, starting with an empty key store");
                HashMap::new()
            }
        };

        let mut inner = self.inner.write().await;
        inner.root_key = Some(root_key);
        inner.keys = keys;

        info!(key_count = inner.keys.len(), "Key manager initialized");
        Ok(())
    }

    /// Return the current key for a category, creating one on first use
    ///
    /// # Errors
    ///
    /// Returns [`CustodiaError::KeyNotFound`] if the category's key is
    /// revoked.
    pub async fn get_or_create_key(&self, category: &DataCategory) -> Result<KeyMetadata> {
        {
            let inner = self.inner.read().await;
            self.require_root(&inner)?;
            if let Some(key) = inner.keys.get(category.label()) {
                if key.revoked {
                    return Err(CustodiaError::KeyNotFound(format!(
                        "key for category '{category}' is revoked"
                    )));
                }
                return Ok(key.metadata());
            }
        }

        let mut inner = self.inner.write().await;
        self.require_root(&inner)?;
        // Another task may have created it between the locks
        if let Some(key) = inner.keys.get(category.label()) {
            if key.revoked {
                return Err(CustodiaError::KeyNotFound(format!(
                    "key for category '{category}' is revoked"
                )));
            }
            return Ok(key.metadata());
        }

        let key = CategoryKey::new(category.clone(), aead::random_key().to_vec());
        let meta = key.metadata();
        inner.keys.insert(category.label().to_string(), key);
        self.persist_locked(&inner).await?;

        info!(category = %category, key_id = %meta.id, "Created category key");
        Ok(meta)
    }

    /// Seal plaintext under a category's current key
    pub async fn encrypt_for_category(
        &self,
        category: &DataCategory,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.get_or_create_key(category).await?;
        let inner = self.inner.read().await;
        let key = inner
            .keys
            .get(category.label())
            .ok_or_else(|| CustodiaError::KeyNotFound(category.label().to_string()))?;
        aead::seal(&key.material, plaintext)
    }

    /// Open a payload under a category's current key, falling back to the
    /// retained previous key (rollback window)
    ///
    /// # Errors
    ///
    /// - [`CustodiaError::KeyNotFound`] for unknown or revoked categories
    /// - [`CustodiaError::AuthenticationFailure`] when neither the current
    ///   nor the previous key opens the payload
    pub async fn decrypt_for_category(
        &self,
        category: &DataCategory,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let inner = self.inner.read().await;
        self.require_root(&inner)?;
        let key = inner.keys.get(category.label()).ok_or_else(|| {
            CustodiaError::KeyNotFound(format!("no key for category '{category}'"))
        })?;

        if key.revoked {
            return Err(CustodiaError::KeyNotFound(format!(
                "key for category '{category}' is revoked"
            )));
        }

        match aead::open(&key.material, data) {
            Ok(plaintext) => Ok(plaintext),
            Err(CustodiaError::AuthenticationFailure(_)) => {
                if let Some(ref previous) = key.previous_material {
                    aead::open(previous, data)
                } else {
                    Err(CustodiaError::AuthenticationFailure(
                        "integrity tag mismatch".to_string(),
                    ))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Seal arbitrary bytes under the root key
    pub async fn encrypt_with_root(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let inner = self.inner.read().await;
        let root = self.require_root(&inner)?;
        aead::seal(root, plaintext)
    }

    /// Open bytes previously sealed under the root key
    pub async fn decrypt_with_root(&self, data: &[u8]) -> Result<Vec<u8>> {
        let inner = self.inner.read().await;
        let root = self.require_root(&inner)?;
        aead::open(root, data)
    }

    /// Rotate a category's key to fresh random material
    ///
    /// The previous material is retained so envelopes sealed before the
    /// rotation still open during the rollback window.
    pub async fn rotate(&self, category: &DataCategory) -> Result<KeyMetadata> {
        self.rotate_with_secret(category, aead::random_key().to_vec())
            .await
    }

    /// Rotate a category's key to caller-supplied 32-byte material
    pub async fn rotate_with_secret(
        &self,
        category: &DataCategory,
        new_material: Vec<u8>,
    ) -> Result<KeyMetadata> {
        if new_material.len() != aead::KEY_LEN {
            return Err(CustodiaError::Crypto(format!(
                "rotation material must be {} bytes",
                aead::KEY_LEN
            )));
        }

        let mut inner = self.inner.write().await;
        self.require_root(&inner)?;
        let key = inner.keys.get_mut(category.label()).ok_or_else(|| {
            CustodiaError::KeyNotFound(format!("no key for category '{category}'"))
        })?;

        if key.revoked {
            return Err(CustodiaError::KeyNotFound(format!(
                "key for category '{category}' is revoked"
            )));
        }

        key.previous_material = Some(std::mem::replace(&mut key.material, new_material));
        key.rotation_count += 1;
        let meta = key.metadata();

        self.persist_locked(&inner).await?;

        info!(
            category = %category,
            rotation_count = meta.rotation_count,
            "Rotated category key"
        );
        Ok(meta)
    }

    /// Revoke a category's key
    ///
    /// The record is kept (keys are never deleted); all subsequent
    /// operations against the category fail with
    /// [`CustodiaError::KeyNotFound`].
    pub async fn revoke(&self, category: &DataCategory, reason: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        self.require_root(&inner)?;
        let key = inner.keys.get_mut(category.label()).ok_or_else(|| {
            CustodiaError::KeyNotFound(format!("no key for category '{category}'"))
        })?;

        key.revoked = true;
        key.revocation_reason = Some(reason.to_string());

        self.persist_locked(&inner).await?;

        warn!(category = %category, reason, "Revoked category key");
        Ok(())
    }

    /// Non-secret metadata for every key record
    pub async fn list_metadata(&self) -> Vec<KeyMetadata> {
        let inner = self.inner.read().await;
        let mut list: Vec<KeyMetadata> = inner.keys.values().map(|k| k.metadata()).collect();
        list.sort_by(|a, b| a.category.label().cmp(b.category.label()));
        list
    }

    /// Aggregate key-store statistics
    pub async fn stats(&self) -> KeyStats {
        let inner = self.inner.read().await;
        let revoked = inner.keys.values().filter(|k| k.revoked).count();
        KeyStats {
            total_keys: inner.keys.len(),
            active_keys: inner.keys.len() - revoked,
            revoked_keys: revoked,
            total_rotations: inner.keys.values().map(|k| k.rotation_count as u64).sum(),
        }
    }

    /// Whether `initialize` has completed successfully
    pub async fn is_initialized(&self) -> bool {
        self.inner.read().await.root_key.is_some()
    }

    fn require_root<'a>(&self, inner: &'a Inner) -> Result<&'a [u8]> {
        inner
            .root_key
            .as_deref()
            .map(|k| k as &[u8])
            .ok_or_else(|| CustodiaError::Configuration("key manager not initialized".to_string()))
    }

    async fn persist_locked(&self, inner: &Inner) -> Result<()> {
        let root = self.require_root(inner)?;
        let plaintext = serde_json::to_vec(&inner.keys)?;
        let sealed = aead::seal(root, &plaintext)?;
        self.store.put(blob_names::KEY_MATERIAL, &sealed).await
    }

    async fn load_or_create_salt(&self) -> Result<Vec<u8>> {
        if let Some(salt) = self.store.get(blob_names::KEY_SALT).await? {
            if salt.len() != SALT_LEN {
                return Err(CustodiaError::Storage(
                    "persisted derivation salt has unexpected length".to_string(),
                ));
            }
            return Ok(salt);
        }

        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        self.store.put(blob_names::KEY_SALT, &salt).await?;
        Ok(salt)
    }

    fn derive_root_key(
        &self,
        root_secret: &SecretString,
        salt: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let params = Params::new(
            self.config.argon2_memory_kib,
            self.config.argon2_iterations,
            1,
            Some(aead::KEY_LEN),
        )
        .map_err(|e| CustodiaError::Configuration(format!("invalid Argon2 parameters: {e}")))?;

        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let mut out = Zeroizing::new(vec![0u8; aead::KEY_LEN]);
        argon
            .hash_password_into(root_secret.expose_secret().as_bytes(), salt, &mut out)
            .map_err(|e| CustodiaError::Crypto(format!("root key derivation failed: {e}")))?;

        Ok(out)
    }
}

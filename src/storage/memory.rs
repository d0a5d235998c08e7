//! In-memory blob store for tests and volatile deployments

use super::traits::BlobStore;
use crate::domain::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Blob store held entirely in memory
///
/// Used by tests and by embedders that accept losing state on restart.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(name).cloned())
    }

    async fn put(&self, name: &str, data: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .await
            .insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(name))
    }
}

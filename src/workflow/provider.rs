//! Subject data collaborator seam
//!
//! The workflow engine owns subject registrations and request records but
//! not the subject data itself. A [`SubjectDataProvider`] supplies, corrects,
//! erases, and anonymizes that data on the engine's behalf.

use crate::domain::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Data-plane collaborator for rights-request fulfilment
#[async_trait]
pub trait SubjectDataProvider: Send + Sync {
    /// All personal data held for a subject, as one JSON document
    async fn fetch_subject_data(&self, subject_id: &str) -> Result<Value>;

    /// Apply field corrections for a rectification request
    async fn apply_corrections(
        &self,
        subject_id: &str,
        corrections: &Map<String, Value>,
    ) -> Result<()>;

    /// Erase a subject's data; `categories` of `None` means everything.
    /// Returns the number of records erased.
    async fn erase_subject_data(
        &self,
        subject_id: &str,
        categories: Option<&[String]>,
    ) -> Result<u64>;

    /// Anonymize a subject's data in place (breach response)
    async fn anonymize_subject_data(&self, subject_id: &str) -> Result<()>;
}

#[cfg(test)]
pub mod test_support {
    //! In-memory provider used by the engine tests

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryProvider {
        pub data: Mutex<Map<String, Value>>,
        pub erased: Mutex<Vec<String>>,
        pub anonymized: Mutex<Vec<String>>,
    }

    impl MemoryProvider {
        pub fn with_subject(subject_id: &str, data: Value) -> Self {
            let provider = Self::default();
            provider
                .data
                .lock()
                .unwrap()
                .insert(subject_id.to_string(), data);
            provider
        }
    }

    #[async_trait]
    impl SubjectDataProvider for MemoryProvider {
        async fn fetch_subject_data(&self, subject_id: &str) -> Result<Value> {
            Ok(self
                .data
                .lock()
                .unwrap()
                .get(subject_id)
                .cloned()
                .unwrap_or(Value::Null))
        }

        async fn apply_corrections(
            &self,
            subject_id: &str,
            corrections: &Map<String, Value>,
        ) -> Result<()> {
            let mut data = self.data.lock().unwrap();
            if let Some(Value::Object(record)) = data.get_mut(subject_id) {
                for (field, value) in corrections {
                    record.insert(field.clone(), value.clone());
                }
            }
            Ok(())
        }

        async fn erase_subject_data(
            &self,
            subject_id: &str,
            _categories: Option<&[String]>,
        ) -> Result<u64> {
            self.erased.lock().unwrap().push(subject_id.to_string());
            Ok(u64::from(
                self.data.lock().unwrap().remove(subject_id).is_some(),
            ))
        }

        async fn anonymize_subject_data(&self, subject_id: &str) -> Result<()> {
            self.anonymized.lock().unwrap().push(subject_id.to_string());
            Ok(())
        }
    }
}

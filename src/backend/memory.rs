use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::backend::SecretStore;
use crate::errors::{Error, Result};

/// In-memory store for embedded usage and tests.
///
/// A configured payload limit is enforced on write the way a platform store
/// would reject an oversized entry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    payload_limit: Option<usize>,
}

impl MemoryStore {
    /// Construct a store without a payload cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a store that rejects entries larger than `limit` bytes.
    pub fn with_payload_limit(limit: Option<usize>) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            payload_limit: limit,
        }
    }

    /// Keys currently stored for `service`, in sorted order.
    pub fn entry_keys(&self, service: &str) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        entries
            .keys()
            .filter(|(stored_service, _)| stored_service.as_str() == service)
            .map(|(_, key)| key.clone())
            .collect()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn write_entry(&self, service: &str, key: &str, value: &[u8]) -> Result<()> {
        if let Some(limit) = self.payload_limit {
            if value.len() > limit {
                return Err(Error::Backend(format!(
                    "payload of {} bytes exceeds the {limit}-byte entry limit",
                    value.len()
                )));
            }
        }

        let mut entries = self.entries.lock().unwrap();
        entries.insert((service.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    async fn read_entry(&self, service: &str, key: &str) -> Result<Vec<u8>> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(&(service.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(key.to_string()))
    }

    fn payload_limit(&self) -> Option<usize> {
        self.payload_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entry_round_trip() {
        let store = MemoryStore::new();
        store.write_entry("app", "token", b"value").await.unwrap();

        assert_eq!(store.read_entry("app", "token").await.unwrap(), b"value");
        assert_eq!(store.entry_keys("app"), vec!["token".to_string()]);
    }

    #[tokio::test]
    async fn missing_entry_is_not_found() {
        let store = MemoryStore::new();
        let err = store.read_entry("app", "token").await.unwrap_err();
        assert_eq!(err, Error::EntryNotFound("token".into()));
    }

    #[tokio::test]
    async fn payload_limit_is_enforced() {
        let store = MemoryStore::with_payload_limit(Some(4));
        store.write_entry("app", "small", b"1234").await.unwrap();

        let err = store.write_entry("app", "big", b"12345").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[tokio::test]
    async fn services_are_isolated() {
        let store = MemoryStore::new();
        store.write_entry("app-a", "token", b"a").await.unwrap();
        store.write_entry("app-b", "token", b"b").await.unwrap();

        assert_eq!(store.read_entry("app-a", "token").await.unwrap(), b"a");
        assert_eq!(store.entry_keys("app-b"), vec!["token".to_string()]);
    }
}

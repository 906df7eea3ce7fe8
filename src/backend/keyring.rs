//! OS keychain adapter over the `keyring` crate (feature `os-keyring`).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keyring::Entry;

use crate::backend::SecretStore;
use crate::errors::{Error, Result};

/// Windows caps credential blobs at 2560 bytes; 1920 raw bytes encode to
/// exactly that.
const WINDOWS_ENTRY_LIMIT: usize = 1920;

/// Store backed by the platform secret service (Keychain, Credential
/// Manager, Secret Service).
///
/// The platform APIs take passwords as text, so payloads are base64-encoded
/// on write and decoded on read. The `keyring` crate is synchronous; calls
/// are bridged through `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    payload_limit: Option<usize>,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    /// Store with the platform-appropriate payload limit.
    pub fn new() -> Self {
        Self {
            payload_limit: platform_payload_limit(),
        }
    }

    /// Override the per-entry payload limit (`None` = unlimited).
    pub fn with_payload_limit(limit: Option<usize>) -> Self {
        Self {
            payload_limit: limit,
        }
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn write_entry(&self, service: &str, key: &str, value: &[u8]) -> Result<()> {
        let service = service.to_string();
        let key = key.to_string();
        let encoded = STANDARD.encode(value);

        tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key).map_err(|err| map_error(&key, err))?;
            entry
                .set_password(&encoded)
                .map_err(|err| map_error(&key, err))
        })
        .await
        .map_err(|err| Error::Backend(err.to_string()))?
    }

    async fn read_entry(&self, service: &str, key: &str) -> Result<Vec<u8>> {
        let service = service.to_string();
        let key = key.to_string();

        let encoded = tokio::task::spawn_blocking(move || {
            let entry = Entry::new(&service, &key).map_err(|err| map_error(&key, err))?;
            entry.get_password().map_err(|err| map_error(&key, err))
        })
        .await
        .map_err(|err| Error::Backend(err.to_string()))??;

        STANDARD
            .decode(encoded)
            .map_err(|err| Error::Backend(err.to_string()))
    }

    fn payload_limit(&self) -> Option<usize> {
        self.payload_limit
    }
}

fn platform_payload_limit() -> Option<usize> {
    if cfg!(windows) {
        Some(WINDOWS_ENTRY_LIMIT)
    } else {
        None
    }
}

fn map_error(key: &str, err: keyring::Error) -> Error {
    match err {
        keyring::Error::NoEntry => Error::EntryNotFound(key.to_string()),
        keyring::Error::PlatformFailure(inner) => Error::BackendUnavailable(inner.to_string()),
        keyring::Error::NoStorageAccess(inner) => Error::BackendUnavailable(inner.to_string()),
        other => Error::Backend(other.to_string()),
    }
}

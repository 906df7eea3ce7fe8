//! The store capability the chunk jobs are built on.

use async_trait::async_trait;

use crate::errors::Result;

#[cfg(feature = "os-keyring")]
pub mod keyring;
mod memory;

pub use memory::MemoryStore;

/// An addressable secret store keyed by `(service, key)`.
///
/// Operations complete asynchronously and report every failure as an
/// [`Error`](crate::Error) value. Jobs issue at most one operation at a time
/// against the keys they derive; implementations need no ordering
/// guarantees beyond completing each call.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Store `value` under `(service, key)`, replacing any previous entry.
    async fn write_entry(&self, service: &str, key: &str, value: &[u8]) -> Result<()>;

    /// Fetch the entry stored under `(service, key)`.
    async fn read_entry(&self, service: &str, key: &str) -> Result<Vec<u8>>;

    /// Hard per-entry payload cap, or `None` when the platform imposes no
    /// limit (which collapses chunking to a single entry).
    fn payload_limit(&self) -> Option<usize> {
        None
    }
}

#[async_trait]
impl<T> SecretStore for Box<T>
where
    T: SecretStore + ?Sized,
{
    async fn write_entry(&self, service: &str, key: &str, value: &[u8]) -> Result<()> {
        (**self).write_entry(service, key, value).await
    }

    async fn read_entry(&self, service: &str, key: &str) -> Result<Vec<u8>> {
        (**self).read_entry(service, key).await
    }

    fn payload_limit(&self) -> Option<usize> {
        (**self).payload_limit()
    }
}

#[async_trait]
impl<T> SecretStore for std::sync::Arc<T>
where
    T: SecretStore + ?Sized,
{
    async fn write_entry(&self, service: &str, key: &str, value: &[u8]) -> Result<()> {
        (**self).write_entry(service, key, value).await
    }

    async fn read_entry(&self, service: &str, key: &str) -> Result<Vec<u8>> {
        (**self).read_entry(service, key).await
    }

    fn payload_limit(&self) -> Option<usize> {
        (**self).payload_limit()
    }
}

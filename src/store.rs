//! Caller-facing surface pairing a store with chunking and retry policy.

use std::sync::Arc;

use crate::backend::SecretStore;
use crate::blocking;
use crate::config::{ChunkConfig, RetryPolicy};
use crate::errors::Result;
use crate::job::{ReadJob, WriteJob};
use crate::types::AccountScope;

/// High-level API over a [`SecretStore`]: splits writes into chunks, chains
/// reads back together, and offers blocking variants for synchronous call
/// sites.
///
/// A `ChunkedStore` serializes the operations of each job it runs, but two
/// concurrent calls against the same key race; callers serialize those
/// themselves.
pub struct ChunkedStore {
    store: Arc<dyn SecretStore>,
    service: String,
    config: ChunkConfig,
    retry: RetryPolicy,
    key_prefix: Option<String>,
}

impl ChunkedStore {
    /// Start building a store for the given service name.
    pub fn builder(store: Arc<dyn SecretStore>, service: impl Into<String>) -> ChunkedStoreBuilder {
        ChunkedStoreBuilder {
            store,
            service: service.into(),
            config: None,
            retry: None,
            key_prefix: None,
        }
    }

    /// Store with configuration derived from the store's capabilities and
    /// the environment.
    pub fn new(store: Arc<dyn SecretStore>, service: impl Into<String>) -> Self {
        Self::builder(store, service).build()
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Persist `data` under `name`, splitting it into store-sized chunks.
    ///
    /// Data beyond `max_chunks` entries is silently dropped; callers that
    /// must not lose bytes check [`ChunkConfig::max_payload`] first.
    pub async fn write(
        &self,
        scope: Option<&AccountScope>,
        name: &str,
        data: &[u8],
        insecure_fallback: bool,
    ) -> Result<()> {
        let mut job = WriteJob::new(
            self.service.as_str(),
            scope.cloned(),
            self.qualified_name(name),
            data.to_vec(),
            self.config,
        )
        .with_insecure_fallback(insecure_fallback);
        job.run(self.store.as_ref()).await
    }

    /// Reassemble the secret stored under `name`.
    ///
    /// `migration` derives the legacy key form (account id omitted) to
    /// locate entries written under the old naming scheme.
    pub async fn read(
        &self,
        scope: Option<&AccountScope>,
        name: &str,
        migration: bool,
        insecure_fallback: bool,
    ) -> Result<Vec<u8>> {
        let mut job = ReadJob::new(
            self.service.as_str(),
            scope.cloned(),
            self.qualified_name(name),
            self.config,
        )
        .with_migration(migration)
        .with_insecure_fallback(insecure_fallback)
        .with_retry_policy(self.retry.clone());
        job.run(self.store.as_ref()).await?;
        Ok(job.into_data())
    }

    /// Blocking variant of [`ChunkedStore::write`].
    pub fn write_sync(
        &self,
        scope: Option<&AccountScope>,
        name: &str,
        data: &[u8],
        insecure_fallback: bool,
    ) -> Result<()> {
        blocking::run_to_completion(self.write(scope, name, data, insecure_fallback))
    }

    /// Blocking variant of [`ChunkedStore::read`].
    pub fn read_sync(
        &self,
        scope: Option<&AccountScope>,
        name: &str,
        migration: bool,
        insecure_fallback: bool,
    ) -> Result<Vec<u8>> {
        blocking::run_to_completion(self.read(scope, name, migration, insecure_fallback))
    }

    fn qualified_name(&self, name: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

/// Builder for [`ChunkedStore`].
pub struct ChunkedStoreBuilder {
    store: Arc<dyn SecretStore>,
    service: String,
    config: Option<ChunkConfig>,
    retry: Option<RetryPolicy>,
    key_prefix: Option<String>,
}

impl ChunkedStoreBuilder {
    /// Override the chunking configuration (default: derived from the
    /// store's reported payload limit).
    pub fn config(mut self, config: ChunkConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the retry policy (default: one attempt, environment-tunable
    /// delay).
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Application-identifying prefix folded into every logical key name
    /// once, before derivation, for stores whose native namespacing is
    /// unreliable.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> ChunkedStore {
        let config = self
            .config
            .unwrap_or_else(|| ChunkConfig::for_store(self.store.as_ref()));
        ChunkedStore {
            store: self.store,
            service: self.service,
            config,
            retry: self.retry.unwrap_or_default(),
            key_prefix: self.key_prefix,
        }
    }
}

//! Chunked persistence of arbitrarily sized secrets over size-capped
//! key/value secret stores.
//!
//! Platform secret services cap how large a single entry may be; a
//! 4096-bit private key already exceeds what Windows credential storage
//! accepts. This crate splits a secret across numbered entries on write and
//! chains the reads back together, storing the first chunk under the plain
//! key so entries written by non-chunking versions keep resolving. Store
//! operations complete asynchronously and are driven one at a time through
//! explicit job state machines; a blocking adapter covers synchronous call
//! sites.

pub mod backend;
pub mod blocking;
pub mod config;
pub mod errors;
pub mod job;
pub mod keys;
pub mod store;
pub mod types;

#[cfg(feature = "os-keyring")]
pub use backend::keyring::KeyringStore;
pub use backend::{MemoryStore, SecretStore};
pub use blocking::run_to_completion;
pub use config::{
    ChunkConfig, RetryPolicy, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS, DEFAULT_RETRY_DELAY,
};
pub use errors::{Error, Result};
pub use job::{Job, JobState, ReadJob, WriteJob};
pub use keys::{derive_key, KeyMode};
pub use store::{ChunkedStore, ChunkedStoreBuilder};
pub use types::AccountScope;

use crate::backend::SecretStore;
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-entry chunk size used when the store caps payloads (the 2048-byte
/// split lets 4096-bit private keys fit Windows credential entries).
pub const DEFAULT_CHUNK_SIZE: usize = 2048;

/// Ceiling on how many entries a single secret may occupy.
pub const DEFAULT_MAX_CHUNKS: usize = 10;

/// Wait before reissuing a chunk read after a transient store failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

const RETRY_DELAY_ENV: &str = "CHUNKED_SECRETS_RETRY_DELAY_MS";

/// How a secret is split across store entries.
///
/// `chunk_size == None` means the store imposes no per-entry cap and the
/// whole payload travels as a single chunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkConfig {
    chunk_size: Option<usize>,
    max_chunks: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self::capped(DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS)
    }
}

impl ChunkConfig {
    /// Split payloads into `chunk_size`-byte entries, at most `max_chunks`
    /// of them. Both values are clamped to at least 1.
    pub fn capped(chunk_size: usize, max_chunks: usize) -> Self {
        Self {
            chunk_size: Some(chunk_size.max(1)),
            max_chunks: max_chunks.max(1),
        }
    }

    /// Configuration for stores without a payload cap: one entry holds the
    /// whole secret, collapsing both job state machines to one round trip.
    pub fn uncapped() -> Self {
        Self {
            chunk_size: None,
            max_chunks: 1,
        }
    }

    /// Derive the configuration from a store's reported payload limit.
    pub fn for_store(store: &dyn SecretStore) -> Self {
        match store.payload_limit() {
            Some(limit) => Self::capped(limit, DEFAULT_MAX_CHUNKS),
            None => Self::uncapped(),
        }
    }

    pub fn chunk_size(&self) -> Option<usize> {
        self.chunk_size
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Largest payload that survives a write/read round trip, `None` when
    /// the store is uncapped.
    pub fn max_payload(&self) -> Option<usize> {
        self.chunk_size.map(|size| size * self.max_chunks)
    }

    /// Take the next chunk off the front of `pending` (all of it when the
    /// store is uncapped or the remainder fits in one entry).
    pub(crate) fn take_chunk(&self, pending: &mut Vec<u8>) -> Vec<u8> {
        match self.chunk_size {
            Some(size) if pending.len() > size => {
                let rest = pending.split_off(size);
                std::mem::replace(pending, rest)
            }
            _ => std::mem::take(pending),
        }
    }
}

/// Retry behaviour for transient store failures during reads.
///
/// The budget is per job: once `max_attempts` retries are consumed the next
/// eligible failure is surfaced. Only `BackendUnavailable` and
/// `TransientOther` are eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: delay_from_env(),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Surface every failure immediately.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether the error kind is eligible for a retry under this policy.
    pub fn permits(&self, error: &Error) -> bool {
        matches!(
            error,
            Error::BackendUnavailable(_) | Error::TransientOther(_)
        )
    }
}

fn delay_from_env() -> Duration {
    std::env::var(RETRY_DELAY_ENV)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_RETRY_DELAY)
}

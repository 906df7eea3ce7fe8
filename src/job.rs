//! Write and read jobs that chain one store operation per chunk.
//!
//! Each job drives an explicit state machine: the transition function
//! consumes the previous operation's completion and either asks the driver
//! loop to issue the next store call, schedules a delayed retry, or reports
//! the terminal result. Exactly one store operation is in flight per job, so
//! chunk operations are strictly ordered by construction.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::backend::SecretStore;
use crate::config::{ChunkConfig, RetryPolicy};
use crate::errors::{Error, Result};
use crate::keys::{derive_key, KeyMode};
use crate::types::AccountScope;

/// Progress of a job through its chain of store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Created; no store operation issued yet.
    Idle,
    /// A store operation for the given chunk index is outstanding.
    InFlight(usize),
    /// A transient failure consumed a retry attempt; the same chunk index
    /// will be reissued after the policy delay.
    RetryScheduled(usize),
    /// Terminal. A completed job is discarded, never reused.
    Completed(Result<()>),
}

/// State shared by [`WriteJob`] and [`ReadJob`].
#[derive(Debug, Clone)]
pub struct Job {
    service: String,
    name: String,
    scope: Option<AccountScope>,
    insecure_fallback: bool,
    state: JobState,
    error: Option<Error>,
}

impl Job {
    fn new(service: String, scope: Option<AccountScope>, name: String) -> Self {
        Self {
            service,
            name,
            scope,
            insecure_fallback: false,
            state: JobState::Idle,
            error: None,
        }
    }

    /// Store service name the job operates against.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Logical (unsuffixed, unscoped) key name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> Option<&AccountScope> {
        self.scope.as_ref()
    }

    /// Current position in the state machine.
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Error recorded by the last completion, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// True while a store operation is outstanding or a retry is pending.
    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            JobState::InFlight(_) | JobState::RetryScheduled(_)
        )
    }

    fn complete_ok(&mut self) {
        self.state = JobState::Completed(Ok(()));
    }

    fn fail(&mut self, error: Error) {
        self.error = Some(error.clone());
        self.state = JobState::Completed(Err(error));
    }
}

enum WriteStep {
    Issue { key: String, chunk: Vec<u8> },
    Done(Result<()>),
}

/// Splits a payload into store-sized chunks and writes them sequentially.
///
/// One failed chunk aborts the whole write with the error recorded; chunks
/// already stored are left in place and a later write under the same key
/// overwrites them. Payload beyond `max_chunks` entries is dropped, not
/// reported: the documented behaviour callers depend on.
pub struct WriteJob {
    job: Job,
    config: ChunkConfig,
    pending: Vec<u8>,
    next_index: usize,
}

impl WriteJob {
    pub fn new(
        service: impl Into<String>,
        scope: Option<AccountScope>,
        name: impl Into<String>,
        data: Vec<u8>,
        config: ChunkConfig,
    ) -> Self {
        Self {
            job: Job::new(service.into(), scope, name.into()),
            config,
            pending: data,
            next_index: 0,
        }
    }

    /// Permit the store to fall back to insecure storage for this job.
    pub fn with_insecure_fallback(mut self, allowed: bool) -> Self {
        self.job.insecure_fallback = allowed;
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Drive the job until [`JobState::Completed`]. Must be called once per
    /// job instance.
    pub async fn run(&mut self, store: &dyn SecretStore) -> Result<()> {
        debug_assert!(matches!(self.job.state, JobState::Idle));

        // Entering the machine shares a code path with advancing it: the
        // first transition sees an Ok "completion" and issues chunk 0.
        let mut step = self.advance(Ok(()));
        loop {
            match step {
                WriteStep::Issue { key, chunk } => {
                    let completion = store.write_entry(&self.job.service, &key, &chunk).await;
                    step = self.advance(completion);
                }
                WriteStep::Done(result) => return result,
            }
        }
    }

    fn advance(&mut self, completion: Result<()>) -> WriteStep {
        if let Err(error) = completion {
            warn!(key = %self.job.name, "error while writing chunk: {error}");
            self.pending.clear();
            self.job.fail(error.clone());
            return WriteStep::Done(Err(error));
        }

        if self.pending.is_empty() {
            self.job.complete_ok();
            return WriteStep::Done(Ok(()));
        }

        let index = self.next_index;
        if index >= self.config.max_chunks() {
            warn!(
                key = %self.job.name,
                max_chunks = self.config.max_chunks(),
                "chunk limit reached while writing, dropping the remainder"
            );
            self.pending.clear();
            self.job.complete_ok();
            return WriteStep::Done(Ok(()));
        }

        let chunk = self.config.take_chunk(&mut self.pending);
        self.next_index += 1;
        let key = derive_key(
            &self.job.name,
            self.job.scope.as_ref(),
            KeyMode::Current,
            index,
        );
        self.job.state = JobState::InFlight(index);
        WriteStep::Issue { key, chunk }
    }
}

enum ReadStep {
    Issue { index: usize, key: String },
    Backoff { index: usize },
    Done(Result<()>),
}

/// Reads chunks by ascending index and reassembles the payload.
///
/// Running past the last stored chunk is the normal end of the chain: an
/// `EntryNotFound` after at least one chunk completes the job successfully.
/// A transient store failure is retried once per the policy before being
/// surfaced.
pub struct ReadJob {
    job: Job,
    config: ChunkConfig,
    retry: RetryPolicy,
    mode: KeyMode,
    attempts_left: u32,
    assembled: Vec<u8>,
    chunks_read: usize,
}

impl ReadJob {
    pub fn new(
        service: impl Into<String>,
        scope: Option<AccountScope>,
        name: impl Into<String>,
        config: ChunkConfig,
    ) -> Self {
        let retry = RetryPolicy::default();
        Self {
            job: Job::new(service.into(), scope, name.into()),
            config,
            attempts_left: retry.max_attempts(),
            retry,
            mode: KeyMode::Current,
            assembled: Vec::new(),
            chunks_read: 0,
        }
    }

    /// Derive the legacy key form to locate entries written before account
    /// ids were folded into keys.
    pub fn with_migration(mut self, migration: bool) -> Self {
        self.mode = if migration {
            KeyMode::Migration
        } else {
            KeyMode::Current
        };
        self
    }

    /// Permit the store to fall back to insecure storage for this job.
    /// A job running against an insecure fallback never retries.
    pub fn with_insecure_fallback(mut self, allowed: bool) -> Self {
        self.job.insecure_fallback = allowed;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.attempts_left = retry.max_attempts();
        self.retry = retry;
        self
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Bytes reassembled so far (the full secret once the job completed Ok).
    pub fn data(&self) -> &[u8] {
        &self.assembled
    }

    pub fn into_data(self) -> Vec<u8> {
        self.assembled
    }

    /// Drive the job until [`JobState::Completed`]. Must be called once per
    /// job instance.
    pub async fn run(&mut self, store: &dyn SecretStore) -> Result<()> {
        debug_assert!(matches!(self.job.state, JobState::Idle));

        self.job.state = JobState::InFlight(0);
        let mut step = ReadStep::Issue {
            index: 0,
            key: self.key_for(0),
        };
        loop {
            match step {
                ReadStep::Issue { index, key } => {
                    let completion = store.read_entry(&self.job.service, &key).await;
                    step = self.advance(index, completion);
                }
                ReadStep::Backoff { index } => {
                    sleep(self.retry.delay()).await;
                    self.job.state = JobState::InFlight(index);
                    step = ReadStep::Issue {
                        index,
                        key: self.key_for(index),
                    };
                }
                ReadStep::Done(result) => return result,
            }
        }
    }

    fn key_for(&self, index: usize) -> String {
        derive_key(&self.job.name, self.job.scope.as_ref(), self.mode, index)
    }

    fn advance(&mut self, index: usize, completion: Result<Vec<u8>>) -> ReadStep {
        match completion {
            Ok(data) if !data.is_empty() => {
                self.assembled.extend_from_slice(&data);
                self.chunks_read += 1;

                // An uncapped store holds the whole secret in one entry.
                if self.config.chunk_size().is_none() {
                    self.job.complete_ok();
                    return ReadStep::Done(Ok(()));
                }

                if self.chunks_read >= self.config.max_chunks() {
                    warn!(
                        key = %self.job.name,
                        max_chunks = self.config.max_chunks(),
                        "chunk limit reached while reading, ignoring further chunks"
                    );
                    self.job.complete_ok();
                    return ReadStep::Done(Ok(()));
                }

                let next = self.chunks_read;
                self.job.state = JobState::InFlight(next);
                ReadStep::Issue {
                    index: next,
                    key: self.key_for(next),
                }
            }
            Ok(_) => {
                // An empty entry marks the end of the data, not a failure.
                self.job.complete_ok();
                ReadStep::Done(Ok(()))
            }
            Err(error) => self.handle_failure(index, error),
        }
    }

    fn handle_failure(&mut self, index: usize, error: Error) -> ReadStep {
        if !self.job.insecure_fallback && self.attempts_left > 0 && self.retry.permits(&error) {
            // The service may simply not be up yet right after login.
            self.attempts_left -= 1;
            info!(
                key = %self.job.name,
                delay_ms = self.retry.delay().as_millis() as u64,
                "secret store unavailable, retrying chunk {index}: {error}"
            );
            self.job.state = JobState::RetryScheduled(index);
            return ReadStep::Backoff { index };
        }

        if error.is_not_found() && self.chunks_read > 0 {
            self.job.complete_ok();
            return ReadStep::Done(Ok(()));
        }

        warn!(key = %self.job.name, chunk = index, "unable to read chunk: {error}");
        self.assembled.clear();
        self.job.fail(error.clone());
        ReadStep::Done(Err(error))
    }
}

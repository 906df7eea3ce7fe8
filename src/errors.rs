use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds reported by secret stores and surfaced by jobs.
///
/// Every store failure is observed through a job's completion; nothing
/// panics across the async boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The platform secret service could not be reached, e.g. the daemon has
    /// not finished starting after login or the collection is locked.
    #[error("secret store unavailable: {0}")]
    BackendUnavailable(String),
    /// Failure class some platform services report instead of
    /// `BackendUnavailable` while starting up (kwallet reports a generic
    /// error), so it shares the retry class.
    #[error("transient secret store error: {0}")]
    TransientOther(String),
    /// No entry exists under the derived key. During a chunked read this is
    /// the normal end-of-data signal once at least one chunk was read.
    #[error("no entry stored under key {0}")]
    EntryNotFound(String),
    /// Any other store failure. Surfaced immediately, never retried.
    #[error("secret store error: {0}")]
    Backend(String),
}

impl Error {
    /// True for [`Error::EntryNotFound`], letting callers tell "no secret
    /// stored" from "storage failed".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound(_))
    }
}

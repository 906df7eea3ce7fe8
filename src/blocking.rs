//! Blocking adapter for synchronous call sites.
//!
//! Jobs complete through async store operations; call sites that cannot
//! await get a blocking-equivalent API by driving the job future on a
//! shared runtime instead of pumping an event loop.

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::{self, Handle};

static RUNTIME: Lazy<runtime::Runtime> = Lazy::new(|| {
    runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("chunked-secrets-blocking")
        .build()
        .expect("build chunked-secrets blocking runtime")
});

/// Drive a job future to completion from synchronous code.
///
/// Inside a Tokio runtime the current handle is reused via
/// `block_in_place` (which requires the multi-thread flavor; call sites on
/// a current-thread runtime should await the job directly). Outside any
/// runtime the future runs on a lazily built shared runtime. There is no
/// timeout: termination depends on the job reaching its terminal state.
pub fn run_to_completion<F>(fut: F) -> F::Output
where
    F: Future,
{
    if let Ok(handle) = Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        RUNTIME.block_on(fut)
    }
}

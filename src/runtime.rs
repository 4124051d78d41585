// SPDX-License-Identifier: MPL-2.0

//! The one Tokio runtime behind every network call.
//!
//! The mutation worker lives here for the whole session, and each queued
//! like, repost or follow becomes its own task on it. The terminal host reads
//! stdin on the main thread and waits on page, profile and conversation
//! fetches with [`block_on`].

use once_cell::sync::Lazy;
use std::future::Future;
use tokio::runtime::Runtime;

/// Two workers. At most a few mutations and one fetch are in flight at once.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("skydeck-net")
        .build()
        .expect("failed to create async runtime")
});

/// Wait on a fetch from the terminal host's key loop.
pub fn block_on<F: Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}

/// Start a long-lived task such as [`crate::feed::mutations::spawn_worker`]'s
/// queue drain. The handle is returned so the caller can keep it alive.
pub fn spawn<F>(future: F) -> tokio::task::JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    RUNTIME.spawn(future)
}

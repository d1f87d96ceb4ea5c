//! Task spawning abstractions.
//!
//! Sync passes fan work out as many small tasks. Two shapes are provided:
//!
//! - [`spawn`] for a single detached or awaited task
//! - [`JoinSet`] for a group of tasks whose results are collected as they
//!   finish; dropping the set aborts whatever is still running
//!
//! A task that panics surfaces as a [`JoinError`] from its handle and never
//! takes its siblings down with it.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     assert_eq!(handle.await.unwrap(), 42);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle, JoinSet};

/// Spawns a new asynchronous task on the current runtime.
///
/// The spawned task may run on a different thread than the caller.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Waits for every task in `set` and returns the successful outputs.
///
/// Panicked or aborted tasks are passed to `on_error` and skipped, so one
/// failing task never hides the results of the others.
pub async fn join_all_isolated<T, E>(mut set: JoinSet<T>, mut on_error: E) -> Vec<T>
where
    T: 'static,
    E: FnMut(JoinError),
{
    let mut outputs = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(output) => outputs.push(output),
            Err(err) => on_error(err),
        }
    }
    outputs
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;

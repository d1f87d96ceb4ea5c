//! Synchronization primitives.
//!
//! Async-aware primitives from `tokio::sync`. All of them are `Send + Sync`,
//! never block the executor thread, and are safe to hold across `.await`.
//!
//! The sync engine leans on three of them:
//!
//! - [`Semaphore`] to cap concurrent store write transactions
//! - [`Mutex`] to serialize work on a single playlist
//! - [`broadcast`] to fan events out to subscribers
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{Mutex, Semaphore};
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     *mutex.lock().await += 1;
//!
//!     let semaphore = Semaphore::new(2);
//!     let _a = semaphore.acquire().await.unwrap();
//!     let _b = semaphore.acquire().await.unwrap();
//!     assert_eq!(semaphore.available_permits(), 0);
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, AcquireError, Mutex, MutexGuard, Notify, OwnedMutexGuard,
    OwnedSemaphorePermit, RwLock, RwLockReadGuard, RwLockWriteGuard, Semaphore, SemaphorePermit,
};

//! Executor abstraction layer for the library sync engine.
//!
//! Every other crate in the workspace goes through this crate instead of
//! depending on Tokio directly, so the executor is chosen in exactly one
//! place.
//!
//! # Modules
//!
//! - `task`: task spawning and bounded task groups
//! - `time`: sleep, timeouts and wall-clock helpers
//! - `sync`: async-aware locks, semaphores and channels
//! - `runtime`: runtime handles and `block_on`
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::Semaphore;
//! use core_async::task::JoinSet;
//! use std::sync::Arc;
//!
//! async fn fan_out(items: Vec<u32>) -> u32 {
//!     let permits = Arc::new(Semaphore::new(2));
//!     let mut set = JoinSet::new();
//!     for item in items {
//!         let permits = Arc::clone(&permits);
//!         set.spawn(async move {
//!             let _permit = permits.acquire_owned().await.ok();
//!             item * 2
//!         });
//!     }
//!     let mut total = 0;
//!     while let Some(Ok(value)) = set.join_next().await {
//!         total += value;
//!     }
//!     total
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

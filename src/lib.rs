//! A thread-safe future/result-store primitive.
//!
//! Decouples a producer (a callable run on a worker pool) from consumers
//! that block, poll, or receive marshaled events for indexed results,
//! progress, cancellation and pause/resume — across threads, without data
//! races.
//!
//! - [`FutureInterface`]: producer handle; reports results, progress and
//!   lifecycle transitions.
//! - [`Future`]: consumer handle; blocking waits and terminal accessors.
//! - [`FutureTask`]: wraps a user callable for execution on a pool, with an
//!   error boundary and an exactly-once finish report.
//! - [`FutureWatcher`]: redelivers notifications on the consumer's own
//!   thread, with pause backlog and backpressure.
//!
//! ```
//! use future_relay::{FutureTask, ThreadExecutor};
//!
//! let task = FutureTask::from_fn(|| 6 * 7);
//! let future = task.spawn_on(&ThreadExecutor, 0);
//! assert_eq!(future.results().unwrap(), vec![42]);
//! ```
//!
//! Out-of-order producers pair with filter mode so consumers always observe
//! results in index order:
//!
//! ```
//! use future_relay::{FutureTask, ThreadExecutor};
//!
//! let task = FutureTask::from_producer_ordered(|interface| {
//!     for index in (0..3).rev() {
//!         interface.report_result_at(index, index * 10);
//!     }
//! });
//! let future = task.spawn_on(&ThreadExecutor, 0);
//! assert_eq!(future.results().unwrap(), vec![0, 10, 20]);
//! ```
//!
//! Two contracts worth reading twice:
//!
//! - **Pausing is a delivery concept.** `set_paused(true)` only delays
//!   notification delivery to watchers; the producer keeps running and its
//!   results keep being accepted.
//! - **Cancellation is cooperative.** `cancel()` flips a flag and wakes
//!   blocked waiters; it never interrupts a running task. Waiting on a
//!   future from the thread executing its own task is a caller deadlock.

mod errors;
mod future;
mod state;
mod store;
mod task;
mod watcher;

pub use errors::*;
pub use future::*;
pub use state::*;
pub use store::*;
pub use task::*;
pub use watcher::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

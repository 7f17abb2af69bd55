//! Task wrapper: runs a user callable exactly once on a pool thread and
//! drives the shared future state around it.
//!
//! The wrapper is the error boundary between user code and the pool: a
//! panic or error from the callable is captured into the future's exception
//! store and never propagates on the worker thread. The finish report is
//! issued from a drop guard, so it fires exactly once on every path out of
//! `run`, including panics and the canceled-before-start short-circuit.
//!
//! Task lifecycle: Created (constructed) -> Queued (handed to an executor)
//! -> Running (`Started` reported) -> Finished or Canceled. No transition
//! leaves a terminal state.

use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;

use tracing::debug;
use tracing::warn;

use super::Runnable;
use super::TaskExecutor;
use crate::Future;
use crate::FutureInterface;
use crate::Result;
use crate::TaskFailure;

enum Callable<T> {
    /// Produces one value; reported at index 0 before finishing
    Value(Box<dyn FnOnce() -> T + Send + 'static>),
    /// Like `Value`, but an `Err` is captured as a task failure
    Fallible(Box<dyn FnOnce() -> Result<T> + Send + 'static>),
    /// Streams results/progress through the interface itself
    Producer(Box<dyn FnOnce(&FutureInterface<T>) + Send + 'static>),
}

pub struct FutureTask<T> {
    interface: FutureInterface<T>,
    callable: Callable<T>,
}

impl<T: Send + 'static> FutureTask<T> {
    /// Wrap a value-returning callable.
    pub fn from_fn(f: impl FnOnce() -> T + Send + 'static) -> Self {
        Self::with_callable(Callable::Value(Box::new(f)), false)
    }

    /// Wrap a fallible callable; an `Err` is captured as a task failure and
    /// re-raised from [`Future::results`].
    pub fn from_fallible(f: impl FnOnce() -> Result<T> + Send + 'static) -> Self {
        Self::with_callable(Callable::Fallible(Box::new(f)), false)
    }

    /// Wrap a streaming producer. The callable receives the interface and
    /// reports results, progress and batches itself; a cooperative one also
    /// polls `is_canceled()` and may honor pause via `wait_for_resume()`.
    pub fn from_producer(f: impl FnOnce(&FutureInterface<T>) + Send + 'static) -> Self {
        Self::with_callable(Callable::Producer(Box::new(f)), false)
    }

    /// Like [`FutureTask::from_producer`], with filter mode on: results
    /// reported out of index order become visible to consumers in strictly
    /// increasing index order.
    pub fn from_producer_ordered(f: impl FnOnce(&FutureInterface<T>) + Send + 'static) -> Self {
        Self::with_callable(Callable::Producer(Box::new(f)), true)
    }

    fn with_callable(callable: Callable<T>, filter_mode: bool) -> Self {
        Self {
            interface: FutureInterface::with_filter_mode(filter_mode),
            callable,
        }
    }

    /// Consumer handle for the task's eventual results.
    pub fn future(&self) -> Future<T> {
        self.interface.future()
    }

    /// Hand the task to `executor` and return the consumer handle.
    pub fn spawn_on<E>(self, executor: &E, priority: i32) -> Future<T>
    where
        E: TaskExecutor + ?Sized,
    {
        let future = self.future();
        executor.execute(Box::new(self), priority);
        future
    }
}

/// Reports finish on drop, so the report fires exactly once on every path
/// out of `run`.
struct FinishGuard<'a, T> {
    interface: &'a FutureInterface<T>,
}

impl<T> Drop for FinishGuard<'_, T> {
    fn drop(&mut self) {
        self.interface.report_finished();
    }
}

impl<T: Send + 'static> Runnable for FutureTask<T> {
    fn run(self: Box<Self>) {
        let FutureTask { interface, callable } = *self;
        let _finish = FinishGuard { interface: &interface };
        if interface.is_canceled() {
            debug!("canceled before start; callable skipped");
            return;
        }
        interface.report_started();
        match callable {
            Callable::Value(f) => match catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => interface.report_result(value),
                Err(payload) => {
                    warn!("task panicked");
                    interface.report_failure(TaskFailure::from_panic(payload));
                }
            },
            Callable::Fallible(f) => match catch_unwind(AssertUnwindSafe(f)) {
                Ok(Ok(value)) => interface.report_result(value),
                Ok(Err(error)) => {
                    warn!(%error, "task failed");
                    interface.report_failure(TaskFailure::Failed(error.to_string()));
                }
                Err(payload) => {
                    warn!("task panicked");
                    interface.report_failure(TaskFailure::from_panic(payload));
                }
            },
            Callable::Producer(f) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| f(&interface))) {
                    warn!("task panicked");
                    interface.report_failure(TaskFailure::from_panic(payload));
                }
            }
        }
    }
}

/// Run `f` on `executor` with default priority and return the future for
/// its result.
pub fn run_on<T, E, F>(executor: &E, f: F) -> Future<T>
where
    T: Send + 'static,
    E: TaskExecutor + ?Sized,
    F: FnOnce() -> T + Send + 'static,
{
    FutureTask::from_fn(f).spawn_on(executor, 0)
}

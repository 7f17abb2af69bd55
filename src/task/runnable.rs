//! Worker-pool collaborator interface.
//!
//! The pool that actually executes tasks is external to this crate; only its
//! contract is fixed here. Any pool that invokes each accepted runnable's
//! entry point exactly once, eventually, on some worker thread can drive a
//! [`FutureTask`](crate::FutureTask).

#[cfg(test)]
use mockall::automock;

/// Unit of work accepted by an executor. `run` consumes the runnable: it is
/// invoked exactly once.
pub trait Runnable: Send + 'static {
    fn run(self: Box<Self>);
}

/// Minimal worker-pool contract: accept a runnable plus a scheduling
/// priority. There is no deadline guarantee. Pools without priorities may
/// ignore the argument.
#[cfg_attr(test, automock)]
pub trait TaskExecutor: Send + Sync {
    fn execute(&self, runnable: Box<dyn Runnable>, priority: i32);
}

/// Reference executor: one dedicated thread per task. It provides the
/// exactly-once-eventually guarantee without any scheduling smarts and
/// ignores priorities; production deployments plug in their own pool.
#[derive(Debug, Default)]
pub struct ThreadExecutor;

impl TaskExecutor for ThreadExecutor {
    fn execute(&self, runnable: Box<dyn Runnable>, _priority: i32) {
        std::thread::Builder::new()
            .name("future-task".into())
            .spawn(move || runnable.run())
            .expect("spawn worker thread");
    }
}

//! Cross-thread notification vocabulary between a future and its watchers.

#[cfg(test)]
use mockall::automock;

/// Immutable notification emitted by the shared state and queued per watcher.
///
/// `ResultsReady` carries only an index range; values are pulled from the
/// future by the consumer, so the event stream stays value-free and cheap to
/// clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callout {
    Started,
    Finished,
    Canceled,
    Paused,
    Resumed,
    ResultsReady { begin: usize, end: usize },
    Progress { value: i32, text: Option<String> },
    ProgressRange { minimum: i32, maximum: i32 },
}

/// Receiving end of the notification stream, registered on a future as its
/// output interface.
///
/// `post` runs on the reporting thread, possibly with the future's internal
/// lock held. Implementations must only enqueue: no blocking, and no calls
/// back into the future (that is a deadlock).
///
/// The return value is the backpressure link: `true` asks the future to set
/// its throttled flag, which the caller applies once the lock is released.
#[cfg_attr(test, automock)]
pub trait CalloutSink: Send + Sync + 'static {
    fn post(&self, callout: Callout) -> bool;
}

//! Future Primitive Error Hierarchy
//!
//! Defines the error types surfaced by blocking accessors, categorized by
//! where the failure originated: in the future's own lifecycle, or inside
//! the user callable a task wrapper executed.

use std::any::Any;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lifecycle failures observed by a consumer (cancellation, missing
    /// results)
    #[error(transparent)]
    Future(#[from] FutureError),

    /// Failures captured from the user callable on the worker thread
    #[error(transparent)]
    Task(#[from] TaskFailure),
}

#[derive(Debug, thiserror::Error)]
pub enum FutureError {
    /// The computation was canceled before it completed. By design a
    /// canceled future never yields a partial result list.
    #[error("future was canceled before completion")]
    Canceled,

    /// The future finished without ever producing a result at this index
    #[error("no result available at index {index}")]
    ResultUnavailable { index: usize },
}

/// A failure captured from the producer side. Stored once per future
/// (first one wins) and re-raised on every terminal access, so it must be
/// cheap to clone.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskFailure {
    /// The callable panicked; the payload is stringified at capture time
    #[error("task panicked: {0}")]
    Panicked(String),

    /// A fallible callable returned an error
    #[error("task failed: {0}")]
    Failed(String),
}

impl TaskFailure {
    /// Build a failure from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic payload of unknown type".to_string()
        };
        TaskFailure::Panicked(message)
    }
}

impl Error {
    /// True when this error reports cancellation rather than a real failure.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Future(FutureError::Canceled))
    }
}

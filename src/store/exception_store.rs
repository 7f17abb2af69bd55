//! Holds at most one captured failure from the producer side.

use tracing::trace;

use crate::Error;
use crate::Result;
use crate::TaskFailure;

/// First captured failure wins; later ones are dropped.
#[derive(Debug, Default)]
pub struct ExceptionStore {
    failure: Option<TaskFailure>,
}

impl ExceptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `failure` unless one is already present. Returns whether it was
    /// stored.
    pub fn set_failure(&mut self, failure: TaskFailure) -> bool {
        if self.failure.is_some() {
            trace!("a failure is already stored; later one dropped");
            return false;
        }
        self.failure = Some(failure);
        true
    }

    pub fn has_failure(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    /// Re-raise the stored failure, if any. Callable any number of times.
    pub fn raise_if_failed(&self) -> Result<()> {
        match &self.failure {
            Some(failure) => Err(Error::Task(failure.clone())),
            None => Ok(()),
        }
    }
}

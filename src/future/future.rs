//! Consumer-side handle to the eventual results of a computation.
//!
//! Cloning is cheap; every clone aliases the same shared state, so several
//! consumer threads can block on the same computation. The shared state
//! (with its stored results and captured failure) is released when the last
//! handle drops.
//!
//! ## Deadlock hazard
//! Calling a `wait_for_*` method or [`Future::results`] from the thread that
//! executes the task itself can never be satisfied and deadlocks. This is a
//! caller bug by contract; it is documented rather than detected.

use std::sync::Arc;

use crate::state::SharedState;
use crate::FutureState;
use crate::Result;

pub struct Future<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state }
    }

    /// Request cooperative cancellation and wake every blocked waiter.
    ///
    /// The flag is advisory: a running task is never interrupted forcibly,
    /// and there is no termination deadline. A well-behaved producer polls
    /// `is_canceled()` and exits early. No-op once the future is finished.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Pause or resume *notification delivery* to watchers. The producer
    /// keeps executing and reported results keep being accepted; pausing is
    /// a delivery concept, not suspension of work.
    pub fn set_paused(&self, paused: bool) {
        self.state.set_paused(paused);
    }

    pub fn toggle_paused(&self) {
        self.state.toggle_paused();
    }

    pub fn is_started(&self) -> bool {
        self.state.flags().contains(FutureState::STARTED)
    }

    pub fn is_running(&self) -> bool {
        self.state.flags().contains(FutureState::RUNNING)
    }

    pub fn is_finished(&self) -> bool {
        self.state.flags().contains(FutureState::FINISHED)
    }

    pub fn is_canceled(&self) -> bool {
        self.state.flags().contains(FutureState::CANCELED)
    }

    pub fn is_paused(&self) -> bool {
        self.state.flags().contains(FutureState::PAUSED)
    }

    pub fn is_throttled(&self) -> bool {
        self.state.flags().contains(FutureState::THROTTLED)
    }

    pub fn progress_minimum(&self) -> i32 {
        self.state.progress_minimum()
    }

    pub fn progress_maximum(&self) -> i32 {
        self.state.progress_maximum()
    }

    pub fn progress_value(&self) -> i32 {
        self.state.progress_value()
    }

    pub fn progress_text(&self) -> Option<String> {
        self.state.progress_text()
    }

    /// Length of the contiguous result prefix available from index 0.
    pub fn result_count(&self) -> usize {
        self.state.result_count()
    }

    pub fn is_result_ready_at(&self, index: usize) -> bool {
        self.state.is_result_ready_at(index)
    }

    /// Block until terminal. `Err(Canceled)` when the computation was
    /// canceled instead of finishing.
    pub fn wait_for_finished(&self) -> Result<()> {
        self.state.wait_for_finished()
    }

    /// Block until the contiguous count grows past its value at call time.
    /// `Ok(false)` when the future finished without producing another
    /// result; `Err(Canceled)` on cancellation.
    pub fn wait_for_next_result(&self) -> Result<bool> {
        self.state.wait_for_next_result()
    }

    pub(crate) fn state(&self) -> &Arc<SharedState<T>> {
        &self.state
    }
}

impl<T: Clone> Future<T> {
    /// Non-blocking read of the value at `index`, if it is available. Works
    /// on futures in any state, including canceled ones.
    pub fn result_at(&self, index: usize) -> Option<T> {
        self.state.result_at(index)
    }

    /// Block until a result covers `index`, then return it. Cancellation
    /// wins over an already stored value; a placeholder span (a value-less
    /// sub-unit) reports `ResultUnavailable`.
    pub fn wait_for_result(&self, index: usize) -> Result<T> {
        self.state.wait_for_result(index)?;
        self.state
            .result_at(index)
            .ok_or_else(|| crate::FutureError::ResultUnavailable { index }.into())
    }

    /// Block until terminal, then yield every available value in index
    /// order. A failure captured from the producer is re-raised here; a
    /// canceled future always yields `Err(Canceled)`, never a partial list,
    /// even when some values were already stored.
    pub fn results(&self) -> Result<Vec<T>> {
        self.state.results()
    }
}

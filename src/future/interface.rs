//! Producer-side handle driving one asynchronous computation.
//!
//! A `FutureInterface` is what the executing task holds: it reports
//! lifecycle transitions, results, progress and failures into the shared
//! state. Cloning is cheap and aliases the same computation, so a producer
//! may be split across threads (pair it with filter mode to keep consumers
//! seeing results in index order).

use std::sync::Arc;

use crate::state::SharedState;
use crate::Future;
use crate::FutureState;
use crate::TaskFailure;

pub struct FutureInterface<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Clone for FutureInterface<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for FutureInterface<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FutureInterface<T> {
    /// Create the shared state for a new computation. Filter mode is off:
    /// results become visible at whatever index they are reported for.
    pub fn new() -> Self {
        Self::with_filter_mode(false)
    }

    /// With filter mode on, out-of-order reports are buffered internally and
    /// released to consumers in strictly increasing index order.
    pub fn with_filter_mode(filter_mode: bool) -> Self {
        Self {
            state: Arc::new(SharedState::new(filter_mode)),
        }
    }

    /// Consumer handle aliasing this computation.
    pub fn future(&self) -> Future<T> {
        Future::from_state(Arc::clone(&self.state))
    }

    pub fn report_started(&self) {
        self.state.report_started();
    }

    /// Append one result at the next sequential index.
    pub fn report_result(&self, value: T) {
        self.state.report_result(value, None);
    }

    /// Store one result at an explicit index.
    pub fn report_result_at(&self, index: usize, value: T) {
        self.state.report_result(value, Some(index));
    }

    /// Append a batch at the next sequential index.
    pub fn report_results(&self, values: Vec<T>) {
        let declared_count = values.len();
        self.state.report_results(values, None, declared_count);
    }

    /// Store a batch at an explicit index. An empty `values` with a positive
    /// `declared_count` is a placeholder for a skipped sub-unit: it advances
    /// the logical count by the declared size without contributing values.
    pub fn report_results_at(&self, index: usize, values: Vec<T>, declared_count: usize) {
        self.state.report_results(values, Some(index), declared_count);
    }

    pub fn report_finished(&self) {
        self.state.report_finished();
    }

    /// Report a final result, then finish.
    pub fn report_finished_with_result(&self, value: T) {
        self.state.report_result(value, None);
        self.state.report_finished();
    }

    pub fn report_canceled(&self) {
        self.state.cancel();
    }

    /// Capture a producer failure (first one wins). It is re-raised to
    /// consumers from [`Future::results`] once the future is finished.
    pub fn report_failure(&self, failure: TaskFailure) {
        self.state.report_failure(failure);
    }

    pub fn set_progress_range(&self, minimum: i32, maximum: i32) {
        self.state.set_progress_range(minimum, maximum);
    }

    pub fn set_progress_value(&self, value: i32) {
        self.state.set_progress_value(value);
    }

    pub fn set_progress_value_and_text(&self, value: i32, text: impl Into<String>) {
        self.state.set_progress_value_and_text(value, text);
    }

    /// Advisory backpressure flag, normally driven by a watcher with a
    /// pending-results limit.
    pub fn set_throttled(&self, throttled: bool) {
        self.state.set_throttled(throttled);
    }

    /// A cooperative producer polls this and exits early when it turns true.
    pub fn is_canceled(&self) -> bool {
        self.state.flags().contains(FutureState::CANCELED)
    }

    pub fn is_paused(&self) -> bool {
        self.state.flags().contains(FutureState::PAUSED)
    }

    pub fn is_throttled(&self) -> bool {
        self.state.flags().contains(FutureState::THROTTLED)
    }

    /// Voluntarily park until resumed. Pause never suspends a producer by
    /// itself; honoring it is the producer's choice.
    pub fn wait_for_resume(&self) {
        self.state.wait_for_resume();
    }

    pub(crate) fn state(&self) -> &Arc<SharedState<T>> {
        &self.state
    }
}

//! Shared lifecycle state of one asynchronous computation.
//!
//! A `SharedState` is aliased through `Arc` by every handle to the same
//! computation: the producer-side [`FutureInterface`](crate::FutureInterface),
//! any number of consumer-side [`Future`](crate::Future) clones, and the
//! watcher proxies registered as callout sinks. The last handle to drop
//! releases the stored results and any captured failure.
//!
//! ## Locking discipline
//! One mutex guards all flags, progress fields, the result store, the
//! exception store and the sink list. Callouts are constructed and *queued*
//! (via [`CalloutSink::post`], which must not block and must not reenter the
//! future) while the lock is held, so per-sink delivery order always matches
//! generation order. Actual consumer callbacks run on the watcher's own
//! thread, never under this lock.
//!
//! ## Pause semantics
//! Pausing affects notification delivery timing only. The producer keeps
//! running and reported results keep being accepted; a cooperative producer
//! may additionally park itself in [`SharedState::wait_for_resume`].
//!
//! ## Waits
//! All blocking waits are predicate-checked condition-variable loops.
//! Calling a wait method from the thread that is executing the task itself
//! deadlocks; that is a caller bug this type does not defend against.

use std::sync::Arc;

use parking_lot::Condvar;
use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;

use super::Callout;
use super::CalloutSink;
use super::FutureState;
use super::ProgressInfo;
use crate::ExceptionStore;
use crate::FutureError;
use crate::Result;
use crate::ResultStore;
use crate::TaskFailure;

pub(crate) struct StateInner<T> {
    flags: FutureState,
    progress: ProgressInfo,
    store: ResultStore<T>,
    exceptions: ExceptionStore,
    sinks: Vec<RegisteredSink>,
    next_sink_id: u64,
}

struct RegisteredSink {
    id: u64,
    sink: Arc<dyn CalloutSink>,
}

pub(crate) struct SharedState<T> {
    inner: Mutex<StateInner<T>>,
    /// Signaled on result arrival, finish, cancel and resume.
    wait_cv: Condvar,
}

impl<T> SharedState<T> {
    pub(crate) fn new(filter_mode: bool) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                flags: FutureState::NO_STATE,
                progress: ProgressInfo::default(),
                store: ResultStore::with_filter_mode(filter_mode),
                exceptions: ExceptionStore::new(),
                sinks: Vec::new(),
                next_sink_id: 0,
            }),
            wait_cv: Condvar::new(),
        }
    }

    //-----------------------------------------------------------
    // Producer-side reports

    pub(crate) fn report_started(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.contains(FutureState::STARTED) || inner.flags.is_terminal() {
            return;
        }
        inner.flags.insert(FutureState::STARTED | FutureState::RUNNING);
        debug!("future started");
        Self::post_to_sinks(inner, Callout::Started);
    }

    /// Idempotent; a second call emits nothing. Silent no-op once canceled.
    pub(crate) fn report_finished(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() {
            trace!("finish reported after terminal state; ignored");
            return;
        }
        inner.flags.insert(FutureState::FINISHED);
        inner.flags.remove(FutureState::RUNNING);
        debug!("future finished");
        self.wait_cv.notify_all();
        Self::post_to_sinks(inner, Callout::Finished);
    }

    /// Flip to canceled and wake every blocked waiter. No-op once terminal.
    /// All later report calls become silent no-ops.
    pub(crate) fn cancel(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() {
            trace!("cancel after terminal state; ignored");
            return;
        }
        let was_paused = inner.flags.contains(FutureState::PAUSED);
        inner.flags.remove(FutureState::PAUSED | FutureState::RUNNING);
        inner.flags.insert(FutureState::CANCELED);
        debug!("future canceled");
        self.wait_cv.notify_all();
        if was_paused {
            // End the delivery pause first so watcher backlogs flush ahead
            // of the cancel notification.
            Self::post_to_sinks(inner, Callout::Resumed);
        }
        Self::post_to_sinks(inner, Callout::Canceled);
    }

    /// Store one result. Silently ignored once terminal: a producer may
    /// legitimately race with a late cancel.
    pub(crate) fn report_result(&self, value: T, index: Option<usize>) {
        let throttle;
        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.flags.is_terminal() {
                trace!("result reported after terminal state; ignored");
                return;
            }
            let count_before = inner.store.count();
            let at = inner.store.add_result(index, value);
            self.wait_cv.notify_all();
            throttle = match Self::ready_range(inner, count_before, at, 1) {
                Some(callout) => Self::post_to_sinks(inner, callout),
                None => false,
            };
        }
        if throttle {
            self.set_throttled(true);
        }
    }

    /// Store a batch starting at `index`. An empty batch with a positive
    /// `declared_count` is a placeholder advancing the count by that size.
    pub(crate) fn report_results(&self, values: Vec<T>, index: Option<usize>, declared_count: usize) {
        let span = if values.is_empty() { declared_count } else { values.len() };
        if span == 0 {
            return;
        }
        let throttle;
        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.flags.is_terminal() {
                trace!("results reported after terminal state; ignored");
                return;
            }
            let count_before = inner.store.count();
            let at = inner.store.add_results(index, values, declared_count);
            self.wait_cv.notify_all();
            throttle = match Self::ready_range(inner, count_before, at, span) {
                Some(callout) => Self::post_to_sinks(inner, callout),
                None => false,
            };
        }
        if throttle {
            self.set_throttled(true);
        }
    }

    pub(crate) fn report_failure(&self, failure: TaskFailure) {
        let mut inner = self.inner.lock();
        if inner.exceptions.set_failure(failure) {
            debug!("task failure captured");
        }
    }

    /// Range advertised to watchers for one insert. In filter mode only a
    /// newly available contiguous tail counts; a buffered out-of-order
    /// arrival advertises nothing yet.
    fn ready_range(inner: &StateInner<T>, count_before: usize, at: usize, span: usize) -> Option<Callout> {
        if inner.store.is_filter_mode() {
            let count_after = inner.store.count();
            if count_after > count_before {
                Some(Callout::ResultsReady {
                    begin: count_before,
                    end: count_after,
                })
            } else {
                None
            }
        } else {
            Some(Callout::ResultsReady {
                begin: at,
                end: at + span,
            })
        }
    }

    //-----------------------------------------------------------
    // Progress

    pub(crate) fn set_progress_range(&self, minimum: i32, maximum: i32) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() {
            return;
        }
        inner.progress.set_range(minimum, maximum);
        let callout = Callout::ProgressRange {
            minimum: inner.progress.minimum(),
            maximum: inner.progress.maximum(),
        };
        Self::post_to_sinks(inner, callout);
    }

    pub(crate) fn set_progress_value(&self, value: i32) {
        self.set_progress(value, None);
    }

    pub(crate) fn set_progress_value_and_text(&self, value: i32, text: impl Into<String>) {
        self.set_progress(value, Some(text.into()));
    }

    /// Notifies only when the clamped value actually changed, so repeated
    /// identical updates cause no event storm.
    fn set_progress(&self, value: i32, text: Option<String>) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() {
            return;
        }
        if let Some(text) = text {
            inner.progress.set_text(Some(text));
        }
        let Some(clamped) = inner.progress.update_value(value) else {
            trace!(value, "progress value unchanged; no notification");
            return;
        };
        let callout = Callout::Progress {
            value: clamped,
            text: inner.progress.text().map(str::to_string),
        };
        Self::post_to_sinks(inner, callout);
    }

    //-----------------------------------------------------------
    // Pause / throttle

    /// Delivery-pause toggle. Execution of the producer and acceptance of
    /// reported results are unaffected; see the module docs.
    pub(crate) fn set_paused(&self, paused: bool) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() || inner.flags.contains(FutureState::PAUSED) == paused {
            return;
        }
        self.apply_paused(inner, paused);
    }

    pub(crate) fn toggle_paused(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if inner.flags.is_terminal() {
            return;
        }
        let paused = !inner.flags.contains(FutureState::PAUSED);
        self.apply_paused(inner, paused);
    }

    fn apply_paused(&self, inner: &mut StateInner<T>, paused: bool) {
        inner.flags.set(FutureState::PAUSED, paused);
        if paused {
            debug!("delivery paused");
            Self::post_to_sinks(inner, Callout::Paused);
        } else {
            debug!("delivery resumed");
            self.wait_cv.notify_all();
            Self::post_to_sinks(inner, Callout::Resumed);
        }
    }

    /// Advisory backpressure flag; consulted by cooperative producers, not
    /// enforced here. No callout is emitted.
    pub(crate) fn set_throttled(&self, throttled: bool) {
        let mut inner = self.inner.lock();
        if inner.flags.contains(FutureState::THROTTLED) == throttled {
            return;
        }
        inner.flags.set(FutureState::THROTTLED, throttled);
        trace!(throttled, "backpressure flag updated");
    }

    //-----------------------------------------------------------
    // Blocking waits

    /// Block until terminal. `Err(Canceled)` when the computation was
    /// canceled instead of finishing.
    pub(crate) fn wait_for_finished(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        while !inner.flags.is_terminal() {
            self.wait_cv.wait(&mut inner);
        }
        if inner.flags.contains(FutureState::CANCELED) {
            return Err(FutureError::Canceled.into());
        }
        Ok(())
    }

    /// Block until an item covers `index`. Cancellation wins over an already
    /// stored result: a canceled future returns without its expected result.
    pub(crate) fn wait_for_result(&self, index: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        loop {
            if inner.flags.contains(FutureState::CANCELED) {
                return Err(FutureError::Canceled.into());
            }
            if inner.store.contains(index) {
                return Ok(());
            }
            if inner.flags.contains(FutureState::FINISHED) {
                return Err(FutureError::ResultUnavailable { index }.into());
            }
            self.wait_cv.wait(&mut inner);
        }
    }

    /// Block until the contiguous count grows past its value at call time.
    /// `Ok(false)` when the future finished without a further result.
    pub(crate) fn wait_for_next_result(&self) -> Result<bool> {
        let mut inner = self.inner.lock();
        let baseline = inner.store.count();
        loop {
            if inner.store.count() > baseline {
                return Ok(true);
            }
            if inner.flags.contains(FutureState::CANCELED) {
                return Err(FutureError::Canceled.into());
            }
            if inner.flags.contains(FutureState::FINISHED) {
                return Ok(false);
            }
            self.wait_cv.wait(&mut inner);
        }
    }

    /// Block while paused. Returns immediately once resumed or terminal.
    pub(crate) fn wait_for_resume(&self) {
        let mut inner = self.inner.lock();
        while inner.flags.contains(FutureState::PAUSED) && !inner.flags.is_terminal() {
            self.wait_cv.wait(&mut inner);
        }
    }

    //-----------------------------------------------------------
    // Consumer-side accessors

    pub(crate) fn flags(&self) -> FutureState {
        self.inner.lock().flags
    }

    pub(crate) fn progress_minimum(&self) -> i32 {
        self.inner.lock().progress.minimum()
    }

    pub(crate) fn progress_maximum(&self) -> i32 {
        self.inner.lock().progress.maximum()
    }

    pub(crate) fn progress_value(&self) -> i32 {
        self.inner.lock().progress.value()
    }

    pub(crate) fn progress_text(&self) -> Option<String> {
        self.inner.lock().progress.text().map(str::to_string)
    }

    pub(crate) fn result_count(&self) -> usize {
        self.inner.lock().store.count()
    }

    pub(crate) fn is_result_ready_at(&self, index: usize) -> bool {
        self.inner.lock().store.contains(index)
    }

    //-----------------------------------------------------------
    // Watcher registration

    /// Register a sink and replay the current state to it, so a late
    /// subscriber converges on the same view as one attached before the
    /// first report. Returns the registration id used for detaching.
    pub(crate) fn attach(&self, sink: Arc<dyn CalloutSink>) -> u64 {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let id = inner.next_sink_id;
        inner.next_sink_id += 1;
        for callout in Self::replay_snapshot(inner) {
            sink.post(callout);
        }
        inner.sinks.push(RegisteredSink { id, sink });
        debug!(sink_id = id, "watcher attached");
        id
    }

    pub(crate) fn detach(&self, sink_id: u64) {
        let mut inner = self.inner.lock();
        let before = inner.sinks.len();
        inner.sinks.retain(|registered| registered.id != sink_id);
        if inner.sinks.len() != before {
            debug!(sink_id, "watcher detached");
        }
    }

    /// Synthetic callouts describing the current state. `ResultsReady` comes
    /// before `Paused` so the snapshot itself is never stuck in a watcher's
    /// pause backlog.
    fn replay_snapshot(inner: &StateInner<T>) -> Vec<Callout> {
        let mut callouts = Vec::new();
        let flags = inner.flags;
        if flags.contains(FutureState::STARTED) {
            callouts.push(Callout::Started);
        }
        let minimum = inner.progress.minimum();
        let maximum = inner.progress.maximum();
        if minimum != 0 || maximum != 0 {
            callouts.push(Callout::ProgressRange { minimum, maximum });
            callouts.push(Callout::Progress {
                value: inner.progress.value(),
                text: inner.progress.text().map(str::to_string),
            });
        }
        let count = inner.store.count();
        if count > 0 {
            callouts.push(Callout::ResultsReady { begin: 0, end: count });
        }
        if flags.contains(FutureState::PAUSED) {
            callouts.push(Callout::Paused);
        }
        if flags.contains(FutureState::CANCELED) {
            callouts.push(Callout::Canceled);
        }
        if flags.contains(FutureState::FINISHED) {
            callouts.push(Callout::Finished);
        }
        callouts
    }

    /// Queue `callout` on every registered sink. Returns true when any sink
    /// asked for throttling; the caller applies that once the lock is gone.
    fn post_to_sinks(inner: &StateInner<T>, callout: Callout) -> bool {
        let mut throttle = false;
        for registered in &inner.sinks {
            throttle |= registered.sink.post(callout.clone());
        }
        throttle
    }

    //-----------------------------------------------------------
    // Terminal accessors

    /// Block until terminal, then yield every available value in index
    /// order. A stored failure is re-raised; a canceled future always
    /// yields `Err(Canceled)` rather than a partial list.
    pub(crate) fn results(&self) -> Result<Vec<T>>
    where
        T: Clone,
    {
        let mut inner = self.inner.lock();
        while !inner.flags.is_terminal() {
            self.wait_cv.wait(&mut inner);
        }
        if inner.flags.contains(FutureState::CANCELED) {
            return Err(FutureError::Canceled.into());
        }
        inner.exceptions.raise_if_failed()?;
        Ok(inner.store.iter().map(|(_, value)| value.clone()).collect())
    }

    pub(crate) fn result_at(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().store.result_at(index).cloned()
    }
}

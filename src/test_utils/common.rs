use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Callout;
use crate::CalloutSink;
use crate::FutureWatcher;
use crate::Runnable;
use crate::TaskExecutor;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    env_logger::init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Sink that records every posted callout, for order-sensitive assertions
/// without a full watcher.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Callout>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Callout> {
        self.events.lock().clone()
    }

    pub fn count_of(&self, expected: &Callout) -> usize {
        self.events.lock().iter().filter(|c| *c == expected).count()
    }
}

impl CalloutSink for RecordingSink {
    fn post(&self, callout: Callout) -> bool {
        self.events.lock().push(callout);
        false
    }
}

/// Executor that holds runnables until the test decides to run them, so
/// pre-run state (e.g. cancel-before-start) can be set up deterministically.
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<Vec<Box<dyn Runnable>>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn run_all(&self) {
        let queue: Vec<_> = self.queue.lock().drain(..).collect();
        for runnable in queue {
            runnable.run();
        }
    }
}

impl TaskExecutor for ManualExecutor {
    fn execute(&self, runnable: Box<dyn Runnable>, _priority: i32) {
        self.queue.lock().push(runnable);
    }
}

/// Drain every event currently deliverable without blocking.
pub fn drain_events<T>(watcher: &mut FutureWatcher<T>) -> Vec<Callout> {
    let mut events = Vec::new();
    while let Some(event) = watcher.try_next_event() {
        events.push(event);
    }
    events
}

/// Collect `count` events, waiting up to `timeout` for each.
pub fn collect_events<T>(watcher: &mut FutureWatcher<T>, count: usize, timeout: Duration) -> Vec<Callout> {
    let mut events = Vec::new();
    while events.len() < count {
        match watcher.next_event_timeout(timeout) {
            Some(event) => events.push(event),
            None => break,
        }
    }
    events
}

//! Watcher: redelivers a future's notifications on the consumer's own
//! thread, with pause backlog and consumer-side backpressure.
//!
//! ## Delivery model
//! Attaching registers a proxy sink on the future. The reporting thread
//! enqueues each [`Callout`] onto the watcher's unbounded channel; the
//! watcher's owning thread drains it through `next_event` /
//! `try_next_event`, so callbacks never execute on the reporting thread.
//! Per-watcher delivery preserves generation order.
//!
//! ## Pause backlog
//! A `Paused` callout is delivered immediately and flips the watcher into
//! buffering: subsequent events append to a pending list instead of being
//! delivered. The `Resumed` callout flushes the pending list in FIFO order
//! and is then delivered itself, so `Resumed` always arrives after the
//! backlog it unblocks, never interleaved with it.
//!
//! ## Backpressure
//! The proxy counts outstanding (posted-but-undrained) `ResultsReady`
//! callouts. Above the configured limit the future is asked to throttle;
//! draining back below the limit clears it. This is the link between a slow
//! consumer and a fast producer; the flag itself is advisory.

use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use crossbeam_channel::unbounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use tracing::trace;

use crate::state::SharedState;
use crate::Callout;
use crate::CalloutSink;
use crate::Future;

/// Watcher tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct WatcherOptions {
    /// Above this many posted-but-undrained `ResultsReady` callouts the
    /// watcher asks the producer to throttle. `None` disables backpressure.
    pub pending_results_limit: Option<usize>,
}

/// Producer-side end of one watcher registration. Lives in the future's
/// sink list; only enqueues and counts, never blocks.
struct WatcherProxy {
    tx: Sender<Callout>,
    outstanding: AtomicUsize,
    pending_results_limit: Option<usize>,
}

impl CalloutSink for WatcherProxy {
    fn post(&self, callout: Callout) -> bool {
        let mut throttle = false;
        if matches!(callout, Callout::ResultsReady { .. }) {
            let outstanding = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(limit) = self.pending_results_limit {
                throttle = outstanding > limit;
            }
        }
        // A send to a dropped receiver means the watcher is gone; the event
        // is discarded by contract.
        let _ = self.tx.send(callout);
        throttle
    }
}

struct Attachment<T> {
    state: Arc<SharedState<T>>,
    sink_id: u64,
    proxy: Arc<WatcherProxy>,
}

pub struct FutureWatcher<T> {
    options: WatcherOptions,
    tx: Sender<Callout>,
    rx: Receiver<Callout>,
    attached: Option<Attachment<T>>,
    /// Events deliverable right now, in order.
    ready: VecDeque<Callout>,
    /// Events held back while the stream is paused.
    backlog: VecDeque<Callout>,
    paused: bool,
}

impl<T> Default for FutureWatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FutureWatcher<T> {
    pub fn new() -> Self {
        Self::with_options(WatcherOptions::default())
    }

    pub fn with_options(options: WatcherOptions) -> Self {
        let (tx, rx) = unbounded();
        Self {
            options,
            tx,
            rx,
            attached: None,
            ready: VecDeque::new(),
            backlog: VecDeque::new(),
            paused: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Consumer handle of the watched future, while attached.
    pub fn future(&self) -> Option<Future<T>> {
        self.attached
            .as_ref()
            .map(|attachment| Future::from_state(Arc::clone(&attachment.state)))
    }

    /// Attach to `future`, detaching from any previous one first. The
    /// future's current state is replayed as synthetic events, so a late
    /// subscriber converges on the same view as an early one.
    pub fn set_future(&mut self, future: &Future<T>) {
        self.detach();
        let state = Arc::clone(future.state());
        let proxy = Arc::new(WatcherProxy {
            tx: self.tx.clone(),
            outstanding: AtomicUsize::new(0),
            pending_results_limit: self.options.pending_results_limit,
        });
        let sink_id = state.attach(Arc::clone(&proxy) as Arc<dyn CalloutSink>);
        self.attached = Some(Attachment {
            state,
            sink_id,
            proxy,
        });
    }

    /// Detach from the watched future. Queued-but-undelivered events are
    /// discarded; direct state queries on the `Future` handle keep working.
    pub fn detach(&mut self) {
        let Some(attachment) = self.attached.take() else {
            return;
        };
        attachment.state.detach(attachment.sink_id);
        while self.rx.try_recv().is_ok() {}
        self.ready.clear();
        self.backlog.clear();
        self.paused = false;
        if self.options.pending_results_limit.is_some() {
            // Do not leave the producer throttled on behalf of a consumer
            // that no longer listens.
            attachment.state.set_throttled(false);
        }
    }

    /// Next deliverable event, without blocking.
    pub fn try_next_event(&mut self) -> Option<Callout> {
        loop {
            if let Some(event) = self.pop_ready() {
                return Some(event);
            }
            match self.rx.try_recv() {
                Ok(callout) => self.pump(callout),
                Err(_) => return None,
            }
        }
    }

    /// Next deliverable event, waiting up to `timeout` for one to arrive.
    pub fn next_event_timeout(&mut self, timeout: Duration) -> Option<Callout> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.pop_ready() {
                return Some(event);
            }
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.rx.recv_timeout(remaining) {
                Ok(callout) => self.pump(callout),
                Err(_) => return None,
            }
        }
    }

    /// Route one incoming callout: deliver, buffer, or flush the backlog.
    fn pump(&mut self, callout: Callout) {
        match callout {
            Callout::Paused => {
                self.paused = true;
                self.ready.push_back(Callout::Paused);
            }
            Callout::Resumed => {
                self.paused = false;
                // Backlog first, Resumed closes it; nothing interleaves.
                self.ready.extend(self.backlog.drain(..));
                self.ready.push_back(Callout::Resumed);
            }
            other if self.paused => {
                trace!("stream paused; event buffered");
                self.backlog.push_back(other);
            }
            other => self.ready.push_back(other),
        }
    }

    fn pop_ready(&mut self) -> Option<Callout> {
        let event = self.ready.pop_front()?;
        if matches!(event, Callout::ResultsReady { .. }) {
            self.note_results_drained();
        }
        Some(event)
    }

    /// Drain-side half of the backpressure link.
    fn note_results_drained(&self) {
        let Some(attachment) = &self.attached else {
            return;
        };
        let previous = attachment.proxy.outstanding.fetch_sub(1, Ordering::SeqCst);
        let outstanding = previous.saturating_sub(1);
        if let Some(limit) = self.options.pending_results_limit {
            if outstanding < limit {
                attachment.state.set_throttled(false);
            }
        }
    }
}

impl<T> Drop for FutureWatcher<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

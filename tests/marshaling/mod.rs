//! Watcher event marshaling across real threads.

use std::thread;
use std::time::Duration;

use future_relay::Callout;
use future_relay::FutureTask;
use future_relay::FutureWatcher;
use future_relay::ThreadExecutor;
use future_relay::WatcherOptions;

use crate::commons::enable_logger;

fn drain_with_timeout<T>(watcher: &mut FutureWatcher<T>, timeout: Duration) -> Vec<Callout> {
    let mut events = Vec::new();
    while let Some(event) = watcher.next_event_timeout(timeout) {
        events.push(event);
        if matches!(events.last(), Some(Callout::Finished | Callout::Canceled)) {
            break;
        }
    }
    events
}

/// # Case 1: a watcher on its own thread sees a well-formed stream
#[test]
fn test_watcher_stream_is_well_formed() {
    enable_logger();
    let task = FutureTask::from_producer(|interface| {
        for index in 0..20 {
            interface.report_result(index);
        }
    });
    let mut watcher = FutureWatcher::new();
    watcher.set_future(&task.future());
    let future = task.spawn_on(&ThreadExecutor, 0);

    let consumer = thread::spawn(move || drain_with_timeout(&mut watcher, Duration::from_secs(5)));
    let events = consumer.join().expect("consumer must not panic");

    assert_eq!(events.first(), Some(&Callout::Started));
    assert_eq!(events.last(), Some(&Callout::Finished));

    // ResultsReady ranges are contiguous and strictly increasing
    let mut next_begin = 0;
    for event in &events {
        if let Callout::ResultsReady { begin, end } = event {
            assert_eq!(*begin, next_begin, "ranges must not overlap or skip");
            assert!(end > begin);
            next_begin = *end;
        }
    }
    assert_eq!(next_begin, 20, "every result was advertised exactly once");
    assert!(future.is_finished());
}

/// # Case 2: pause holds events back across threads; resume flushes in order
#[test]
fn test_pause_resume_across_threads() {
    let task = FutureTask::from_producer(|interface| {
        for index in 0..3 {
            interface.report_result(index);
            // wide margin so the consumer resumes before the finish report
            thread::sleep(Duration::from_millis(50));
        }
    });
    let future = task.future();
    let mut watcher = FutureWatcher::new();
    watcher.set_future(&future);

    future.set_paused(true);
    let spawned = task.spawn_on(&ThreadExecutor, 0);
    spawned.wait_for_result(2).expect("pause does not stop the producer");

    // paused: only Paused may have been delivered so far
    let mut held = Vec::new();
    while let Some(event) = watcher.try_next_event() {
        held.push(event);
    }
    assert_eq!(held, vec![Callout::Paused]);

    future.set_paused(false);
    let events = drain_with_timeout(&mut watcher, Duration::from_secs(5));
    let resumed_at = events
        .iter()
        .position(|e| *e == Callout::Resumed)
        .expect("resume event must arrive");
    let backlog = &events[..resumed_at];
    assert_eq!(
        backlog,
        &[
            Callout::Started,
            Callout::ResultsReady { begin: 0, end: 1 },
            Callout::ResultsReady { begin: 1, end: 2 },
            Callout::ResultsReady { begin: 2, end: 3 },
        ],
        "the backlog replays in generation order ahead of Resumed"
    );
}

/// # Case 3: a slow consumer throttles the producer, then releases it
#[test]
fn test_backpressure_round_trip() {
    let task = FutureTask::from_producer(|interface| {
        for index in 0..6 {
            // cooperative producer: honor the advisory flag
            while interface.is_throttled() {
                thread::sleep(Duration::from_millis(5));
            }
            interface.report_result(index);
        }
    });
    let future = task.future();
    let mut watcher = FutureWatcher::with_options(WatcherOptions {
        pending_results_limit: Some(2),
    });
    watcher.set_future(&future);

    let spawned = task.spawn_on(&ThreadExecutor, 0);

    // drain slowly; the producer must still complete all six results
    let mut results_seen = 0;
    while let Some(event) = watcher.next_event_timeout(Duration::from_secs(5)) {
        if matches!(event, Callout::ResultsReady { .. }) {
            results_seen += 1;
            thread::sleep(Duration::from_millis(2));
        }
        if matches!(event, Callout::Finished) {
            break;
        }
    }
    assert_eq!(results_seen, 6);
    assert!(!future.is_throttled(), "drained consumer releases the producer");
    assert_eq!(spawned.results().expect("clean finish").len(), 6);
}

/// # Case 4: watchers detach cleanly while the producer keeps reporting
#[test]
fn test_detach_mid_stream_across_threads() {
    let task = FutureTask::from_producer(|interface| {
        for index in 0..50 {
            interface.report_result(index);
            thread::sleep(Duration::from_millis(1));
        }
    });
    let future = task.future();
    let mut leaving = FutureWatcher::new();
    let mut staying = FutureWatcher::new();
    leaving.set_future(&future);
    staying.set_future(&future);

    let spawned = task.spawn_on(&ThreadExecutor, 0);
    spawned.wait_for_result(5).expect("stream is flowing");
    leaving.detach();

    let events = drain_with_timeout(&mut staying, Duration::from_secs(5));
    assert_eq!(events.last(), Some(&Callout::Finished));
    assert!(leaving.try_next_event().is_none());
    assert_eq!(spawned.results().expect("clean finish").len(), 50);
}

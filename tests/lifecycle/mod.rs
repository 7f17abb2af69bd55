//! End-to-end producer/consumer scenarios across real threads.

use std::thread;
use std::time::Duration;

use future_relay::run_on;
use future_relay::FutureTask;
use future_relay::ThreadExecutor;

use crate::commons::enable_logger;

/// # Case 1: a streaming producer feeds a blocking consumer to completion
#[test]
fn test_stream_one_hundred_results() {
    enable_logger();
    let task = FutureTask::from_producer(|interface| {
        interface.set_progress_range(0, 100);
        for index in 0..100 {
            interface.report_result(index as u64 * 3);
            interface.set_progress_value(index + 1);
        }
    });
    let future = task.spawn_on(&ThreadExecutor, 0);

    let values = future.results().expect("producer reports no failure");
    assert_eq!(values.len(), 100);
    assert_eq!(values[99], 297);
    assert_eq!(future.progress_value(), 100);
}

/// # Case 2: cancel mid-stream; the producer observes it and exits early
#[test]
fn test_cooperative_cancel_across_threads() {
    let task = FutureTask::from_producer(|interface| {
        for index in 0..1_000_000 {
            if interface.is_canceled() {
                return;
            }
            interface.report_result(index);
            thread::sleep(Duration::from_millis(1));
        }
    });
    let future = task.spawn_on(&ThreadExecutor, 0);

    // let some results through, then cancel
    let arrived = future.wait_for_result(10).expect("early results arrive");
    assert_eq!(arrived, 10);
    future.cancel();

    let error = future.results().expect_err("canceled future must not yield values");
    assert!(error.is_canceled());
    assert!(future.is_canceled());
    assert!(
        future.wait_for_finished().is_err(),
        "wait_for_finished reports cancellation"
    );
}

/// # Case 3: several consumer threads block on one future and all wake
#[test]
fn test_many_waiters_wake_on_finish() {
    let task = FutureTask::from_fn(|| {
        thread::sleep(Duration::from_millis(50));
        "late value"
    });
    let future = task.spawn_on(&ThreadExecutor, 0);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let handle = future.clone();
            thread::spawn(move || handle.results())
        })
        .collect();

    for waiter in waiters {
        let values = waiter
            .join()
            .expect("waiter must not panic")
            .expect("future finishes cleanly");
        assert_eq!(values, vec!["late value"]);
    }
}

/// # Case 4: parallel producers on one interface, ordered consumption
#[test]
fn test_parallel_producers_with_filter_mode() {
    let task = FutureTask::from_producer_ordered(|interface| {
        let mut workers = Vec::new();
        for chunk in 0..4_usize {
            let producer = interface.clone();
            workers.push(thread::spawn(move || {
                for offset in 0..8 {
                    let index = chunk * 8 + offset;
                    producer.report_result_at(index, index as i64);
                }
            }));
        }
        for worker in workers {
            worker.join().expect("producer thread must not panic");
        }
    });
    let future = task.spawn_on(&ThreadExecutor, 0);

    let values = future.results().expect("all chunks reported");
    let expected: Vec<i64> = (0..32).collect();
    assert_eq!(values, expected);
}

/// # Case 5: a panic on the worker thread surfaces as a task failure
#[test]
fn test_worker_panic_surfaces_to_consumer() {
    let future = run_on(&ThreadExecutor, || -> u32 { panic!("worker blew up") });

    let error = future.results().expect_err("failure must be re-raised");
    assert!(error.to_string().contains("worker blew up"));
    assert!(future.is_finished(), "the task still finished exactly once");
}

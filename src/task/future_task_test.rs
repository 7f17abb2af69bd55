use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::*;
use crate::test_utils::enable_logger;
use crate::test_utils::ManualExecutor;
use crate::test_utils::RecordingSink;
use crate::Callout;
use crate::Error;
use crate::FutureError;

/// # Case 1: a value-returning callable reports its result and finishes
#[test]
fn test_from_fn_reports_and_finishes() {
    let executor = ManualExecutor::new();
    let future = FutureTask::from_fn(|| 6 * 7).spawn_on(&executor, 0);

    assert_eq!(executor.queued(), 1);
    assert!(!future.is_started());

    executor.run_all();
    assert!(future.is_finished());
    assert_eq!(future.results().unwrap(), vec![42]);
}

/// # Case 2: cancel before the task runs skips the callable entirely
#[test]
fn test_cancel_before_run_skips_callable() {
    enable_logger();
    let executor = ManualExecutor::new();
    let ran = Arc::new(AtomicBool::new(false));
    let ran_flag = ran.clone();

    let task = FutureTask::from_fn(move || {
        ran_flag.store(true, Ordering::SeqCst);
        1
    });
    let future = task.future();
    future.cancel();

    executor.execute(Box::new(task), 0);
    executor.run_all();

    assert!(!ran.load(Ordering::SeqCst), "callable must not execute");
    assert!(future.is_canceled());
    assert!(!future.is_running(), "task reached a terminal state");
    assert!(future.results().unwrap_err().is_canceled());
}

/// # Case 3: a panicking callable is captured, never propagated
#[test]
fn test_panic_captured() {
    let executor = ManualExecutor::new();
    let future = FutureTask::<i32>::from_fn(|| panic!("exploded")).spawn_on(&executor, 0);

    executor.run_all(); // must not propagate the panic

    assert!(future.is_finished(), "finish guard fires despite the panic");
    match future.results() {
        Err(Error::Task(crate::TaskFailure::Panicked(message))) => {
            assert!(message.contains("exploded"))
        }
        other => panic!("unexpected: {other:?}"),
    }
}

/// # Case 4: an Err from a fallible callable is captured as a failure
#[test]
fn test_fallible_error_captured() {
    let executor = ManualExecutor::new();
    let future = FutureTask::<i32>::from_fallible(|| {
        Err(FutureError::ResultUnavailable { index: 9 }.into())
    })
    .spawn_on(&executor, 0);

    executor.run_all();

    assert!(future.is_finished());
    match future.results() {
        Err(Error::Task(crate::TaskFailure::Failed(message))) => {
            assert!(message.contains("index 9"))
        }
        other => panic!("unexpected: {other:?}"),
    }
}

/// # Case 5: finish is reported exactly once, whatever the path
#[test]
fn test_finish_reported_exactly_once() {
    let executor = ManualExecutor::new();
    let task = FutureTask::from_fn(|| 1);
    let future = task.future();

    let sink = RecordingSink::new();
    future.state().attach(sink.clone());

    executor.execute(Box::new(task), 0);
    executor.run_all();

    assert_eq!(sink.count_of(&Callout::Finished), 1);
}

/// # Case 6: a streaming producer reports results and progress itself
#[test]
fn test_streaming_producer() {
    let executor = ManualExecutor::new();
    let task = FutureTask::from_producer(|interface| {
        interface.set_progress_range(0, 3);
        for index in 0..3_i32 {
            interface.report_result(index * 2);
            interface.set_progress_value(index + 1);
        }
    });
    let future = task.spawn_on(&executor, 0);

    executor.run_all();

    assert_eq!(future.results().unwrap(), vec![0, 2, 4]);
    assert_eq!(future.progress_value(), 3);
}

/// # Case 7: an ordered producer may report indexes in any order
#[test]
fn test_ordered_producer_out_of_order() {
    let executor = ManualExecutor::new();
    let task = FutureTask::from_producer_ordered(|interface| {
        for index in [3_usize, 1, 0, 2] {
            interface.report_result_at(index, index * 10);
        }
    });
    let future = task.spawn_on(&executor, 0);

    executor.run_all();
    assert_eq!(future.results().unwrap(), vec![0, 10, 20, 30]);
}

/// # Case 8: a cooperative producer exits early on cancel
#[test]
fn test_cooperative_cancel_mid_stream() {
    let executor = ManualExecutor::new();
    let task = FutureTask::from_producer(|interface| {
        for index in 0..100 {
            if interface.is_canceled() {
                return;
            }
            interface.report_result(index);
            if index == 9 {
                // consumer reacts after the tenth result
                interface.future().cancel();
            }
        }
    });
    let future = task.spawn_on(&executor, 0);

    executor.run_all();

    assert!(future.is_canceled());
    assert!(future.results().unwrap_err().is_canceled());
    // values reported before the cancel stayed in the store
    assert_eq!(future.result_at(9), Some(9));
    assert_eq!(future.result_at(10), None);
}

/// # Case 9: spawn_on forwards the priority to the executor
#[test]
fn test_spawn_priority_forwarded() {
    let mut executor = MockTaskExecutor::new();
    executor
        .expect_execute()
        .withf(|_runnable, priority| *priority == 7)
        .times(1)
        .returning(|_, _| ());

    let _future = FutureTask::from_fn(|| 0).spawn_on(&executor, 7);
}

/// # Case 10: run_on is the one-line path for simple callables
#[test]
fn test_run_on_thread_executor() {
    let future = run_on(&ThreadExecutor, || "done");
    assert_eq!(future.results().unwrap(), vec!["done"]);
}

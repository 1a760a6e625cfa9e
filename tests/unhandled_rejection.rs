//! The unhandled-rejection hook is process-wide, so these tests take turns.
use dispatch_promise::{reset_unhandled_rejection_handler, set_unhandled_rejection_handler, Error, Promise};
use parking_lot::Mutex;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

static SERIAL: Mutex<()> = parking_lot::const_mutex(());

/// Installs a hook recording every reported message and returns the log.
fn record() -> Arc<Mutex<Vec<String>>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    set_unhandled_rejection_handler(move |err| sink.lock().push(err.to_string()));
    log
}

fn count(log: &Mutex<Vec<String>>, message: &str) -> usize {
    log.lock().iter().filter(|m| *m == message).count()
}

/// Waits for asynchronous releases to reach the hook, then lets stragglers in.
fn settle_count(log: &Mutex<Vec<String>>, message: &str, expected: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    while count(log, message) < expected && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    thread::sleep(Duration::from_millis(50));
    count(log, message)
}

#[test]
fn test_unobserved_rejection_reported_once() {
    let _serial = SERIAL.lock();
    let log = record();
    let promise = Promise::<i32>::rejected("lonely");
    let clone = promise.clone();
    drop(promise);
    assert_eq!(count(&log, "lonely"), 0);
    drop(clone);
    assert_eq!(settle_count(&log, "lonely", 1), 1);
    reset_unhandled_rejection_handler();
}

#[test]
fn test_catch_suppresses_report() {
    let _serial = SERIAL.lock();
    let log = record();
    let promise = Promise::<i32>::rejected("caught");
    let recovered = promise.catch(|_| Ok(0));
    assert_eq!(recovered.wait().unwrap(), 0);
    drop(promise);
    drop(recovered);
    assert_eq!(settle_count(&log, "caught", 0), 0);
    reset_unhandled_rejection_handler();
}

#[test]
fn test_finally_suppresses_parent_report() {
    let _serial = SERIAL.lock();
    let log = record();
    let (promise, _fulfill, reject) = Promise::<i32>::pending();
    let tail = promise.finally(|| ());
    drop(promise);
    reject.reject("finally");
    // The tail carries the rejection on and is the one left unobserved.
    drop(tail);
    assert_eq!(settle_count(&log, "finally", 1), 1);
    reset_unhandled_rejection_handler();
}

#[test]
fn test_rejection_through_then_chain_reported_once() {
    let _serial = SERIAL.lock();
    let log = record();
    let head = Promise::<i32>::rejected("chained");
    let tail = head.then(|v| Ok(v + 1)).then(|v| Ok(v * 2));
    drop(head);
    drop(tail);
    assert_eq!(settle_count(&log, "chained", 1), 1);
    reset_unhandled_rejection_handler();
}

#[test]
fn test_handler_fault_unobserved_is_reported() {
    let _serial = SERIAL.lock();
    let log = record();
    let child = Promise::fulfilled(1).then(|_| -> Result<i32, Error> { panic!("fault") });
    drop(child);
    assert_eq!(settle_count(&log, "then handler panicked: fault", 1), 1);
    reset_unhandled_rejection_handler();
}

#[test]
fn test_awaited_rejection_not_reported() {
    let _serial = SERIAL.lock();
    let log = record();
    let promise = Promise::<i32>::rejected("awaited");
    assert!(futures::executor::block_on(promise).is_err());
    assert_eq!(settle_count(&log, "awaited", 0), 0);
    reset_unhandled_rejection_handler();
}

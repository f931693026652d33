// Copyright 2025 Kore Ledger, SL
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests of the process shell: messages, timers and signals
//! flowing through a running process.

use runtime::{signal, Process};

use parking_lot::Mutex;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// The signal coordinator is process-wide and admits one waiter, so
/// tests that start a process must not overlap.
static SERIAL: Mutex<()> = Mutex::new(());

/// Drives `process` on a background thread and returns the join handle.
fn run(process: &Arc<Process>) -> JoinHandle<()> {
    let driven = process.clone();
    let handle = std::thread::spawn(move || driven.start());
    // Give the consumer and the signal watcher time to come up.
    std::thread::sleep(Duration::from_millis(50));
    handle
}

#[test]
fn test_message_is_dispatched_with_payload() {
    let _guard = SERIAL.lock();
    let process = Process::new("ping-test");

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    process.register_message_handler("ping", move |message| {
        sink.lock().push(message.payload.to_vec());
        Ok(())
    });

    let driver = run(&process);
    assert!(process.post_message("ping", vec![1u8, 2, 3]));
    std::thread::sleep(Duration::from_millis(200));
    process.stop();
    driver.join().unwrap();

    assert_eq!(*seen.lock(), vec![vec![1u8, 2, 3]]);
}

#[test]
fn test_concurrent_producers_one_consumer() {
    let _guard = SERIAL.lock();
    let process = Process::new("fan-in-test");

    let dispatched = Arc::new(AtomicUsize::new(0));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));

    let counter = dispatched.clone();
    let gauge = in_flight.clone();
    let collisions = overlaps.clone();
    process.register_message_handler("work", move |_| {
        if gauge.fetch_add(1, Ordering::SeqCst) > 0 {
            collisions.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(1));
        gauge.fetch_sub(1, Ordering::SeqCst);
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let driver = run(&process);
    let mut producers = vec![];
    for _ in 0..4 {
        let producer = process.clone();
        producers.push(std::thread::spawn(move || {
            for _ in 0..10 {
                assert!(producer.post_message("work", ""));
            }
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }
    std::thread::sleep(Duration::from_millis(500));
    process.stop();
    driver.join().unwrap();

    // Every message dispatched exactly once, never two handlers at once.
    assert_eq!(dispatched.load(Ordering::SeqCst), 40);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_timer_fires_and_cancelled_timer_does_not() {
    let _guard = SERIAL.lock();
    let process = Process::new("timer-test");

    let fired = Arc::new(Mutex::new(Vec::new()));
    let sink = fired.clone();
    process.register_timer(1, move |timer| {
        sink.lock().push(timer.timer_id);
        Ok(())
    });
    let sink = fired.clone();
    process.register_timer(7, move |timer| {
        sink.lock().push(timer.timer_id);
        Ok(())
    });

    let driver = run(&process);
    process.start_timer(1, Duration::from_millis(30));
    process.start_timer(7, Duration::from_millis(100));
    // Cancelled while its backing thread is still sleeping.
    process.stop_timer(7);

    std::thread::sleep(Duration::from_millis(400));
    process.stop();
    driver.join().unwrap();

    assert_eq!(*fired.lock(), vec![1]);
}

#[test]
fn test_registered_signal_reaches_its_handler() {
    let _guard = SERIAL.lock();
    let process = Process::new("signal-test");

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = delivered.clone();
    process
        .register_signal_handler(libc::SIGUSR1, move |event| {
            sink.lock().push(event.signal);
            Ok(())
        })
        .unwrap();

    let driver = run(&process);
    signal::raise(libc::SIGUSR1);
    std::thread::sleep(Duration::from_millis(600));
    process.stop();
    driver.join().unwrap();

    assert_eq!(*delivered.lock(), vec![libc::SIGUSR1]);
}

#[test]
fn test_handler_failure_does_not_stop_the_process() {
    let _guard = SERIAL.lock();
    let process = Process::new("fault-test");

    let survived = Arc::new(AtomicUsize::new(0));
    process.register_message_handler("bad", |_| {
        Err(runtime::Error::Functional("bad message".to_owned()))
    });
    process.register_message_handler("panic", |_| panic!("handler panic"));
    let counter = survived.clone();
    process.register_message_handler("good", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let driver = run(&process);
    process.post_message("bad", "");
    process.post_message("panic", "");
    process.post_message("good", "");
    std::thread::sleep(Duration::from_millis(300));
    process.stop();
    driver.join().unwrap();

    assert_eq!(survived.load(Ordering::SeqCst), 1);
}

#[test]
fn test_stopped_process_is_not_restartable() {
    let _guard = SERIAL.lock();
    let process = Process::new("restart-test");

    let driver = run(&process);
    process.stop();
    driver.join().unwrap();

    // Returns immediately instead of spinning on the closed queue.
    process.start();
    assert!(!process.is_running());
}

#[test]
fn test_stop_hook_runs_once() {
    let _guard = SERIAL.lock();
    let process = Process::new("hook-test");

    let hooked = Arc::new(AtomicUsize::new(0));
    let counter = hooked.clone();
    process.set_stop_hook(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let driver = run(&process);
    assert!(process.is_running());
    process.stop();
    process.stop();
    driver.join().unwrap();

    assert!(!process.is_running());
    assert_eq!(hooked.load(Ordering::SeqCst), 1);
}

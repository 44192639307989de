#[path = "common/mod.rs"]
mod common;

use std::{
    thread,
    time::{Duration, Instant},
};

use nix::{
    sys::wait::{WaitStatus, waitpid},
    unistd::Pid,
};
use procg::{error::WorkerError, worker::Worker};

#[test]
fn start_join_lifecycle() {
    let started = Instant::now();
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(1)))
        .expect("start");

    assert!(worker.is_running());
    assert_ne!(worker.id(), 0);

    worker.join();
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(!worker.is_running());
    assert_eq!(worker.id(), 0);
}

#[test]
fn polling_is_running_does_not_disturb_a_live_child() {
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(10)))
        .expect("start");
    let id = worker.id();

    for _ in 0..10 {
        assert!(worker.is_running());
        assert_eq!(worker.id(), id);
    }

    worker.stop();
    worker.join();
}

#[test]
fn stop_terminates_within_the_observation_window() {
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(30)))
        .expect("start");
    assert!(worker.is_running());

    worker.stop();
    common::wait_until("worker to honor SIGTERM", Duration::from_secs(2), || {
        !worker.is_running()
    });
    assert_eq!(worker.id(), 0);
}

#[test]
fn stop_after_exit_observed_is_a_noop() {
    let mut worker = Worker::new();
    worker.start(|| {}).expect("start");
    worker.join();

    worker.stop();
    assert!(!worker.is_running());
    assert_eq!(worker.id(), 0);
}

#[test]
fn detach_leaves_the_child_running_unsupervised() {
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(30)))
        .expect("start");
    let id = worker.id();
    assert_ne!(id, 0);

    worker.detach();
    assert!(!worker.is_running());
    assert_eq!(worker.id(), 0);

    // The process itself is unaffected by the detach.
    assert!(common::is_process_alive(id));
    common::terminate(id);
}

#[test]
fn moving_a_handle_transfers_the_claim() {
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(10)))
        .expect("start");
    let id = worker.id();

    let mut workers = Vec::new();
    workers.push(worker);
    assert!(workers[0].is_running());
    assert_eq!(workers[0].id(), id);

    let mut taken = std::mem::take(&mut workers[0]);
    assert_eq!(workers[0].id(), 0);
    assert!(!workers[0].is_running());
    assert!(taken.is_running());
    assert_eq!(taken.id(), id);

    taken.stop();
    taken.join();
}

#[test]
fn wait_reports_the_exit_status_of_a_bound_argument_task() {
    let bound = 4;
    let mut worker = Worker::spawn(move || {
        if bound == 4 {
            std::process::exit(0);
        }
        std::process::exit(1);
    })
    .expect("spawn");

    let status = worker.wait().expect("wait");
    assert!(matches!(status, WaitStatus::Exited(_, 0)));
    assert!(!worker.is_running());
}

#[test]
fn wait_without_a_child_is_invalid_state_not_wait_failure() {
    let mut worker = Worker::new();
    match worker.wait() {
        Err(WorkerError::InvalidState) => {}
        other => panic!("expected InvalidState, got {other:?}"),
    }
}

#[test]
fn start_replaces_a_running_child() {
    let mut worker = Worker::new();
    worker
        .start(|| thread::sleep(Duration::from_secs(30)))
        .expect("start");
    let first = worker.id();

    worker
        .start(|| thread::sleep(Duration::from_secs(1)))
        .expect("restart");
    let second = worker.id();
    assert_ne!(first, second);

    worker.join();

    // The replaced child was sent SIGTERM at restart; the handle forgot it,
    // but it is still this process's child, so reap it directly.
    let _ = waitpid(Pid::from_raw(first as i32), None);
    assert!(!common::is_process_alive(first));
}

#[test]
fn drop_requests_termination_of_a_running_child() {
    let id;
    {
        let mut worker = Worker::new();
        worker
            .start(|| thread::sleep(Duration::from_secs(30)))
            .expect("start");
        id = worker.id();
    }

    // Termination is requested, not awaited; block until the signal lands.
    let _ = waitpid(Pid::from_raw(id as i32), None);
    assert!(!common::is_process_alive(id));
}

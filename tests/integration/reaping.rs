#[path = "common/mod.rs"]
mod common;

use std::time::Duration;

use procg::{
    test_utils::disposition_lock,
    worker::{Worker, enable_zombies, reap_all},
};

#[test]
fn discarded_children_vanish_without_a_wait() {
    let _guard = disposition_lock();
    enable_zombies(false).expect("disable zombie retention");

    let mut worker = Worker::new();
    worker.start(|| {}).expect("start");
    let id = worker.id();
    worker.detach();

    // No wait call anywhere: the OS discards the child on its own.
    common::wait_until(
        "auto-discarded child to vanish",
        Duration::from_secs(2),
        || !common::is_process_alive(id),
    );

    enable_zombies(true).expect("restore zombie retention");
}

#[test]
fn reap_all_clears_a_zombie_backlog() {
    let _guard = disposition_lock();
    enable_zombies(true).expect("default zombie retention");

    let mut ids = Vec::new();
    for _ in 0..3 {
        let mut worker = Worker::new();
        worker.start(|| {}).expect("start");
        ids.push(worker.id());
        worker.detach();
    }

    // The children exit immediately but nobody has waited on them yet.
    #[cfg(target_os = "linux")]
    for &id in &ids {
        common::wait_until("child to zombify", Duration::from_secs(2), || {
            common::is_zombie(id)
        });
    }
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(Duration::from_millis(300));

    for &id in &ids {
        assert!(
            common::is_process_alive(id),
            "child {id} should linger as a zombie"
        );
    }

    reap_all();

    for &id in &ids {
        assert!(!common::is_process_alive(id), "child {id} should be reaped");
    }
}

#[test]
fn externally_reaped_child_reports_not_running() {
    let _guard = disposition_lock();
    enable_zombies(true).expect("default zombie retention");

    let mut worker = Worker::new();
    worker.start(|| {}).expect("start");
    let id = worker.id();

    #[cfg(target_os = "linux")]
    common::wait_until("child to zombify", Duration::from_secs(2), || {
        common::is_zombie(id)
    });
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(Duration::from_millis(300));

    // Global sweep collects the child behind the handle's back.
    reap_all();

    assert!(!worker.is_running());
    assert_eq!(worker.id(), 0);
    assert!(!common::is_process_alive(id));
}

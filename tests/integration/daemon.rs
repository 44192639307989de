#[path = "common/mod.rs"]
mod common;

use std::{thread, time::Duration};

use nix::unistd::{self, Pid};
use procg::worker::DaemonWorker;

#[test]
fn daemon_child_runs_in_its_own_session() {
    let mut daemon = DaemonWorker::new();
    daemon
        .start(|| thread::sleep(Duration::from_secs(30)))
        .expect("start");
    let id = daemon.id();
    assert!(daemon.is_running());
    assert_ne!(id, 0);

    // The child calls setsid after the fork, so poll briefly.
    common::wait_until("child to take over a session", Duration::from_secs(2), || {
        unistd::getsid(Some(Pid::from_raw(id as i32)))
            .is_ok_and(|sid| sid.as_raw() as u32 == id)
    });

    daemon.stop();
    daemon.join();
    assert!(!daemon.is_running());
}

#[test]
fn dropping_a_daemon_detaches_instead_of_stopping() {
    let id;
    {
        let mut daemon = DaemonWorker::new();
        daemon
            .start(|| thread::sleep(Duration::from_secs(30)))
            .expect("start");
        id = daemon.id();
    }

    // Unlike a plain worker, dropping never signals the child.
    thread::sleep(Duration::from_millis(300));
    assert!(common::is_process_alive(id));

    common::terminate(id);
}

#[test]
fn spawn_constructor_starts_the_daemon_immediately() {
    let mut daemon =
        DaemonWorker::spawn(|| thread::sleep(Duration::from_secs(10))).expect("spawn");
    assert!(daemon.is_running());

    daemon.stop();
    daemon.join();
}

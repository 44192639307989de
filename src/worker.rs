//! Worker process supervision over `fork(2)`.
//!
//! A [`Worker`] owns at most one child process and drives it through a small
//! lifecycle: spawn a unit of work, poll or block for completion, request
//! termination, or detach. Reaping policy for the whole process table is
//! controlled separately via [`enable_zombies`] and [`reap_all`].

use std::{process, thread, time::Duration};

use nix::{
    sys::{
        signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal},
        wait::{WaitPidFlag, WaitStatus, waitpid},
    },
    unistd::{self, ForkResult, Pid},
};
use tracing::{debug, warn};

use crate::error::WorkerError;

/// Supervises a single child process end-to-end.
///
/// A handle tracks at most one child at a time. The tracked id is cleared
/// once an exit has been observed by [`Worker::is_running`], [`Worker::join`]
/// or [`Worker::wait`], or when the handle is explicitly detached. Dropping
/// a handle whose child is still running requests termination without
/// waiting for it, so the process may briefly outlive the handle.
///
/// Handles are not internally synchronized; callers must serialize access to
/// a single handle. Distinct handles are independent and may be driven from
/// distinct threads. Moving a handle moves the child claim with it; use
/// [`std::mem::take`] when the source needs to stay behind in the empty
/// state.
#[derive(Debug, Default)]
pub struct Worker {
    child: Option<Pid>,
}

impl Worker {
    /// Creates a handle with no supervised child.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle and immediately starts `task` in a child process.
    pub fn spawn<F>(task: F) -> Result<Self, WorkerError>
    where
        F: FnOnce(),
    {
        let mut worker = Self::new();
        worker.start(task)?;
        Ok(worker)
    }

    /// Starts `task` in a freshly forked child process.
    ///
    /// Any child already tracked by this handle is sent a termination
    /// request first; the replacement is spawned without waiting for the old
    /// child to die. In the child the task runs to completion and the
    /// process then exits with status 0; a task that terminates the process
    /// itself (e.g. via [`std::process::exit`]) decides its own status.
    ///
    /// The task runs after `fork(2)` in a process that inherited only the
    /// calling thread, so it must not rely on locks or threads owned by the
    /// parent.
    pub fn start<F>(&mut self, task: F) -> Result<(), WorkerError>
    where
        F: FnOnce(),
    {
        if self.is_running() {
            self.stop();
        }

        self.child = Some(spawn_child(task, false)?);
        Ok(())
    }

    /// Returns whether the supervised child is still running.
    ///
    /// This is an observe-and-reap check, which is why it takes `&mut self`:
    /// when the child turns out to have exited, its status is collected as a
    /// side effect and the handle is cleared. A child collected behind this
    /// handle's back (see [`reap_all`]) is likewise treated as gone. Never
    /// blocks, and has no effect on a still-running child.
    pub fn is_running(&mut self) -> bool {
        let Some(pid) = self.child else {
            return false;
        };

        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            Ok(WaitStatus::Exited(..) | WaitStatus::Signaled(..)) => {
                debug!("worker {pid} exited; reaped");
                self.child = None;
                false
            }
            // Stopped or traced children still occupy the process table.
            Ok(_) => true,
            Err(errno) => {
                // ECHILD: collected elsewhere, e.g. by reap_all() or after
                // enable_zombies(false).
                debug!("worker {pid} no longer waitable: {errno}");
                self.child = None;
                false
            }
        }
    }

    /// Returns the child's process id, or `0` when none is tracked.
    pub fn id(&self) -> u32 {
        match self.child {
            Some(pid) => pid.as_raw() as u32,
            None => 0,
        }
    }

    /// Blocks until the supervised child is no longer running.
    ///
    /// Polls [`Worker::is_running`] with an exponential backoff, 10ms
    /// doubling up to 1s, instead of an OS-level blocking wait, so a handle
    /// without a live child returns immediately and a handle whose child was
    /// reaped externally behaves the same way. Carries no result; use
    /// [`Worker::wait`] for the exit status.
    pub fn join(&mut self) {
        const DELAY_MAX: Duration = Duration::from_millis(1000);
        let mut delay = Duration::from_millis(10);

        while self.is_running() {
            thread::sleep(delay);
            delay = (delay * 2).min(DELAY_MAX);
        }
    }

    /// Blocks in `waitpid(2)` until the child exits and returns its status.
    ///
    /// Unlike [`Worker::join`] this is a result-bearing wait: it fails with
    /// [`WorkerError::InvalidState`] when no child is tracked, and with
    /// [`WorkerError::WaitFailure`] when the wait itself fails. On success
    /// the tracked id is cleared and the decoded [`WaitStatus`] (normal exit
    /// or terminating signal) is returned.
    pub fn wait(&mut self) -> Result<WaitStatus, WorkerError> {
        let Some(pid) = self.child else {
            return Err(WorkerError::InvalidState);
        };

        match waitpid(pid, None) {
            Ok(status) => {
                debug!("worker {pid} finished: {status:?}");
                self.child = None;
                Ok(status)
            }
            Err(errno) => Err(WorkerError::WaitFailure { source: errno }),
        }
    }

    /// Requests graceful termination of the supervised child.
    ///
    /// Sends SIGTERM and returns immediately; the tracked id is cleared only
    /// once a later [`Worker::is_running`], [`Worker::join`] or
    /// [`Worker::wait`] observes the exit. A child that traps or ignores the
    /// signal keeps running; no stronger escalation is attempted. Without a
    /// tracked child this is a no-op.
    pub fn stop(&self) {
        if let Some(pid) = self.child {
            debug!("requesting termination of worker {pid}");
            if let Err(errno) = signal::kill(pid, Signal::SIGTERM) {
                warn!("failed to signal worker {pid}: {errno}");
            }
        }
    }

    /// Stops supervising the child without signaling it.
    ///
    /// The handle reverts to the empty state. The child, if still alive,
    /// keeps running unsupervised and its id stays valid in the OS process
    /// table.
    pub fn detach(&mut self) {
        if let Some(pid) = self.child.take() {
            debug!("detached worker {pid}");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

/// A worker whose child runs in its own session.
///
/// The child calls `setsid(2)` before running its task, decoupling it from
/// the parent's controlling terminal. Dropping the handle detaches instead
/// of stopping: a daemon is never signaled on destruction.
#[derive(Debug, Default)]
pub struct DaemonWorker {
    inner: Worker,
}

impl DaemonWorker {
    /// Creates a handle with no supervised child.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle and immediately starts `task` as a daemon child.
    pub fn spawn<F>(task: F) -> Result<Self, WorkerError>
    where
        F: FnOnce(),
    {
        let mut daemon = Self::new();
        daemon.start(task)?;
        Ok(daemon)
    }

    /// Starts `task` in a child decoupled into a fresh session.
    ///
    /// Otherwise identical to [`Worker::start`].
    pub fn start<F>(&mut self, task: F) -> Result<(), WorkerError>
    where
        F: FnOnce(),
    {
        if self.inner.is_running() {
            self.inner.stop();
        }

        self.inner.child = Some(spawn_child(task, true)?);
        Ok(())
    }

    /// See [`Worker::is_running`].
    pub fn is_running(&mut self) -> bool {
        self.inner.is_running()
    }

    /// See [`Worker::id`].
    pub fn id(&self) -> u32 {
        self.inner.id()
    }

    /// See [`Worker::join`].
    pub fn join(&mut self) {
        self.inner.join();
    }

    /// See [`Worker::wait`].
    pub fn wait(&mut self) -> Result<WaitStatus, WorkerError> {
        self.inner.wait()
    }

    /// See [`Worker::stop`].
    pub fn stop(&self) {
        self.inner.stop();
    }

    /// See [`Worker::detach`].
    pub fn detach(&mut self) {
        self.inner.detach();
    }
}

impl Drop for DaemonWorker {
    fn drop(&mut self) {
        self.inner.detach();
    }
}

/// Forks and runs `task` in the child, optionally in a new session.
fn spawn_child<F>(task: F, new_session: bool) -> Result<Pid, WorkerError>
where
    F: FnOnce(),
{
    // SAFETY: the child branch never returns into caller code; it runs the
    // task and exits without touching the parent's shared state.
    match unsafe { unistd::fork() } {
        Ok(ForkResult::Child) => {
            if new_session && let Err(errno) = unistd::setsid() {
                warn!("setsid failed in daemon child: {errno}");
            }
            task();
            process::exit(0);
        }
        Ok(ForkResult::Parent { child }) => {
            debug!("spawned worker {child}");
            Ok(child)
        }
        Err(errno) => Err(WorkerError::SpawnFailure { source: errno }),
    }
}

/// Controls whether exited children linger as zombies.
///
/// Process-wide: with `false`, SIGCHLD is set to be ignored and the OS
/// discards each child's exit status as it exits, without requiring a wait;
/// that status is then lost to [`Worker::wait`]. With `true` (the OS
/// default) exited children remain in the process table until collected by
/// some [`Worker::is_running`], [`Worker::wait`] or [`reap_all`] call.
/// Affects all children exiting after the call; there is no automatic
/// teardown beyond process exit.
pub fn enable_zombies(enabled: bool) -> Result<(), WorkerError> {
    let handler = if enabled {
        SigHandler::SigDfl
    } else {
        SigHandler::SigIgn
    };
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());

    debug!(
        "zombie retention {}",
        if enabled { "enabled" } else { "disabled" }
    );
    // SAFETY: installs a disposition constant, not a handler function.
    unsafe { signal::sigaction(Signal::SIGCHLD, &action) }
        .map(|_| ())
        .map_err(|errno| WorkerError::PolicyFailure { source: errno })
}

/// Reaps every immediately collectable child of this process.
///
/// Repeats a non-blocking wait-for-any until nothing more is collectable.
/// Reaping is process-table-wide and does not honor handle ownership: a
/// [`Worker`] whose child is collected here observes the fact on its next
/// liveness check and reports it as no longer running.
pub fn reap_all() {
    loop {
        match waitpid(None::<Pid>, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(status) => debug!("reaped child: {status:?}"),
            // ECHILD: no children left to collect.
            Err(_) => break,
        }
    }
}

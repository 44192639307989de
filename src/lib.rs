//! Procg is a small process-lifecycle and resource-ownership layer for
//! Unix-like operating systems. It wraps raw POSIX facilities in owning
//! handles: file descriptors and pipes that close themselves, dynamically
//! loaded module symbols, and worker processes that can be spawned,
//! monitored, joined, stopped, or detached, with process-wide control over
//! zombie reaping.

/// Command-line interface for the module test harness.
pub mod cli;

/// Descriptor ownership.
pub mod fd;

/// Pipe ownership.
pub mod pipe;

/// Dynamic module symbol loading.
pub mod modsym;

/// Worker process supervision.
pub mod worker;

/// Error handling.
pub mod error;

/// Shared locks for tests that touch process-wide state.
pub mod test_utils;

//! Error handling for procg.
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Defines all possible errors surfaced by worker process supervision.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Process creation failed.
    #[error("failed to fork worker process: {source}")]
    SpawnFailure {
        /// The OS error reported by `fork(2)`.
        source: Errno,
    },

    /// A result-bearing wait was requested while no child is tracked.
    #[error("no worker process to wait for")]
    InvalidState,

    /// The blocking wait syscall itself failed.
    #[error("failed to wait for worker process: {source}")]
    WaitFailure {
        /// The OS error reported by `waitpid(2)`.
        source: Errno,
    },

    /// The zombie-disposition change was rejected by the OS.
    #[error("failed to change child reaping disposition: {source}")]
    PolicyFailure {
        /// The OS error reported by `sigaction(2)`.
        source: Errno,
    },
}

/// Errors from descriptor and pipe ownership.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Error duplicating a descriptor.
    #[error("failed to duplicate descriptor: {source}")]
    DupFailed {
        /// The OS error reported by `dup(2)`.
        source: Errno,
    },

    /// Error creating a pipe pair.
    #[error("failed to create pipe: {source}")]
    PipeFailed {
        /// The OS error reported by `pipe(2)`.
        source: Errno,
    },
}

/// Errors from dynamic module symbol loading.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The module could not be opened.
    #[error("failed to load module {}: {reason}", path.display())]
    OpenFailed {
        /// Path of the module that failed to open.
        path: PathBuf,
        /// Loader-reported reason.
        reason: String,
    },

    /// The module loaded but the requested symbol is absent.
    #[error("symbol '{symbol}' not found in {}: {reason}", path.display())]
    SymbolNotFound {
        /// The symbol that could not be resolved.
        symbol: String,
        /// Path of the module that was searched.
        path: PathBuf,
        /// Loader-reported reason.
        reason: String,
    },
}

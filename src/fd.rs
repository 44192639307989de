//! Exclusive-ownership handle for raw file descriptors.
use std::os::fd::{AsRawFd, RawFd};

use nix::unistd;
use tracing::warn;

use crate::error::ResourceError;

/// Sentinel value meaning "no descriptor owned".
const NO_FD: RawFd = -1;

/// Owns a single file descriptor and closes it when dropped.
///
/// Ownership is exclusive: there is no implicit duplication, and equality
/// between handles is deliberately not defined (two handles never own the
/// same descriptor, so comparing their numeric values is seldom an intended
/// operation). Use [`Fd::dup`] for an explicit `dup(2)` and [`Fd::release`]
/// to take the raw value out without closing it.
#[derive(Debug)]
pub struct Fd {
    fd: RawFd,
}

impl Fd {
    /// Wraps a raw descriptor, taking ownership of it.
    pub fn new(fd: RawFd) -> Self {
        Self { fd }
    }

    /// Returns the raw descriptor value without giving up ownership.
    pub fn get(&self) -> RawFd {
        self.fd
    }

    /// Returns whether a descriptor is currently owned.
    pub fn is_valid(&self) -> bool {
        self.fd != NO_FD
    }

    /// Replaces the owned descriptor, closing the previous one first.
    pub fn set(&mut self, fd: RawFd) -> RawFd {
        self.close();
        self.fd = fd;
        fd
    }

    /// Duplicates the descriptor into a new, independently owned handle.
    pub fn dup(&self) -> Result<Self, ResourceError> {
        let fd = unistd::dup(self.fd)
            .map_err(|errno| ResourceError::DupFailed { source: errno })?;
        Ok(Self::new(fd))
    }

    /// Takes the descriptor out, leaving the handle empty without closing.
    pub fn release(&mut self) -> RawFd {
        let fd = self.fd;
        self.fd = NO_FD;
        fd
    }

    /// Closes the descriptor if one is owned. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.fd != NO_FD {
            if let Err(errno) = unistd::close(self.fd) {
                warn!("failed to close descriptor {}: {errno}", self.fd);
            }
            self.fd = NO_FD;
        }
    }
}

impl Default for Fd {
    /// An empty handle owning no descriptor.
    fn default() -> Self {
        Self { fd: NO_FD }
    }
}

impl From<RawFd> for Fd {
    fn from(fd: RawFd) -> Self {
        Self::new(fd)
    }
}

impl AsRawFd for Fd {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        self.close();
    }
}

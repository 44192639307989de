//! Pipe ownership built from descriptor handles.
use std::os::fd::{IntoRawFd, RawFd};

use nix::unistd;

use crate::{error::ResourceError, fd::Fd};

/// An anonymous pipe whose ends close automatically when dropped.
///
/// Either end can be closed independently, the usual dance around `fork(2)`
/// where the parent keeps one end and the child the other. Equality between
/// pipes is not defined for the same reason it is not defined for [`Fd`].
#[derive(Debug)]
pub struct Pipe {
    read: Fd,
    write: Fd,
}

impl Pipe {
    /// Creates a connected pipe pair via `pipe(2)`.
    pub fn new() -> Result<Self, ResourceError> {
        let (read, write) =
            unistd::pipe().map_err(|errno| ResourceError::PipeFailed { source: errno })?;
        Ok(Self {
            read: Fd::new(read.into_raw_fd()),
            write: Fd::new(write.into_raw_fd()),
        })
    }

    /// Raw descriptor of the read end, `-1` if closed.
    pub fn read_fd(&self) -> RawFd {
        self.read.get()
    }

    /// Raw descriptor of the write end, `-1` if closed.
    pub fn write_fd(&self) -> RawFd {
        self.write.get()
    }

    /// Returns whether either end is still open.
    pub fn is_open(&self) -> bool {
        self.read.is_valid() || self.write.is_valid()
    }

    /// Closes the read end.
    pub fn close_read(&mut self) -> &mut Self {
        self.read.close();
        self
    }

    /// Closes the write end.
    pub fn close_write(&mut self) -> &mut Self {
        self.write.close();
        self
    }

    /// Closes both ends.
    pub fn close(&mut self) {
        self.read.close();
        self.write.close();
    }

    /// Takes ownership of the read end, leaving it closed in the pipe.
    pub fn take_read(&mut self) -> Fd {
        std::mem::take(&mut self.read)
    }

    /// Takes ownership of the write end, leaving it closed in the pipe.
    pub fn take_write(&mut self) -> Fd {
        std::mem::take(&mut self.write)
    }
}

//! Error types for the kernel.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a filesystem syscall.
///
/// The public syscalls collapse these to absence values; the `try_*`
/// variants expose them.
#[derive(Debug, Error)]
pub enum SyscallError {
    /// Path does not exist
    #[error("{}: no such file or directory", .0.display())]
    NotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("{}: not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Any other host I/O failure
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyscallError {
    /// Classify a host I/O error for `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyscallError::NotFound(_))
    }
}

/// Fault returned by a step function.
///
/// Any fault terminates the faulting process; the kernel keeps running.
#[derive(Debug, Error)]
pub enum StepFault {
    /// Program-reported crash
    #[error("{0}")]
    Crashed(String),

    /// A syscall failed and the program chose not to recover
    #[error("syscall failed: {0}")]
    Syscall(#[from] SyscallError),

    /// Bound argument at `index` was not supplied
    #[error("missing argument #{index}")]
    MissingArgument { index: usize },

    /// Bound argument at `index` has the wrong kind
    #[error("argument #{index}: expected {expected}")]
    BadArgument { index: usize, expected: &'static str },
}

impl StepFault {
    /// Create a crash fault with message.
    pub fn crashed(msg: impl Into<String>) -> Self {
        Self::Crashed(msg.into())
    }
}

/// Failure loading or saving a `KernelConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_classifies_not_found() {
        let err = SyscallError::from_io(
            "/nope",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "/nope: no such file or directory");
    }

    #[test]
    fn test_from_io_keeps_other_errors() {
        let err = SyscallError::from_io(
            "/locked",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, SyscallError::Io { .. }));
    }

    #[test]
    fn test_step_fault_display() {
        assert_eq!(StepFault::crashed("boom").to_string(), "boom");
        assert_eq!(
            StepFault::MissingArgument { index: 1 }.to_string(),
            "missing argument #1"
        );
        let fault: StepFault = SyscallError::NotADirectory("/etc/hosts".into()).into();
        assert_eq!(fault.to_string(), "syscall failed: /etc/hosts: not a directory");
    }
}

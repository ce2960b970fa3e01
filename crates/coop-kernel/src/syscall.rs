//! Syscall surface exposed to step functions
//!
//! Filesystem syscalls are thin wrappers over host I/O, resolved against
//! the kernel-wide working directory. Each comes in two forms:
//! - `try_*` returns `Result<_, SyscallError>`
//! - the plain form logs the failure and returns an absence value
//!   (empty listing / `false` / `None`), never a fault.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};

use crate::error::SyscallError;
use crate::kernel::Kernel;
use crate::process::Pcb;
use crate::types::{ProcessId, ProcessInfo, ProcessState};

impl Kernel {
    /// Resolve `path` against the working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.cwd.join(path)
    }

    // ========================================================================
    // Filesystem
    // ========================================================================

    /// Names in the working directory, sorted.
    pub fn try_list_directory(&self) -> Result<Vec<String>, SyscallError> {
        let entries =
            fs::read_dir(&self.cwd).map_err(|e| SyscallError::from_io(&self.cwd, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SyscallError::from_io(&self.cwd, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Names in the working directory; empty on error.
    pub fn list_directory(&self) -> Vec<String> {
        self.try_list_directory().unwrap_or_else(|e| {
            warn!("ls: {}", e);
            Vec::new()
        })
    }

    /// Change the working directory. The target must be an existing directory.
    pub fn try_change_directory(&mut self, path: impl AsRef<Path>) -> Result<(), SyscallError> {
        let target = self.resolve(path);
        let target = fs::canonicalize(&target).map_err(|e| SyscallError::from_io(&target, e))?;
        if !target.is_dir() {
            return Err(SyscallError::NotADirectory(target));
        }
        debug!("cd: {} -> {}", self.cwd.display(), target.display());
        self.cwd = target;
        Ok(())
    }

    /// Change the working directory; false if the target is not a directory.
    pub fn change_directory(&mut self, path: impl AsRef<Path>) -> bool {
        match self.try_change_directory(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("cd: {}", e);
                false
            }
        }
    }

    /// Create an empty file, or bump the modification time of an existing one.
    pub fn try_create_or_touch_file(&self, path: impl AsRef<Path>) -> Result<(), SyscallError> {
        let target = self.resolve(path);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target)
            .map_err(|e| SyscallError::from_io(&target, e))?;
        file.set_modified(SystemTime::now())
            .map_err(|e| SyscallError::from_io(&target, e))?;
        Ok(())
    }

    /// Create or touch a file; false on error.
    pub fn create_or_touch_file(&self, path: impl AsRef<Path>) -> bool {
        match self.try_create_or_touch_file(path) {
            Ok(()) => true,
            Err(e) => {
                warn!("touch: {}", e);
                false
            }
        }
    }

    /// Full contents of a file as text.
    pub fn try_read_file(&self, path: impl AsRef<Path>) -> Result<String, SyscallError> {
        let target = self.resolve(path);
        fs::read_to_string(&target).map_err(|e| SyscallError::from_io(&target, e))
    }

    /// Full contents of a file; `None` on error.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.try_read_file(path) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!("cat: {}", e);
                None
            }
        }
    }

    // ========================================================================
    // Process control
    // ========================================================================

    /// Mark `pcb` as terminated. Used by a process on its own PCB.
    pub fn exit_process(&self, pcb: &mut Pcb) {
        debug!("[{}] process {} exiting", self.clock(), pcb.pid());
        pcb.state = ProcessState::Terminated;
    }

    /// Kill another process (or the caller itself).
    pub fn kill_process(&mut self, pid: ProcessId) -> bool {
        self.kill(pid)
    }

    /// Process table snapshot.
    pub fn ps(&self) -> Vec<ProcessInfo> {
        self.list_processes()
    }
}

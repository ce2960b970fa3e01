//! Coop OS Kernel - Cooperative Process Simulator
//!
//! This crate implements a minimal single-threaded kernel that hosts
//! logical processes (a typed record plus a step function) and schedules
//! them round-robin, one step per dispatch.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Kernel                               │
//! │                                                             │
//! │   ┌───────────────┐    ┌───────────────┐                   │
//! │   │ Process table │    │  dispatch()   │                   │
//! │   │  pid -> Pcb   │───▶│ demote, wake, │                   │
//! │   │               │    │ pick, step,   │                   │
//! │   └───────────────┘    │ react         │                   │
//! │                        └───────────────┘                   │
//! │   ┌───────────────┐    ┌───────────────┐                   │
//! │   │  ReadyQueue   │    │   WaitSet     │                   │
//! │   │  FIFO of pids │    │ polled/tick   │                   │
//! │   └───────────────┘    └───────────────┘                   │
//! │                                                             │
//! │   Syscalls: ls / cd / touch / cat / exit / kill             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              │ step(kernel, pcb, args)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Pcb                                 │
//! │   - pid, name, state, cpu_time, priority                    │
//! │   - AddressSpace (private byte store)                       │
//! │   - Scratch (opaque per-process state owned by the program) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - `types` - Core identifiers, the five-state process model, snapshots
//! - `memory` - Per-process `AddressSpace`
//! - `process` - `Pcb`, step function contract, bound arguments, scratch slot
//! - `scheduler` - `ReadyQueue` (FIFO) and `WaitSet`
//! - `kernel` - `Kernel`: spawn, dispatch, kill, run loop
//! - `syscall` - Filesystem and process-control syscalls
//! - `invariants` - Runtime-checkable scheduler invariants
//! - `config` - `KernelConfig`
//! - `error` - Error types

pub mod config;
pub mod error;
pub mod invariants;
pub mod kernel;
pub mod memory;
pub mod process;
pub mod scheduler;
pub mod syscall;
pub mod types;

pub use config::KernelConfig;
pub use error::{ConfigError, StepFault, SyscallError};
pub use invariants::{check_all_invariants, InvariantViolation};
pub use kernel::{Kernel, RunReport};
pub use memory::{AddressSpace, DEFAULT_PAGE_SIZE};
pub use process::{Arg, Args, Pcb, Scratch, StepFn, StepResult, WakeCondition};
pub use scheduler::{ReadyQueue, WaitSet};
pub use types::{KernelMetrics, ProcessId, ProcessInfo, ProcessState};

//! Coop OS demo programs
//!
//! Ordinary client code of the kernel API. Each program is a step
//! function; per-process progress lives in the PCB's scratch slot.
//!
//! - `idle` - counts `cycles` steps, then exits
//! - `counter` - counts to `target`, then exits
//! - `memory_touch` - writes one byte per page for `pages` pages
//! - `cpu_burst` - 20 steps of busy arithmetic
//! - `io_simulation` - compute, block on simulated I/O, finish

pub mod registry;
pub mod workloads;

pub use registry::{lookup, spawn_program, ProgramSpec, PROGRAMS};
pub use workloads::{counter, cpu_burst, idle, io_simulation, memory_touch};

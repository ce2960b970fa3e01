//! Name → program registry
//!
//! Lets a front end spawn demo programs by name.

use coop_kernel::{Arg, Args, Kernel, ProcessId, StepFn};

use crate::workloads::{counter, cpu_burst, idle, io_simulation, memory_touch};

/// A spawnable program
#[derive(Clone, Copy)]
pub struct ProgramSpec {
    /// Name used on the command line
    pub name: &'static str,
    /// Step function
    pub step: StepFn,
    /// Integer argument used when the caller gives none
    pub default_arg: Option<i64>,
    /// One-line description for help output
    pub description: &'static str,
}

/// All known programs
pub const PROGRAMS: &[ProgramSpec] = &[
    ProgramSpec {
        name: "idle",
        step: idle,
        default_arg: Some(10),
        description: "Run N idle cycles",
    },
    ProgramSpec {
        name: "counter",
        step: counter,
        default_arg: Some(10),
        description: "Count to N",
    },
    ProgramSpec {
        name: "memtest",
        step: memory_touch,
        default_arg: Some(10),
        description: "Touch N pages of memory",
    },
    ProgramSpec {
        name: "cpuburst",
        step: cpu_burst,
        default_arg: None,
        description: "Busy arithmetic for 20 steps",
    },
    ProgramSpec {
        name: "io",
        step: io_simulation,
        default_arg: None,
        description: "Compute, block on I/O, finish",
    },
];

/// Find a program by name.
pub fn lookup(name: &str) -> Option<&'static ProgramSpec> {
    PROGRAMS.iter().find(|spec| spec.name == name)
}

impl ProgramSpec {
    /// Build the argument list, falling back to the default argument.
    pub fn args(&self, arg: Option<i64>) -> Args {
        arg.or(self.default_arg).map(Arg::Int).into_iter().collect()
    }
}

/// Spawn `name` with an optional integer argument. `None` if unknown.
pub fn spawn_program(
    kernel: &mut Kernel,
    name: &str,
    arg: Option<i64>,
    process_name: &str,
) -> Option<ProcessId> {
    let spec = lookup(name)?;
    Some(kernel.spawn(spec.step, spec.args(arg), process_name))
}

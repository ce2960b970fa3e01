//! Scheduler invariants
//!
//! Runtime-checkable properties that must hold between dispatches. Used
//! by tests after every dispatch and available to front ends as a
//! self-check.
//!
//! # Invariants
//!
//! 1. **Single Running**: At most one process is RUNNING
//! 2. **Ready Membership**: A process is in the ready queue iff it is READY
//!    (the last-run process may be READY without being queued yet)
//! 3. **Wait Membership**: A process is in the wait set iff it is WAITING
//! 4. **No Terminated Entries**: The table never holds a TERMINATED PCB
//! 5. **PID Monotonicity**: Every live pid is below the next pid
//! 6. **Running Reference**: The running reference names a live RUNNING or
//!    READY process

use std::collections::BTreeSet;

use crate::kernel::Kernel;
use crate::types::ProcessState;

/// An invariant violation with details
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: &'static str,
    /// Description of what went wrong
    pub description: String,
}

impl InvariantViolation {
    fn new(invariant: &'static str, description: String) -> Self {
        Self {
            invariant,
            description,
        }
    }
}

/// Check all kernel invariants.
///
/// Returns a list of violations (empty if all invariants hold).
pub fn check_all_invariants(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    violations.extend(check_single_running(kernel));
    violations.extend(check_ready_membership(kernel));
    violations.extend(check_wait_membership(kernel));
    violations.extend(check_no_terminated_entries(kernel));
    violations.extend(check_pid_monotonicity(kernel));
    violations.extend(check_running_reference(kernel));

    violations
}

/// Invariant 1: At most one RUNNING process
fn check_single_running(kernel: &Kernel) -> Vec<InvariantViolation> {
    let running = kernel
        .processes
        .values()
        .filter(|pcb| pcb.state == ProcessState::Running)
        .count()
        + usize::from(kernel.on_cpu.is_some());

    if running > 1 {
        vec![InvariantViolation::new(
            "single_running",
            format!("{} processes are RUNNING", running),
        )]
    } else {
        Vec::new()
    }
}

/// Invariant 2: Ready queue membership matches READY state
fn check_ready_membership(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen = BTreeSet::new();

    for pid in kernel.ready.iter() {
        if !seen.insert(pid) {
            violations.push(InvariantViolation::new(
                "ready_membership",
                format!("Process {} queued more than once", pid),
            ));
        }
        match kernel.processes.get(&pid) {
            Some(pcb) if pcb.state == ProcessState::Ready => {}
            Some(pcb) => violations.push(InvariantViolation::new(
                "ready_membership",
                format!("Process {} queued while {}", pid, pcb.state),
            )),
            None => violations.push(InvariantViolation::new(
                "ready_membership",
                format!("Queued process {} is not in the process table", pid),
            )),
        }
    }

    for (pid, pcb) in &kernel.processes {
        if pcb.state == ProcessState::Ready
            && !kernel.ready.contains(*pid)
            && kernel.running != Some(*pid)
        {
            violations.push(InvariantViolation::new(
                "ready_membership",
                format!("Process {} is READY but not queued", pid),
            ));
        }
    }

    violations
}

/// Invariant 3: Wait set membership matches WAITING state
fn check_wait_membership(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for pid in kernel.waiting.iter() {
        match kernel.processes.get(&pid) {
            Some(pcb) if pcb.state == ProcessState::Waiting => {}
            Some(pcb) => violations.push(InvariantViolation::new(
                "wait_membership",
                format!("Process {} in wait set while {}", pid, pcb.state),
            )),
            None => violations.push(InvariantViolation::new(
                "wait_membership",
                format!("Waiting process {} is not in the process table", pid),
            )),
        }
    }

    for (pid, pcb) in &kernel.processes {
        if pcb.state == ProcessState::Waiting && !kernel.waiting.contains(*pid) {
            violations.push(InvariantViolation::new(
                "wait_membership",
                format!("Process {} is WAITING but not in the wait set", pid),
            ));
        }
    }

    violations
}

/// Invariant 4: No TERMINATED (or NEW) PCB in the table
fn check_no_terminated_entries(kernel: &Kernel) -> Vec<InvariantViolation> {
    kernel
        .processes
        .values()
        .filter(|pcb| matches!(pcb.state, ProcessState::Terminated | ProcessState::New))
        .map(|pcb| {
            InvariantViolation::new(
                "no_terminated_entries",
                format!("Process {} is in the table while {}", pcb.pid(), pcb.state),
            )
        })
        .collect()
}

/// Invariant 5: Every live pid is below `next_pid`
fn check_pid_monotonicity(kernel: &Kernel) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if let Some((&max_pid, _)) = kernel.processes.last_key_value() {
        if max_pid.0 >= kernel.next_pid {
            violations.push(InvariantViolation::new(
                "pid_monotonicity",
                format!(
                    "next_pid ({}) is not greater than live pid {}",
                    kernel.next_pid, max_pid
                ),
            ));
        }
    }

    violations
}

/// Invariant 6: The running reference names a live RUNNING or READY process
fn check_running_reference(kernel: &Kernel) -> Vec<InvariantViolation> {
    let Some(pid) = kernel.running else {
        return Vec::new();
    };

    if kernel.on_cpu.as_ref().is_some_and(|cpu| cpu.pid == pid) {
        return Vec::new();
    }

    match kernel.processes.get(&pid) {
        Some(pcb) if matches!(pcb.state, ProcessState::Running | ProcessState::Ready) => {
            Vec::new()
        }
        Some(pcb) => vec![InvariantViolation::new(
            "running_reference",
            format!("Running reference {} points at a {} process", pid, pcb.state),
        )],
        None => vec![InvariantViolation::new(
            "running_reference",
            format!("Running reference {} points at a dead process", pid),
        )],
    }
}

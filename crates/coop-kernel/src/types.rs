//! Core kernel types
//!
//! Identifiers, the process state model, and the plain-data snapshots the
//! kernel hands to front ends.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Process identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state (five-state model)
///
/// ```text
/// NEW ──▶ READY ◀──▶ RUNNING ──▶ TERMINATED
///           ▲           │
///           └─ WAITING ◀┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessState {
    /// Being created; never observable outside `spawn`
    New,
    /// Eligible to run, sitting in the ready queue
    Ready,
    /// Currently executing its step (or the last one to run)
    Running,
    /// Blocked on a wake condition, parked in the wait set
    Waiting,
    /// Finished or killed; absorbing
    Terminated,
}

impl ProcessState {
    /// Upper-case state name, as shown by `ps`.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Terminated => "TERMINATED",
        }
    }

    /// Whether the model allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, next),
            (New, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Waiting)
                | (Waiting, Ready)
                | (Running, Terminated)
        )
    }

    /// TERMINATED has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        *self == ProcessState::Terminated
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the process table snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Process ID
    pub pid: ProcessId,
    /// Debug label
    pub name: String,
    /// Lifecycle state at snapshot time
    pub state: ProcessState,
    /// Completed step invocations
    pub cpu_time: u64,
}

/// Kernel-wide counters
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelMetrics {
    /// Dispatch calls so far
    pub clock: u64,
    /// Live processes (table entries plus the on-CPU process)
    pub process_count: usize,
    /// Processes in the ready queue
    pub ready_count: usize,
    /// Processes in the wait set
    pub waiting_count: usize,
    /// Dispatches that found nothing to run
    pub idle_ticks: u64,
    /// Dispatches that picked a different process than the previous one
    pub context_switches: u64,
    /// Processes spawned since boot
    pub spawned: u64,
    /// Processes that left the table (exit, crash or kill)
    pub terminated: u64,
    /// Processes terminated because their step returned a fault
    pub crashed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(ProcessState::New.name(), "NEW");
        assert_eq!(ProcessState::Waiting.to_string(), "WAITING");
        assert_eq!(ProcessState::Terminated.to_string(), "TERMINATED");
    }

    #[test]
    fn test_legal_transitions() {
        use ProcessState::*;
        assert!(New.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Running));
        assert!(Running.can_transition_to(Ready));
        assert!(Running.can_transition_to(Waiting));
        assert!(Waiting.can_transition_to(Ready));
        assert!(Running.can_transition_to(Terminated));

        assert!(!New.can_transition_to(Running));
        assert!(!Ready.can_transition_to(Waiting));
        assert!(!Waiting.can_transition_to(Running));
    }

    #[test]
    fn test_terminated_is_absorbing() {
        use ProcessState::*;
        for next in [New, Ready, Running, Waiting, Terminated] {
            assert!(!Terminated.can_transition_to(next));
        }
        assert!(Terminated.is_terminal());
        assert!(!Waiting.is_terminal());
    }

    #[test]
    fn test_process_info_serializes() {
        let info = ProcessInfo {
            pid: ProcessId(3),
            name: "counter".to_string(),
            state: ProcessState::Ready,
            cpu_time: 2,
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: ProcessInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}

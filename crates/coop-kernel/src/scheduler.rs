//! Ready queue and wait set
//!
//! Both hold pids; the process table owns the PCBs. Membership is
//! structural: a pid appears at most once in either collection.

use std::collections::{BTreeSet, VecDeque};

use crate::process::Pcb;
use crate::types::{ProcessId, ProcessState};

/// FIFO admission queue of READY processes.
///
/// No priority, no aging: insertion order is dispatch order.
#[derive(Clone, Debug, Default)]
pub struct ReadyQueue {
    queue: VecDeque<ProcessId>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue `pcb` at the tail.
    ///
    /// Only READY processes are accepted; anything else, or a pid already
    /// queued, is a no-op. Returns whether the pid was enqueued.
    pub fn add(&mut self, pcb: &Pcb) -> bool {
        if pcb.state != ProcessState::Ready || self.contains(pcb.pid()) {
            return false;
        }
        self.queue.push_back(pcb.pid());
        true
    }

    /// Pop the head, or `None` when nothing is ready.
    pub fn next(&mut self) -> Option<ProcessId> {
        self.queue.pop_front()
    }

    /// Drop `pid` from the queue wherever it sits.
    pub fn remove(&mut self, pid: ProcessId) -> bool {
        match self.queue.iter().position(|&p| p == pid) {
            Some(index) => {
                self.queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.queue.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued pids, head first.
    pub fn iter(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.queue.iter().copied()
    }
}

/// Processes parked in WAITING, polled by the dispatcher every tick.
#[derive(Clone, Debug, Default)]
pub struct WaitSet {
    waiting: BTreeSet<ProcessId>,
}

impl WaitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: ProcessId) -> bool {
        self.waiting.insert(pid)
    }

    pub fn remove(&mut self, pid: ProcessId) -> bool {
        self.waiting.remove(&pid)
    }

    pub fn contains(&self, pid: ProcessId) -> bool {
        self.waiting.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Waiting pids, ascending.
    pub fn iter(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.waiting.iter().copied()
    }
}

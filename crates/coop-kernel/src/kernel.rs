//! The kernel: process table, scheduling, run loop
//!
//! All kernel state lives in one `Kernel` value. Step functions receive
//! `&mut Kernel` for the duration of their invocation; there are no
//! globals and no locking, since exactly one step runs at a time.
//!
//! While a step runs its PCB is checked out of the process table and
//! tracked as the on-CPU process. It still shows up in `list_processes`
//! and can still be killed (including by itself).

use std::collections::BTreeMap;
use std::env;
use std::mem;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use crate::config::KernelConfig;
use crate::process::{Args, Pcb, StepFn, WakeCondition};
use crate::scheduler::{ReadyQueue, WaitSet};
use crate::types::{KernelMetrics, ProcessId, ProcessInfo, ProcessState};

/// Process whose step is executing right now
#[derive(Clone, Debug)]
pub(crate) struct OnCpu {
    pub(crate) pid: ProcessId,
    name: String,
    cpu_time: u64,
}

/// Summary of one `run_loop` call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Dispatch calls made
    pub cycles: u64,
    /// Kernel clock when the loop stopped
    pub clock: u64,
    /// Switches to a different process during the loop
    pub context_switches: u64,
    /// Whether the loop stopped because its work ran out (for `run_loop`,
    /// the process table emptied) rather than the cycle budget
    pub completed: bool,
    /// Live processes left
    pub remaining: usize,
}

/// Cooperative single-threaded kernel
pub struct Kernel {
    /// Process table (the on-CPU process is checked out while it runs)
    pub(crate) processes: BTreeMap<ProcessId, Pcb>,
    pub(crate) ready: ReadyQueue,
    pub(crate) waiting: WaitSet,
    /// Last process dispatched, if it neither waited nor terminated
    pub(crate) running: Option<ProcessId>,
    pub(crate) on_cpu: Option<OnCpu>,
    /// Set for the whole of a step invocation, even after a self-kill
    in_step: bool,
    pub(crate) next_pid: u64,
    clock: u64,
    /// Working directory shared by every process
    pub(crate) cwd: PathBuf,
    config: KernelConfig,
    idle_ticks: u64,
    context_switches: u64,
    spawned: u64,
    terminated: u64,
    crashed: u64,
}

impl Kernel {
    /// Create a kernel with the default configuration.
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default())
    }

    /// Create a kernel from `config`.
    pub fn with_config(config: KernelConfig) -> Self {
        let cwd = config
            .initial_cwd
            .clone()
            .unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        Self {
            processes: BTreeMap::new(),
            ready: ReadyQueue::new(),
            waiting: WaitSet::new(),
            running: None,
            on_cpu: None,
            in_step: false,
            next_pid: config.first_pid,
            clock: 0,
            cwd,
            config,
            idle_ticks: 0,
            context_switches: 0,
            spawned: 0,
            terminated: 0,
            crashed: 0,
        }
    }

    // ========================================================================
    // Process lifecycle
    // ========================================================================

    /// Create a process running `step` with `args` bound to it.
    ///
    /// The PCB is admitted (NEW -> READY) and enqueued before the pid is
    /// returned. An empty `name` becomes `proc<pid>`.
    pub fn spawn(&mut self, step: StepFn, args: impl Into<Args>, name: &str) -> ProcessId {
        let pid = ProcessId(self.next_pid);
        self.next_pid += 1;

        let name = if name.is_empty() {
            format!("proc{}", pid)
        } else {
            name.to_string()
        };

        let mut pcb = Pcb::new(pid, name, step, args.into());
        pcb.state = ProcessState::Ready;
        self.ready.add(&pcb);
        debug!("[{}] spawned {}", self.clock, pcb);

        self.processes.insert(pid, pcb);
        self.spawned += 1;
        pid
    }

    /// Run one scheduling quantum.
    ///
    /// 1. Advance the clock.
    /// 2. Requeue the previous process if it is still RUNNING.
    /// 3. Wake WAITING processes whose condition holds.
    /// 4. Pop the next READY process (or idle) and invoke its step once.
    /// 5. Settle the process according to the state it left.
    ///
    /// Calls made from inside a step are ignored.
    pub fn dispatch(&mut self) {
        if self.in_step {
            warn!("[{}] dispatch from inside a step ignored", self.clock);
            return;
        }

        self.clock += 1;

        let previous = self.running.take();
        if let Some(pid) = previous {
            self.requeue(pid);
        }

        self.poll_waiting();

        let Some(mut pcb) = self.pick_next() else {
            self.idle_ticks += 1;
            return;
        };
        let pid = pcb.pid();
        if previous != Some(pid) {
            self.context_switches += 1;
        }

        pcb.state = ProcessState::Running;
        self.running = Some(pid);
        self.on_cpu = Some(OnCpu {
            pid,
            name: pcb.name().to_string(),
            cpu_time: pcb.cpu_time(),
        });

        let step = pcb.program.step;
        let args = mem::take(&mut pcb.program.args);
        self.in_step = true;
        let outcome = step(self, &mut pcb, &args);
        self.in_step = false;
        pcb.program.args = args;

        if self.on_cpu.take().is_none() {
            // Killed during its own step; `kill` already did the bookkeeping.
            pcb.state = ProcessState::Terminated;
            debug!("[{}] process {} discarded after self-kill", self.clock, pid);
            return;
        }

        match outcome {
            Ok(()) => pcb.charge_step(),
            Err(fault) => {
                error!("[{}] process {} crashed: {}", self.clock, pid, fault);
                pcb.state = ProcessState::Terminated;
                self.crashed += 1;
            }
        }

        self.settle(pcb);
    }

    /// Forcibly terminate `pid` regardless of its state.
    ///
    /// Returns whether the pid was live. Killing the running process clears
    /// the running reference.
    pub fn kill(&mut self, pid: ProcessId) -> bool {
        if self.on_cpu.as_ref().is_some_and(|cpu| cpu.pid == pid) {
            self.on_cpu = None;
            self.running = None;
            self.terminated += 1;
            debug!("[{}] process {} killed during its step", self.clock, pid);
            return true;
        }

        let Some(mut pcb) = self.processes.remove(&pid) else {
            return false;
        };
        let was = pcb.state;
        pcb.state = ProcessState::Terminated;
        self.ready.remove(pid);
        self.waiting.remove(pid);
        if self.running == Some(pid) {
            self.running = None;
        }
        self.terminated += 1;
        debug!("[{}] process {} killed while {}", self.clock, pcb, was);
        true
    }

    /// Re-admit a WAITING process (WAITING -> READY).
    ///
    /// Returns false if `pid` is not live or not waiting.
    pub fn wake(&mut self, pid: ProcessId) -> bool {
        let Some(pcb) = self.processes.get_mut(&pid) else {
            return false;
        };
        if pcb.state != ProcessState::Waiting {
            return false;
        }
        pcb.state = ProcessState::Ready;
        pcb.wake = None;
        self.waiting.remove(pid);
        self.ready.add(pcb);
        debug!("[{}] process {} woke", self.clock, pid);
        true
    }

    /// Dispatch up to `max_cycles` times, stopping once no process is left.
    pub fn run_loop(&mut self, max_cycles: u64) -> RunReport {
        self.run_while(max_cycles, |kernel| kernel.process_count() > 0)
    }

    /// Dispatch up to `max_cycles` times while `keep_going` holds.
    ///
    /// The predicate is checked before every dispatch. The report counts
    /// as completed when the predicate, not the budget, ended the loop.
    pub fn run_while<F>(&mut self, max_cycles: u64, mut keep_going: F) -> RunReport
    where
        F: FnMut(&Kernel) -> bool,
    {
        let trace = self.config.trace_context_switches;
        let switches_before = self.context_switches;

        if trace {
            info!("kernel starting (max {} cycles)", max_cycles);
        }

        let mut cycles = 0;
        let mut completed = false;
        while cycles < max_cycles {
            if !keep_going(self) {
                completed = true;
                break;
            }
            let previous = self.running;
            let previous_label = trace.then(|| self.label(previous));

            self.dispatch();
            cycles += 1;

            if let Some(from) = previous_label {
                if previous != self.running {
                    info!(
                        "[{:3}] {:15} -> {:15}",
                        self.clock,
                        from,
                        self.label(self.running)
                    );
                }
            }
        }

        let completed = completed || !keep_going(self);
        let remaining = self.process_count();
        let report = RunReport {
            cycles,
            clock: self.clock,
            context_switches: self.context_switches - switches_before,
            completed,
            remaining,
        };

        if trace {
            if report.completed {
                info!("processes completed at cycle {}", self.clock);
            } else {
                info!(
                    "kernel stopped at cycle {}, active processes: {}",
                    self.clock, remaining
                );
            }
        }
        report
    }

    /// `run_loop` with the configured default budget.
    pub fn run(&mut self) -> RunReport {
        self.run_loop(self.config.default_cycles)
    }

    // ========================================================================
    // Read-only accessors
    // ========================================================================

    /// Process table snapshot, sorted by pid.
    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        let mut rows: Vec<ProcessInfo> = self
            .processes
            .values()
            .map(|pcb| ProcessInfo {
                pid: pcb.pid(),
                name: pcb.name().to_string(),
                state: pcb.state,
                cpu_time: pcb.cpu_time(),
            })
            .collect();

        if let Some(cpu) = &self.on_cpu {
            rows.push(ProcessInfo {
                pid: cpu.pid,
                name: cpu.name.clone(),
                state: ProcessState::Running,
                cpu_time: cpu.cpu_time,
            });
            rows.sort_by_key(|row| row.pid);
        }
        rows
    }

    /// PCB of a live process. `None` for the process whose step is executing.
    pub fn process(&self, pid: ProcessId) -> Option<&Pcb> {
        self.processes.get(&pid)
    }

    pub fn process_mut(&mut self, pid: ProcessId) -> Option<&mut Pcb> {
        self.processes.get_mut(&pid)
    }

    /// Whether `pid` is live (including the on-CPU process).
    pub fn contains(&self, pid: ProcessId) -> bool {
        self.processes.contains_key(&pid) || self.on_cpu.as_ref().is_some_and(|c| c.pid == pid)
    }

    /// Live process count (including the on-CPU process).
    pub fn process_count(&self) -> usize {
        self.processes.len() + usize::from(self.on_cpu.is_some())
    }

    /// Dispatch calls so far.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn running(&self) -> Option<ProcessId> {
        self.running
    }

    /// Pid the next `spawn` will return.
    pub fn next_pid(&self) -> ProcessId {
        ProcessId(self.next_pid)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn wait_set(&self) -> &WaitSet {
        &self.waiting
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn page_size(&self) -> u64 {
        self.config.page_size
    }

    pub fn metrics(&self) -> KernelMetrics {
        KernelMetrics {
            clock: self.clock,
            process_count: self.process_count(),
            ready_count: self.ready.len(),
            waiting_count: self.waiting.len(),
            idle_ticks: self.idle_ticks,
            context_switches: self.context_switches,
            spawned: self.spawned,
            terminated: self.terminated,
            crashed: self.crashed,
        }
    }

    // ========================================================================
    // Dispatch helpers
    // ========================================================================

    /// Demote a still-RUNNING process to READY and put it back in the queue.
    fn requeue(&mut self, pid: ProcessId) {
        if let Some(pcb) = self.processes.get_mut(&pid) {
            if pcb.state == ProcessState::Running {
                pcb.state = ProcessState::Ready;
            }
            self.ready.add(pcb);
        }
    }

    /// Wake every waiting process whose deadline has passed, in pid order.
    fn poll_waiting(&mut self) {
        let clock = self.clock;
        let due: Vec<ProcessId> = self
            .waiting
            .iter()
            .filter(|pid| {
                matches!(
                    self.processes.get(pid).and_then(|pcb| pcb.wake),
                    Some(WakeCondition::AtTick(tick)) if tick <= clock
                )
            })
            .collect();

        for pid in due {
            self.wake(pid);
        }
    }

    /// Check the next READY process out of the table.
    fn pick_next(&mut self) -> Option<Pcb> {
        while let Some(pid) = self.ready.next() {
            match self.processes.remove(&pid) {
                Some(pcb) if pcb.state == ProcessState::Ready => return Some(pcb),
                Some(pcb) => {
                    warn!("process {} queued while {}; skipped", pid, pcb.state);
                    self.processes.insert(pid, pcb);
                }
                None => {}
            }
        }
        None
    }

    /// Put a PCB back after its step according to the state it left.
    fn settle(&mut self, mut pcb: Pcb) {
        let pid = pcb.pid();
        match pcb.state {
            ProcessState::Terminated => {
                self.running = None;
                self.terminated += 1;
                debug!(
                    "[{}] process {} ({}) terminated after {} steps",
                    self.clock,
                    pid,
                    pcb.name(),
                    pcb.cpu_time()
                );
            }
            ProcessState::Waiting => {
                self.running = None;
                if pcb.wake.is_none() {
                    pcb.wake = Some(WakeCondition::Signal);
                }
                self.waiting.insert(pid);
                self.processes.insert(pid, pcb);
            }
            ProcessState::Ready | ProcessState::New => {
                // Stays the last-run reference; the next dispatch requeues it.
                pcb.state = ProcessState::Ready;
                self.processes.insert(pid, pcb);
            }
            ProcessState::Running => {
                self.processes.insert(pid, pcb);
            }
        }
    }

    fn label(&self, pid: Option<ProcessId>) -> String {
        match pid.and_then(|p| self.processes.get(&p)) {
            Some(pcb) => format!("P{}({})", pcb.pid(), pcb.name()),
            None => "IDLE".to_string(),
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

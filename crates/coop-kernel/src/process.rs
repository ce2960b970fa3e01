//! Process control block and the step function contract
//!
//! A process is a `Pcb` plus a `StepFn`. Each dispatch invokes the step
//! function exactly once; the function signals its fate by leaving
//! `pcb.state` as RUNNING/READY (run again), WAITING (park until woken)
//! or TERMINATED (destroyed after this dispatch), or by returning a
//! `StepFault` (treated as a crash).

use core::any::{type_name, Any};
use core::fmt;

use crate::error::StepFault;
use crate::kernel::Kernel;
use crate::memory::AddressSpace;
use crate::types::{ProcessId, ProcessState};

/// Outcome of one step invocation
pub type StepResult = Result<(), StepFault>;

/// A process program: invoked once per dispatch with the kernel, the
/// process's own PCB and its bound arguments.
pub type StepFn = fn(&mut Kernel, &mut Pcb, &Args) -> StepResult;

// ============================================================================
// Bound arguments
// ============================================================================

/// A single bound argument
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Text(String),
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Arg::Int(i64::from(v))
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

/// Arguments bound at spawn time and passed to every step invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Args(Vec<Arg>);

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    /// Integer argument at `index`.
    pub fn int(&self, index: usize) -> Result<i64, StepFault> {
        match self.0.get(index) {
            Some(Arg::Int(v)) => Ok(*v),
            Some(_) => Err(StepFault::BadArgument {
                index,
                expected: "integer",
            }),
            None => Err(StepFault::MissingArgument { index }),
        }
    }

    /// Integer argument at `index`, or `default` when not supplied.
    pub fn int_or(&self, index: usize, default: i64) -> Result<i64, StepFault> {
        match self.0.get(index) {
            None => Ok(default),
            Some(_) => self.int(index),
        }
    }

    /// Text argument at `index`.
    pub fn text(&self, index: usize) -> Result<&str, StepFault> {
        match self.0.get(index) {
            Some(Arg::Text(v)) => Ok(v),
            Some(_) => Err(StepFault::BadArgument {
                index,
                expected: "text",
            }),
            None => Err(StepFault::MissingArgument { index }),
        }
    }
}

impl From<Vec<Arg>> for Args {
    fn from(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

impl<T: Into<Arg>, const N: usize> From<[T; N]> for Args {
    fn from(args: [T; N]) -> Self {
        Self(args.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Scratch slot
// ============================================================================

/// Opaque per-process state owned by the program.
///
/// The kernel never looks inside. A program typically keeps one struct
/// here and reaches it with `get_or_default`.
#[derive(Default)]
pub struct Scratch(Option<Box<dyn Any>>);

impl Scratch {
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|b| b.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.0.as_mut().and_then(|b| b.downcast_mut::<T>())
    }

    pub fn set<T: 'static>(&mut self, value: T) {
        self.0 = Some(Box::new(value));
    }

    /// Typed access, initializing with `T::default()` on first use.
    /// A value of a different type is replaced.
    pub fn get_or_default<T: Default + 'static>(&mut self) -> &mut T {
        let slot = self.0.get_or_insert_with(|| Box::new(T::default()));
        if !slot.is::<T>() {
            *slot = Box::new(T::default());
        }
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("scratch slot holds {}", type_name::<T>()),
        }
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

impl fmt::Debug for Scratch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_some() {
            f.write_str("Scratch(..)")
        } else {
            f.write_str("Scratch(empty)")
        }
    }
}

// ============================================================================
// PCB
// ============================================================================

/// Condition that moves a WAITING process back to READY
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeCondition {
    /// Wake once the kernel clock reaches this tick
    AtTick(u64),
    /// Wake only via `Kernel::wake`
    Signal,
}

/// Program bound to a PCB
#[derive(Clone)]
pub(crate) struct Program {
    pub(crate) step: StepFn,
    pub(crate) args: Args,
}

/// Process Control Block
pub struct Pcb {
    pid: ProcessId,
    name: String,
    /// Current lifecycle state; the step function drives it
    pub state: ProcessState,
    /// Reserved; the FIFO policy ignores it
    pub priority: i32,
    cpu_time: u64,
    /// Private memory, destroyed with the PCB
    pub memory: AddressSpace,
    /// Program-owned scratch state
    pub scratch: Scratch,
    pub(crate) wake: Option<WakeCondition>,
    pub(crate) program: Program,
}

impl Pcb {
    pub(crate) fn new(pid: ProcessId, name: String, step: StepFn, args: Args) -> Self {
        Self {
            pid,
            name,
            state: ProcessState::New,
            priority: 0,
            cpu_time: 0,
            memory: AddressSpace::new(),
            scratch: Scratch::default(),
            wake: None,
            program: Program { step, args },
        }
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Completed step invocations
    pub fn cpu_time(&self) -> u64 {
        self.cpu_time
    }

    pub(crate) fn charge_step(&mut self) {
        self.cpu_time += 1;
    }

    /// Pending wake condition while WAITING.
    pub fn wake_condition(&self) -> Option<WakeCondition> {
        self.wake
    }

    /// Block until the kernel clock reaches `tick`.
    pub fn block_until(&mut self, tick: u64) {
        self.state = ProcessState::Waiting;
        self.wake = Some(WakeCondition::AtTick(tick));
    }

    /// Block until another party calls `Kernel::wake`.
    pub fn block(&mut self) {
        self.state = ProcessState::Waiting;
        self.wake = Some(WakeCondition::Signal);
    }

    /// Give up the CPU; the next dispatch requeues it at the tail.
    pub fn yield_now(&mut self) {
        self.state = ProcessState::Ready;
    }

    /// Signal completion.
    pub fn exit(&mut self) {
        self.state = ProcessState::Terminated;
    }
}

impl fmt::Debug for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pcb")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("cpu_time", &self.cpu_time)
            .field("wake", &self.wake)
            .field("args", &self.program.args)
            .field("scratch", &self.scratch)
            .finish()
    }
}

impl fmt::Display for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PCB(pid={} ({}), state={})", self.pid, self.name, self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Kernel, _: &mut Pcb, _: &Args) -> StepResult {
        Ok(())
    }

    #[test]
    fn test_small_ints_widen_to_int_args() {
        assert_eq!(Arg::from(i32::MIN), Arg::Int(-2_147_483_648));
        assert_eq!(Arg::from(7), Arg::Int(7));
    }

    #[derive(Default)]
    struct Counter {
        count: u32,
    }

    #[test]
    fn test_new_pcb_starts_new() {
        let pcb = Pcb::new(ProcessId(4), "p".into(), noop, Args::new());
        assert_eq!(pcb.state, ProcessState::New);
        assert_eq!(pcb.cpu_time(), 0);
        assert!(pcb.memory.is_empty());
        assert!(pcb.scratch.is_empty());
        assert_eq!(pcb.to_string(), "PCB(pid=4 (p), state=NEW)");
    }

    #[test]
    fn test_block_until_sets_waiting() {
        let mut pcb = Pcb::new(ProcessId(0), "io".into(), noop, Args::new());
        pcb.block_until(12);
        assert_eq!(pcb.state, ProcessState::Waiting);
        assert_eq!(pcb.wake_condition(), Some(WakeCondition::AtTick(12)));

        pcb.block();
        assert_eq!(pcb.wake_condition(), Some(WakeCondition::Signal));
    }

    #[test]
    fn test_args_accessors() {
        let args = Args::from([Arg::Int(5), Arg::from("x")]);
        assert_eq!(args.len(), 2);
        assert_eq!(args.int(0).unwrap(), 5);
        assert_eq!(args.text(1).unwrap(), "x");
        assert!(matches!(
            args.int(1),
            Err(StepFault::BadArgument { index: 1, .. })
        ));
        assert!(matches!(
            args.text(2),
            Err(StepFault::MissingArgument { index: 2 })
        ));
        assert_eq!(args.int_or(2, 10).unwrap(), 10);
        assert_eq!(Args::from([3, 4]).int(1).unwrap(), 4);
    }

    #[test]
    fn test_scratch_get_or_default() {
        let mut scratch = Scratch::default();
        scratch.get_or_default::<Counter>().count += 1;
        scratch.get_or_default::<Counter>().count += 1;
        assert_eq!(scratch.get::<Counter>().map(|c| c.count), Some(2));
        assert!(scratch.get::<u64>().is_none());
    }

    #[test]
    fn test_scratch_type_change_resets() {
        let mut scratch = Scratch::default();
        scratch.set(41u64);
        assert_eq!(*scratch.get_or_default::<u64>(), 41);
        scratch.get_or_default::<Counter>().count = 3;
        assert!(scratch.get::<u64>().is_none());
        scratch.clear();
        assert!(scratch.is_empty());
    }
}

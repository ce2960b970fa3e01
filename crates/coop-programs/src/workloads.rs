//! Demo workloads

use coop_kernel::{Args, Kernel, Pcb, StepResult};
use log::info;

/// Ticks a simulated I/O operation takes
pub const IO_LATENCY: u64 = 5;

/// Steps of computation before `io_simulation` starts its I/O
pub const IO_COMPUTE_STEPS: u32 = 3;

/// Total steps `io_simulation` runs
pub const IO_TOTAL_STEPS: u32 = 8;

/// Iterations `cpu_burst` runs
pub const CPU_BURST_ITERATIONS: u32 = 20;

#[derive(Debug, Default)]
struct Tally {
    count: i64,
}

/// Runs for `args[0]` cycles, then exits.
pub fn idle(_: &mut Kernel, pcb: &mut Pcb, args: &Args) -> StepResult {
    let cycles = args.int(0)?;
    let tally = pcb.scratch.get_or_default::<Tally>();
    tally.count += 1;

    if tally.count >= cycles {
        info!("[P{}] idle process completed {} cycles", pcb.pid(), cycles);
        pcb.exit();
    }
    Ok(())
}

/// Counts to `args[0]` (default 10), then exits.
pub fn counter(_: &mut Kernel, pcb: &mut Pcb, args: &Args) -> StepResult {
    let target = args.int_or(0, 10)?;
    let tally = pcb.scratch.get_or_default::<Tally>();
    tally.count += 1;

    if tally.count >= target {
        info!("[P{}] counter reached {}", pcb.pid(), target);
        pcb.exit();
    }
    Ok(())
}

/// Touches one new page per step, writing the page index at the page's
/// first byte. Exits after `args[0]` pages.
pub fn memory_touch(kernel: &mut Kernel, pcb: &mut Pcb, args: &Args) -> StepResult {
    let pages = args.int(0)?;
    let page_size = kernel.page_size();
    let touched = {
        let tally = pcb.scratch.get_or_default::<Tally>();
        let page = tally.count;
        tally.count += 1;
        page
    };

    pcb.memory.write(touched as u64 * page_size, touched as u8);

    if touched + 1 >= pages {
        info!("[P{}] touched {} pages", pcb.pid(), pages);
        pcb.exit();
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Burst {
    sum: u64,
    iterations: u32,
}

/// Sums 0..100 each step; exits after `CPU_BURST_ITERATIONS` steps.
pub fn cpu_burst(_: &mut Kernel, pcb: &mut Pcb, _: &Args) -> StepResult {
    let burst = pcb.scratch.get_or_default::<Burst>();
    burst.sum += (0..100u64).sum::<u64>();
    burst.iterations += 1;

    if burst.iterations >= CPU_BURST_ITERATIONS {
        let sum = burst.sum;
        info!("[P{}] CPU burst completed, sum={}", pcb.pid(), sum);
        pcb.exit();
    }
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum IoPhase {
    #[default]
    Compute,
    Waiting,
    Done,
}

#[derive(Debug, Default)]
struct IoJob {
    phase: IoPhase,
    steps: u32,
}

/// Computes for a few steps, blocks for `IO_LATENCY` ticks, then finishes
/// at step `IO_TOTAL_STEPS`.
pub fn io_simulation(kernel: &mut Kernel, pcb: &mut Pcb, _: &Args) -> StepResult {
    let pid = pcb.pid();
    let job = pcb.scratch.get_or_default::<IoJob>();
    job.steps += 1;

    match job.phase {
        IoPhase::Compute => {
            if job.steps >= IO_COMPUTE_STEPS {
                job.phase = IoPhase::Waiting;
                info!("[P{}] starting I/O operation", pid);
                pcb.block_until(kernel.clock() + IO_LATENCY);
            }
        }
        IoPhase::Waiting => {
            // First step after the kernel woke us
            job.phase = IoPhase::Done;
            info!("[P{}] I/O operation completed", pid);
        }
        IoPhase::Done => {
            if job.steps >= IO_TOTAL_STEPS {
                info!("[P{}] process completed", pid);
                pcb.exit();
            }
        }
    }
    Ok(())
}

//! Mixed-workload scenarios over the demo programs

use coop_kernel::{check_all_invariants, Kernel, KernelConfig, ProcessState};
use coop_programs::{spawn_program, PROGRAMS};

fn quiet_kernel() -> Kernel {
    Kernel::with_config(KernelConfig {
        trace_context_switches: false,
        ..KernelConfig::default()
    })
}

#[test]
fn test_every_program_runs_to_completion() {
    for spec in PROGRAMS {
        let mut kernel = quiet_kernel();
        spawn_program(&mut kernel, spec.name, Some(4), spec.name).unwrap();

        let report = kernel.run_loop(200);
        assert!(report.completed, "{} did not finish", spec.name);
        assert_eq!(kernel.metrics().crashed, 0, "{} crashed", spec.name);
    }
}

#[test]
fn test_mixed_workload_keeps_invariants() {
    let mut kernel = quiet_kernel();
    let io = spawn_program(&mut kernel, "io", None, "io").unwrap();
    spawn_program(&mut kernel, "counter", Some(6), "counter").unwrap();
    spawn_program(&mut kernel, "memtest", Some(5), "memtest").unwrap();
    spawn_program(&mut kernel, "cpuburst", None, "burst").unwrap();

    let mut saw_io_waiting = false;
    for _ in 0..200 {
        if kernel.process_count() == 0 {
            break;
        }
        kernel.dispatch();
        let violations = check_all_invariants(&kernel);
        assert!(violations.is_empty(), "{:?}", violations);
        if kernel.process(io).is_some_and(|pcb| pcb.state == ProcessState::Waiting) {
            saw_io_waiting = true;
        }
    }

    assert!(saw_io_waiting);
    assert_eq!(kernel.process_count(), 0);
    assert_eq!(kernel.metrics().terminated, 4);
}

#[test]
fn test_memtest_pages_visible_until_exit() {
    let mut kernel = quiet_kernel();
    let pid = spawn_program(&mut kernel, "memtest", Some(10), "memtest").unwrap();

    for _ in 0..9 {
        kernel.dispatch();
    }
    let pcb = kernel.process(pid).unwrap();
    let pages = pcb.memory.touched_pages(kernel.page_size());
    assert_eq!(pages, (0..9).collect::<Vec<u64>>());
    assert_eq!(pcb.memory.read(8 * 4096), 8);
}

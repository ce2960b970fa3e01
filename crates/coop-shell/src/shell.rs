//! Shell sessions
//!
//! A session is itself a kernel process: it has a pid, shows up in `ps`
//! and can be killed like any other process. Its step only yields, so it
//! takes its turn in the round robin whenever `run` drives the kernel.
//!
//! ```text
//!   stdin ──▶ Shell::run ──▶ Command::parse ──▶ cmd_* ──▶ Kernel
//!                 │
//!                 └── sessions: [outer pid, nested pid, ...]
//! ```
//!
//! `shell` pushes a nested session; `exit` (or killing the current
//! session's own pid) pops back to the parent. The loop ends when no
//! session is left or input runs out.

use std::io::{self, BufRead, Write};

use coop_kernel::{Args, Kernel, Pcb, ProcessId, StepResult};
use coop_programs::{spawn_program, PROGRAMS};
use log::{debug, warn};

use crate::command::{Command, ParseError};

/// Process name used for shell sessions
pub const SESSION_NAME: &str = "shell";

/// Step function of a shell session process
fn session_step(_: &mut Kernel, pcb: &mut Pcb, _: &Args) -> StepResult {
    pcb.yield_now();
    Ok(())
}

/// Interactive shell bound to one kernel
pub struct Shell<'k, R, W> {
    kernel: &'k mut Kernel,
    input: R,
    output: W,
    /// Session pids, innermost last
    sessions: Vec<ProcessId>,
}

impl<'k, R: BufRead, W: Write> Shell<'k, R, W> {
    pub fn new(kernel: &'k mut Kernel, input: R, output: W) -> Self {
        Self {
            kernel,
            input,
            output,
            sessions: Vec::new(),
        }
    }

    /// Pid of the innermost live session.
    pub fn current(&self) -> Option<ProcessId> {
        self.sessions.last().copied()
    }

    /// Session pids, outermost first.
    pub fn sessions(&self) -> &[ProcessId] {
        &self.sessions
    }

    /// Read and execute commands until every session has exited.
    pub fn run(&mut self) -> io::Result<()> {
        self.enter_session()?;

        loop {
            self.drop_dead_sessions();
            let Some(pid) = self.current() else {
                break;
            };

            let cwd = self.kernel.cwd();
            let dir = match cwd.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => cwd.display().to_string(),
            };
            write!(self.output, "coop[{}]:{}> ", pid, dir)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                self.leave_all();
                break;
            }
            self.execute(&line)?;
        }
        Ok(())
    }

    /// Execute one command line.
    pub fn execute(&mut self, line: &str) -> io::Result<()> {
        match Command::parse(line) {
            Ok(cmd) => self.run_command(cmd),
            Err(ParseError::MissingArgument { command, argument }) => {
                writeln!(self.output, "Error: {} requires {}", command, argument)
            }
            Err(ParseError::InvalidArgument { argument, reason }) => {
                writeln!(self.output, "Error: {} {}", argument, reason)
            }
        }
    }

    fn run_command(&mut self, cmd: Command) -> io::Result<()> {
        match cmd {
            Command::Help => self.cmd_help(),
            Command::Ps => self.cmd_ps(),
            Command::Kill { pid } => self.cmd_kill(ProcessId(pid)),
            Command::Ls => self.cmd_ls(),
            Command::Cd { path } => self.cmd_cd(&path),
            Command::Touch { file } => self.cmd_touch(&file),
            Command::Cat { file } => self.cmd_cat(&file),
            Command::Pwd => writeln!(self.output, "{}", self.kernel.cwd().display()),
            Command::Shell => self.enter_session(),
            Command::Exit => self.cmd_exit(),
            Command::Spawn { program, arg } => self.cmd_spawn(&program, arg, &program),
            Command::Test1 => self.cmd_spawn("idle", Some(5), "idle_test"),
            Command::Test2 => self.cmd_spawn("memtest", Some(10), "memtest"),
            Command::Run { cycles } => self.cmd_run(cycles),
            Command::Stats => self.cmd_stats(),
            Command::Mem { pid } => self.cmd_mem(ProcessId(pid)),
            Command::Unknown { cmd } if cmd.is_empty() => Ok(()),
            Command::Unknown { cmd } => {
                writeln!(self.output, "Unknown command: {}", cmd)?;
                writeln!(self.output, "Type 'help' for available commands.")
            }
        }
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    fn enter_session(&mut self) -> io::Result<()> {
        let pid = self
            .kernel
            .spawn(session_step, Args::new(), SESSION_NAME);
        if let Some(parent) = self.current() {
            writeln!(self.output, "Starting nested shell {} (parent {})", pid, parent)?;
        }
        debug!("shell session {} started", pid);
        self.sessions.push(pid);
        Ok(())
    }

    fn cmd_exit(&mut self) -> io::Result<()> {
        if let Some(pid) = self.sessions.pop() {
            self.kernel.kill(pid);
            debug!("shell session {} exited", pid);
        }
        self.drop_dead_sessions();
        if let Some(parent) = self.current() {
            writeln!(self.output, "Returning to shell {}", parent)?;
        }
        Ok(())
    }

    /// Forget sessions killed from a nested shell.
    fn drop_dead_sessions(&mut self) {
        let kernel = &*self.kernel;
        self.sessions.retain(|pid| kernel.contains(*pid));
    }

    fn leave_all(&mut self) {
        while let Some(pid) = self.sessions.pop() {
            self.kernel.kill(pid);
        }
    }

    // ========================================================================
    // Processes
    // ========================================================================

    fn cmd_help(&mut self) -> io::Result<()> {
        writeln!(self.output, "=== Coop OS shell ===")?;
        writeln!(self.output)?;
        for cmd in Command::all() {
            writeln!(self.output, "  {}", cmd.usage())?;
        }
        writeln!(self.output)?;
        writeln!(self.output, "Programs:")?;
        for spec in PROGRAMS {
            writeln!(self.output, "  {:<10} {}", spec.name, spec.description)?;
        }
        Ok(())
    }

    fn cmd_ps(&mut self) -> io::Result<()> {
        writeln!(self.output, "{:<5} {:<16} {}", "PID", "NAME", "STATE")?;
        writeln!(self.output, "{:<5} {:<16} {}", "---", "----", "-----")?;
        for info in self.kernel.list_processes() {
            writeln!(
                self.output,
                "{:<5} {:<16} {}",
                info.pid.to_string(),
                info.name,
                info.state
            )?;
        }
        Ok(())
    }

    fn cmd_kill(&mut self, pid: ProcessId) -> io::Result<()> {
        if Some(pid) == self.current() {
            warn!("shell {} killed itself", pid);
            writeln!(self.output, "Warning: killing the current shell ({})", pid)?;
            return self.cmd_exit();
        }

        if self.kernel.kill(pid) {
            writeln!(self.output, "Killed process {}", pid)
        } else {
            writeln!(self.output, "No such process: {}", pid)
        }
    }

    fn cmd_spawn(&mut self, program: &str, arg: Option<i64>, name: &str) -> io::Result<()> {
        match spawn_program(self.kernel, program, arg, name) {
            Some(pid) => writeln!(self.output, "Spawned {} as PID {}", name, pid),
            None => {
                writeln!(self.output, "Unknown program: {}", program)?;
                let names: Vec<&str> = PROGRAMS.iter().map(|spec| spec.name).collect();
                writeln!(self.output, "Available: {}", names.join(", "))
            }
        }
    }

    fn cmd_run(&mut self, cycles: Option<u64>) -> io::Result<()> {
        let cycles = cycles.unwrap_or(self.kernel.config().default_cycles);
        let sessions = self.sessions.clone();

        // Shell sessions never finish on their own, so stop once only they remain.
        let report = self.kernel.run_while(cycles, |kernel| {
            let live_sessions = sessions.iter().filter(|pid| kernel.contains(**pid)).count();
            kernel.process_count() > live_sessions
        });

        writeln!(
            self.output,
            "Ran {} cycles (clock {}), {} context switches, {} processes left",
            report.cycles, report.clock, report.context_switches, report.remaining
        )
    }

    fn cmd_stats(&mut self) -> io::Result<()> {
        let m = self.kernel.metrics();
        writeln!(self.output, "clock:            {}", m.clock)?;
        writeln!(self.output, "processes:        {}", m.process_count)?;
        writeln!(self.output, "ready:            {}", m.ready_count)?;
        writeln!(self.output, "waiting:          {}", m.waiting_count)?;
        writeln!(self.output, "idle ticks:       {}", m.idle_ticks)?;
        writeln!(self.output, "context switches: {}", m.context_switches)?;
        writeln!(self.output, "spawned:          {}", m.spawned)?;
        writeln!(self.output, "terminated:       {}", m.terminated)?;
        writeln!(self.output, "crashed:          {}", m.crashed)
    }

    fn cmd_mem(&mut self, pid: ProcessId) -> io::Result<()> {
        let page_size = self.kernel.page_size();
        let Some(pcb) = self.kernel.process(pid) else {
            return writeln!(self.output, "No such process: {}", pid);
        };
        let pages = pcb.memory.touched_pages(page_size);
        writeln!(
            self.output,
            "PID {}: {} bytes written across {} pages {:?}",
            pid,
            pcb.memory.len(),
            pages.len(),
            pages
        )
    }

    // ========================================================================
    // Filesystem
    // ========================================================================

    fn cmd_ls(&mut self) -> io::Result<()> {
        let names = match self.kernel.try_list_directory() {
            Ok(names) => names,
            Err(e) => return writeln!(self.output, "ls: {}", e),
        };
        if names.is_empty() {
            return writeln!(self.output, "(empty directory)");
        }
        for name in names {
            if self.kernel.resolve(&name).is_dir() {
                writeln!(self.output, "{}/", name)?;
            } else {
                writeln!(self.output, "{}", name)?;
            }
        }
        Ok(())
    }

    fn cmd_cd(&mut self, path: &str) -> io::Result<()> {
        match self.kernel.try_change_directory(path) {
            Ok(()) => writeln!(self.output, "Changed to: {}", self.kernel.cwd().display()),
            Err(e) => writeln!(self.output, "cd: {}", e),
        }
    }

    fn cmd_touch(&mut self, file: &str) -> io::Result<()> {
        match self.kernel.try_create_or_touch_file(file) {
            Ok(()) => writeln!(self.output, "Created/updated: {}", file),
            Err(e) => writeln!(self.output, "touch: {}", e),
        }
    }

    fn cmd_cat(&mut self, file: &str) -> io::Result<()> {
        match self.kernel.try_read_file(file) {
            Ok(content) => {
                write!(self.output, "{}", content)?;
                if !content.is_empty() && !content.ends_with('\n') {
                    writeln!(self.output)?;
                }
                Ok(())
            }
            Err(e) => writeln!(self.output, "cat: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coop_kernel::{KernelConfig, ProcessState};

    fn quiet_kernel() -> Kernel {
        Kernel::with_config(KernelConfig {
            trace_context_switches: false,
            ..KernelConfig::default()
        })
    }

    fn session<'k>(kernel: &'k mut Kernel) -> Shell<'k, &'static [u8], Vec<u8>> {
        let mut shell = Shell::new(kernel, &b""[..], Vec::new());
        shell.enter_session().unwrap();
        shell
    }

    fn output(shell: &Shell<'_, &'static [u8], Vec<u8>>) -> String {
        String::from_utf8_lossy(&shell.output).into_owned()
    }

    #[test]
    fn test_session_is_a_process() {
        let mut kernel = quiet_kernel();
        let shell = session(&mut kernel);
        let pid = shell.current().unwrap();
        drop(shell);

        assert_eq!(kernel.process(pid).unwrap().name(), SESSION_NAME);
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        shell.execute("kill").unwrap();
        shell.execute("kill abc").unwrap();

        let out = output(&shell);
        assert!(out.contains("Error: kill requires pid"));
        assert!(out.contains("Error: pid must be a number"));
        drop(shell);
        assert_eq!(kernel.process_count(), 1);
    }

    #[test]
    fn test_kill_unknown_pid() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        shell.execute("kill 99").unwrap();
        assert!(output(&shell).contains("No such process: 99"));
    }

    #[test]
    fn test_kill_self_ends_session() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        let pid = shell.current().unwrap();

        shell.execute(&format!("kill {}", pid)).unwrap();
        assert!(output(&shell).contains("Warning: killing the current shell"));
        assert!(shell.current().is_none());
        drop(shell);
        assert!(!kernel.contains(pid));
    }

    #[test]
    fn test_nested_shell_returns_to_parent() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        let outer = shell.current().unwrap();

        shell.execute("shell").unwrap();
        let inner = shell.current().unwrap();
        assert_ne!(inner, outer);
        assert_eq!(shell.sessions(), &[outer, inner]);

        shell.execute("exit").unwrap();
        assert_eq!(shell.current(), Some(outer));
        assert!(output(&shell).contains(&format!("Returning to shell {}", outer)));
    }

    #[test]
    fn test_exit_skips_killed_parent() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        let outer = shell.current().unwrap();
        shell.execute("shell").unwrap();

        shell.execute(&format!("kill {}", outer)).unwrap();
        shell.execute("exit").unwrap();

        let out = output(&shell);
        assert!(out.contains(&format!("Killed process {}", outer)));
        assert!(!out.contains("Returning to shell"));
        assert!(shell.current().is_none());
        drop(shell);
        assert_eq!(kernel.process_count(), 0);
    }

    #[test]
    fn test_run_stops_when_only_sessions_remain() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        shell.execute("spawn counter 3").unwrap();
        shell.execute("run 100").unwrap();
        let out = output(&shell);
        drop(shell);

        assert!(out.contains("Spawned counter as PID 1"));
        assert!(out.contains("1 processes left"));
        assert_eq!(kernel.process_count(), 1);
        assert_eq!(
            kernel.process(ProcessId(0)).unwrap().state,
            ProcessState::Ready
        );
    }

    #[test]
    fn test_mem_reports_touched_pages() {
        let mut kernel = quiet_kernel();
        let mut shell = session(&mut kernel);
        shell.execute("spawn memtest 4").unwrap();
        shell.execute("run 4").unwrap();
        shell.execute("mem 1").unwrap();

        // Shell and memtest alternate: memtest got two steps.
        assert!(output(&shell).contains("PID 1: 2 bytes written across 2 pages [0, 1]"));
    }
}

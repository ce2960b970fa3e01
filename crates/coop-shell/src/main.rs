//! `coop` - interactive Coop OS shell
//!
//! Usage: `coop [--config <path>]`. Log verbosity follows `RUST_LOG`
//! (default `info`).

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use coop_kernel::{Kernel, KernelConfig};
use coop_shell::Shell;
use log::{error, info};

fn parse_args(args: &[String]) -> Result<Option<PathBuf>, String> {
    match args {
        [] => Ok(None),
        [flag, path] if flag == "--config" => Ok(Some(PathBuf::from(path))),
        _ => Err("usage: coop [--config <path>]".to_string()),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_args(&args) {
        Ok(None) => KernelConfig::default(),
        Ok(Some(path)) => match KernelConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("failed to load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        Err(usage) => {
            eprintln!("{}", usage);
            return ExitCode::FAILURE;
        }
    };

    let mut kernel = Kernel::with_config(config);
    println!("Coop OS - cooperative process simulator");
    println!("Type 'help' for available commands.");

    let stdin = io::stdin();
    let result = Shell::new(&mut kernel, stdin.lock(), io::stdout()).run();
    if let Err(e) = result {
        error!("shell I/O error: {}", e);
        return ExitCode::FAILURE;
    }

    let metrics = kernel.metrics();
    info!(
        "shutdown at cycle {}: {} spawned, {} terminated, {} crashed",
        metrics.clock, metrics.spawned, metrics.terminated, metrics.crashed
    );
    ExitCode::SUCCESS
}

//! Coop OS shell
//!
//! Line-oriented front end over the kernel's syscalls and the demo
//! programs. The binary (`coop`) wires it to stdin/stdout.

pub mod command;
pub mod shell;

pub use command::{Command, ParseError};
pub use shell::{Shell, SESSION_NAME};

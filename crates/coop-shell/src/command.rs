//! Shell command parsing
//!
//! Type-safe command representation for shell input.

/// Parsed shell command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Display help information
    Help,

    /// List processes
    Ps,

    /// Kill a process
    Kill { pid: u64 },

    /// List the working directory
    Ls,

    /// Change the working directory
    Cd { path: String },

    /// Create a file or bump its modification time
    Touch { file: String },

    /// Print a file
    Cat { file: String },

    /// Print the working directory
    Pwd,

    /// Start a nested shell session
    Shell,

    /// Leave the current shell session
    Exit,

    /// Spawn a demo program, optionally with an integer argument
    Spawn { program: String, arg: Option<i64> },

    /// Spawn `idle 5` named `idle_test`
    Test1,

    /// Spawn `memtest 10`
    Test2,

    /// Drive the run loop
    Run { cycles: Option<u64> },

    /// Show kernel metrics
    Stats,

    /// Show the pages a process has touched
    Mem { pid: u64 },

    /// Unrecognized command
    Unknown { cmd: String },
}

/// Error returned when parsing a command fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Command requires an argument that was not provided
    MissingArgument { command: &'static str, argument: &'static str },

    /// Argument could not be parsed as expected type
    InvalidArgument { argument: &'static str, reason: &'static str },
}

fn parse_number<T: std::str::FromStr>(
    value: &str,
    argument: &'static str,
) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidArgument {
        argument,
        reason: "must be a number",
    })
}

fn required<'a>(
    args: &[&'a str],
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ParseError> {
    args.first()
        .copied()
        .ok_or(ParseError::MissingArgument { command, argument })
}

impl Command {
    /// Parse a command line into a Command.
    ///
    /// ```
    /// use coop_shell::Command;
    ///
    /// assert_eq!(Command::parse("ps"), Ok(Command::Ps));
    /// assert_eq!(Command::parse("kill 3"), Ok(Command::Kill { pid: 3 }));
    /// ```
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (cmd, args) = match parts.split_first() {
            Some((c, a)) => (*c, a),
            None => return Ok(Command::Unknown { cmd: String::new() }),
        };

        match cmd {
            "help" | "?" => Ok(Command::Help),
            "ps" => Ok(Command::Ps),
            "ls" => Ok(Command::Ls),
            "pwd" => Ok(Command::Pwd),
            "shell" => Ok(Command::Shell),
            "exit" | "quit" => Ok(Command::Exit),
            "test1" => Ok(Command::Test1),
            "test2" => Ok(Command::Test2),
            "stats" => Ok(Command::Stats),

            "kill" => {
                let pid = parse_number(required(args, "kill", "pid")?, "pid")?;
                Ok(Command::Kill { pid })
            }

            "mem" => {
                let pid = parse_number(required(args, "mem", "pid")?, "pid")?;
                Ok(Command::Mem { pid })
            }

            "cd" => Ok(Command::Cd {
                path: required(args, "cd", "path")?.to_string(),
            }),

            "touch" => Ok(Command::Touch {
                file: required(args, "touch", "file")?.to_string(),
            }),

            "cat" => Ok(Command::Cat {
                file: required(args, "cat", "file")?.to_string(),
            }),

            "spawn" => {
                let program = required(args, "spawn", "program")?.to_string();
                let arg = args
                    .get(1)
                    .map(|value| parse_number(value, "arg"))
                    .transpose()?;
                Ok(Command::Spawn { program, arg })
            }

            "run" => {
                let cycles = args
                    .first()
                    .map(|value| parse_number(value, "cycles"))
                    .transpose()?;
                Ok(Command::Run { cycles })
            }

            _ => Ok(Command::Unknown {
                cmd: cmd.to_string(),
            }),
        }
    }

    /// Get a user-friendly usage message for this command.
    pub fn usage(&self) -> &'static str {
        match self {
            Command::Help => "help - Display available commands",
            Command::Ps => "ps - List processes",
            Command::Kill { .. } => "kill <pid> - Terminate a process",
            Command::Ls => "ls - List the working directory",
            Command::Cd { .. } => "cd <path> - Change the working directory",
            Command::Touch { .. } => "touch <file> - Create or touch a file",
            Command::Cat { .. } => "cat <file> - Print a file",
            Command::Pwd => "pwd - Print the working directory",
            Command::Shell => "shell - Start a nested shell",
            Command::Exit => "exit - Leave this shell",
            Command::Spawn { .. } => "spawn <program> [arg] - Start a demo program",
            Command::Test1 => "test1 - Spawn an idle process (5 cycles)",
            Command::Test2 => "test2 - Spawn a memory test (10 pages)",
            Command::Run { .. } => "run [cycles] - Run the scheduler",
            Command::Stats => "stats - Show kernel metrics",
            Command::Mem { .. } => "mem <pid> - Show pages touched by a process",
            Command::Unknown { .. } => "Unknown command",
        }
    }

    /// One instance of every command, in help order.
    pub fn all() -> Vec<Command> {
        vec![
            Command::Help,
            Command::Ps,
            Command::Kill { pid: 0 },
            Command::Spawn {
                program: String::new(),
                arg: None,
            },
            Command::Run { cycles: None },
            Command::Stats,
            Command::Mem { pid: 0 },
            Command::Test1,
            Command::Test2,
            Command::Ls,
            Command::Cd {
                path: String::new(),
            },
            Command::Touch {
                file: String::new(),
            },
            Command::Cat {
                file: String::new(),
            },
            Command::Pwd,
            Command::Shell,
            Command::Exit,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse("help"), Ok(Command::Help));
        assert_eq!(Command::parse("?"), Ok(Command::Help));
        assert_eq!(Command::parse("ps"), Ok(Command::Ps));
        assert_eq!(Command::parse("ls"), Ok(Command::Ls));
        assert_eq!(Command::parse("pwd"), Ok(Command::Pwd));
        assert_eq!(Command::parse("shell"), Ok(Command::Shell));
        assert_eq!(Command::parse("exit"), Ok(Command::Exit));
        assert_eq!(Command::parse("quit"), Ok(Command::Exit));
        assert_eq!(Command::parse("test1"), Ok(Command::Test1));
        assert_eq!(Command::parse("test2"), Ok(Command::Test2));
        assert_eq!(Command::parse("stats"), Ok(Command::Stats));
    }

    #[test]
    fn test_parse_kill() {
        assert_eq!(Command::parse("kill 42"), Ok(Command::Kill { pid: 42 }));

        assert_eq!(
            Command::parse("kill"),
            Err(ParseError::MissingArgument {
                command: "kill",
                argument: "pid"
            })
        );

        assert_eq!(
            Command::parse("kill abc"),
            Err(ParseError::InvalidArgument {
                argument: "pid",
                reason: "must be a number"
            })
        );

        assert!(Command::parse("kill -1").is_err());
    }

    #[test]
    fn test_parse_path_commands() {
        assert_eq!(
            Command::parse("cd src"),
            Ok(Command::Cd {
                path: "src".to_string()
            })
        );
        assert_eq!(
            Command::parse("touch"),
            Err(ParseError::MissingArgument {
                command: "touch",
                argument: "file"
            })
        );
        assert_eq!(
            Command::parse("cat notes.txt"),
            Ok(Command::Cat {
                file: "notes.txt".to_string()
            })
        );
    }

    #[test]
    fn test_parse_spawn() {
        assert_eq!(
            Command::parse("spawn counter 5"),
            Ok(Command::Spawn {
                program: "counter".to_string(),
                arg: Some(5)
            })
        );
        assert_eq!(
            Command::parse("spawn io"),
            Ok(Command::Spawn {
                program: "io".to_string(),
                arg: None
            })
        );
        assert_eq!(
            Command::parse("spawn counter x"),
            Err(ParseError::InvalidArgument {
                argument: "arg",
                reason: "must be a number"
            })
        );
    }

    #[test]
    fn test_parse_run() {
        assert_eq!(Command::parse("run"), Ok(Command::Run { cycles: None }));
        assert_eq!(
            Command::parse("run 25"),
            Ok(Command::Run { cycles: Some(25) })
        );
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert_eq!(
            Command::parse("foobar"),
            Ok(Command::Unknown {
                cmd: "foobar".to_string()
            })
        );
        assert_eq!(
            Command::parse("   "),
            Ok(Command::Unknown { cmd: String::new() })
        );
    }

    #[test]
    fn test_every_command_has_usage() {
        for cmd in Command::all() {
            assert_ne!(cmd.usage(), "Unknown command");
        }
    }
}

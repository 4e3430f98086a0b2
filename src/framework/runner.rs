//! # Process Runner
//!
//! The lowest layer of the bootstrapper: run one external command and hand back
//! what it did. Everything else (polling, provisioning, health checks) is built on
//! [`CommandRunner`].
//!
//! The runner never interprets exit codes and never returns `Err`. A missing
//! binary, an unreachable runtime or an unknown container all come back as a
//! non-zero [`CommandOutput`], so the caller stays the only place where a failure
//! is classified.

use crate::framework::FrameworkError;
use async_trait::async_trait;
use std::fmt;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Exit code reported when the process could not be spawned at all.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Exit code reported when the process was killed by a signal.
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Where a command executes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Directly on the host (the runtime CLI itself, the compose tool, ...).
    Host,
    /// Inside a named running container, via `<runtime> exec <name>`.
    Container(String),
}

impl Target {
    pub fn container(name: impl Into<String>) -> Self {
        Target::Container(name.into())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Host => write!(f, "host"),
            Target::Container(name) => write!(f, "container:{}", name),
        }
    }
}

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last non-empty line of stderr (or stdout when stderr is empty), for diagnostics.
    pub fn last_line(&self) -> &str {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        source
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output")
            .trim()
    }
}

/// Human-readable rendering of a command, used in logs and by the test mocks.
///
/// `Host` commands render as `program args...`, container commands as
/// `exec <container> program args...`.
pub fn command_line(target: &Target, program: &str, args: &[String]) -> String {
    let mut line = match target {
        Target::Host => program.to_string(),
        Target::Container(name) => format!("exec {} {}", name, program),
    };
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Runs external commands.
///
/// Implementations spawn exactly one process per call and enforce no timeout;
/// timeout discipline belongs to the poller and the sequencer.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, target: &Target, program: &str, args: &[String]) -> CommandOutput;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// Container targets are executed through the configured runtime binary
/// (`docker exec <container> ...` by default).
#[derive(Debug, Clone)]
pub struct TokioRunner {
    runtime: String,
}

impl TokioRunner {
    pub fn new(runtime: impl Into<String>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    fn command(&self, target: &Target, program: &str, args: &[String]) -> Command {
        match target {
            Target::Host => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                cmd
            }
            Target::Container(name) => {
                let mut cmd = Command::new(&self.runtime);
                cmd.arg("exec").arg(name).arg(program).args(args);
                cmd
            }
        }
    }
}

impl Default for TokioRunner {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl CommandRunner for TokioRunner {
    #[instrument(skip(self, args), fields(on = %target))]
    async fn run(&self, target: &Target, program: &str, args: &[String]) -> CommandOutput {
        debug!(command = %command_line(target, program, args), "Spawning");
        let spawned = self
            .command(target, program, args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match spawned {
            Ok(output) => {
                let result = CommandOutput {
                    exit_code: output.status.code().unwrap_or(SIGNAL_EXIT_CODE),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                debug!(exit_code = result.exit_code, "Finished");
                result
            }
            Err(e) => {
                let error = FrameworkError::Spawn {
                    program: program.to_string(),
                    reason: e.to_string(),
                };
                debug!(error = %error, "Spawn failed");
                CommandOutput::new(SPAWN_FAILURE_EXIT_CODE, "", error.to_string())
            }
        }
    }
}

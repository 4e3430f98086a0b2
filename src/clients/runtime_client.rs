use crate::clients::service_client::{owned, ServiceClient};
use crate::framework::{CommandOutput, CommandRunner, Target};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The standalone compose binary tried when the runtime has no `compose` plugin.
pub const STANDALONE_COMPOSE: &str = "docker-compose";

/// How compose is invoked on this host: `docker compose ...` or `docker-compose ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeCommand {
    pub program: String,
    pub base_args: Vec<String>,
}

impl ComposeCommand {
    pub fn plugin(runtime: &str) -> Self {
        Self {
            program: runtime.to_string(),
            base_args: owned(&["compose"]),
        }
    }

    pub fn standalone() -> Self {
        Self {
            program: STANDALONE_COMPOSE.to_string(),
            base_args: Vec::new(),
        }
    }

    fn args(&self, rest: &[&str]) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend(rest.iter().map(|a| a.to_string()));
        args
    }
}

impl fmt::Display for ComposeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.base_args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Client for the container runtime and its compose tool. Runs on the host.
#[derive(Clone)]
pub struct RuntimeClient {
    runner: Arc<dyn CommandRunner>,
    target: Target,
    runtime: String,
    compose_file: PathBuf,
}

impl ServiceClient for RuntimeClient {
    fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    fn target(&self) -> &Target {
        &self.target
    }
}

impl RuntimeClient {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        runtime: impl Into<String>,
        compose_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            target: Target::Host,
            runtime: runtime.into(),
            compose_file: compose_file.into(),
        }
    }

    pub fn runtime(&self) -> &str {
        &self.runtime
    }

    pub fn compose_file(&self) -> &PathBuf {
        &self.compose_file
    }

    /// `<runtime> info`: succeeds only when the runtime daemon is reachable.
    #[instrument(skip(self))]
    pub async fn info(&self) -> CommandOutput {
        self.exec(&self.runtime, &owned(&["info"])).await
    }

    /// Finds a working compose invocation, preferring the runtime plugin.
    #[instrument(skip(self))]
    pub async fn detect_compose(&self) -> Option<ComposeCommand> {
        for candidate in [ComposeCommand::plugin(&self.runtime), ComposeCommand::standalone()] {
            let output = self
                .exec(&candidate.program, &candidate.args(&["version"]))
                .await;
            if output.success() {
                info!(compose = %candidate, version = output.stdout.trim(), "Compose tool found");
                return Some(candidate);
            }
            debug!(compose = %candidate, exit_code = output.exit_code, "Compose candidate unavailable");
        }
        None
    }

    /// `compose -f <file> up -d`
    #[instrument(skip(self))]
    pub async fn compose_up(&self, compose: &ComposeCommand) -> CommandOutput {
        let args = compose.args(&["-f", &self.compose_file_arg(), "up", "-d"]);
        self.exec(&compose.program, &args).await
    }

    /// `compose -f <file> down --remove-orphans`
    #[instrument(skip(self))]
    pub async fn compose_down(&self, compose: &ComposeCommand) -> CommandOutput {
        let args = compose.args(&["-f", &self.compose_file_arg(), "down", "--remove-orphans"]);
        self.exec(&compose.program, &args).await
    }

    fn compose_file_arg(&self) -> String {
        self.compose_file.display().to_string()
    }
}

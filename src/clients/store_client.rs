use crate::clients::service_client::{owned, ServiceClient};
use crate::domain::{Dependency, DependencyKind, Probe};
use crate::framework::{CommandRunner, Target};
use std::sync::Arc;

/// Expression evaluated by the store shell to answer a ping.
pub const PING_EVAL: &str = "db.adminCommand('ping').ok";

/// Client for the document store's shell, run inside the store container.
#[derive(Clone)]
pub struct StoreClient {
    runner: Arc<dyn CommandRunner>,
    target: Target,
    shell: String,
}

impl ServiceClient for StoreClient {
    fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    fn target(&self) -> &Target {
        &self.target
    }
}

impl StoreClient {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        container: impl Into<String>,
        shell: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            target: Target::container(container),
            shell: shell.into(),
        }
    }

    fn container(&self) -> &str {
        match &self.target {
            Target::Container(name) => name,
            Target::Host => "host",
        }
    }

    fn ping_args() -> Vec<String> {
        owned(&["--quiet", "--eval", PING_EVAL])
    }

    /// The store as a [`Dependency`], probed with a ping.
    pub fn dependency(&self) -> Dependency {
        let probe = Probe::Exec {
            container: self.container().to_string(),
            program: self.shell.clone(),
            args: Self::ping_args(),
        };
        Dependency::new(self.container(), DependencyKind::DocumentStore, probe.clone(), probe)
    }
}

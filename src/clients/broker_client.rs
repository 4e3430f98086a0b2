use crate::clients::service_client::{owned, ServiceClient};
use crate::domain::{Channel, Dependency, DependencyKind, Probe};
use crate::framework::{CommandOutput, CommandRunner, Target};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Client for the broker's topic administration tool, run inside the broker container.
#[derive(Clone)]
pub struct BrokerClient {
    runner: Arc<dyn CommandRunner>,
    target: Target,
    admin: String,
    bootstrap_server: String,
}

impl ServiceClient for BrokerClient {
    fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    fn target(&self) -> &Target {
        &self.target
    }
}

impl BrokerClient {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        container: impl Into<String>,
        admin: impl Into<String>,
        bootstrap_server: impl Into<String>,
    ) -> Self {
        Self {
            runner,
            target: Target::container(container),
            admin: admin.into(),
            bootstrap_server: bootstrap_server.into(),
        }
    }

    pub fn container(&self) -> &str {
        match &self.target {
            Target::Container(name) => name,
            Target::Host => "host",
        }
    }

    fn list_args(&self) -> Vec<String> {
        owned(&["--bootstrap-server", &self.bootstrap_server, "--list"])
    }

    /// The broker as a [`Dependency`]: ready (and healthy) once it answers a channel listing.
    pub fn dependency(&self) -> Dependency {
        let probe = Probe::Exec {
            container: self.container().to_string(),
            program: self.admin.clone(),
            args: self.list_args(),
        };
        Dependency::new(self.container(), DependencyKind::Broker, probe.clone(), probe)
    }

    /// `--list`: one channel name per line on stdout.
    #[instrument(skip(self))]
    pub async fn list_channels(&self) -> CommandOutput {
        self.exec(&self.admin, &self.list_args()).await
    }

    /// `--create --if-not-exists` for one channel.
    #[instrument(skip(self), fields(channel = %channel.name))]
    pub async fn create_channel(&self, channel: &Channel) -> CommandOutput {
        let partitions = channel.partitions.to_string();
        let replication = channel.replication_factor.to_string();
        let args = owned(&[
            "--bootstrap-server",
            &self.bootstrap_server,
            "--create",
            "--if-not-exists",
            "--topic",
            &channel.name,
            "--partitions",
            &partitions,
            "--replication-factor",
            &replication,
        ]);
        debug!(?channel, "Creating channel");
        self.exec(&self.admin, &args).await
    }
}

/// Parses the output of a channel listing into names, skipping blanks and
/// internal channels (those starting with `__`).
pub fn parse_channel_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("__"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChannelRole;
    use crate::framework::mock::MockRunner;

    fn client(mock: &MockRunner) -> BrokerClient {
        BrokerClient::new(mock.runner(), "kafka", "kafka-topics", "localhost:9092")
    }

    #[tokio::test]
    async fn test_create_channel_command() {
        let mock = MockRunner::new();
        mock.expect(
            "exec kafka kafka-topics --bootstrap-server localhost:9092 --create --if-not-exists \
             --topic wallet-transactions --partitions 1 --replication-factor 1",
        )
        .return_ok("Created topic wallet-transactions.\n");

        let channel = Channel::new("wallet-transactions", ChannelRole::Input);
        let output = client(&mock).create_channel(&channel).await;

        assert!(output.success());
        mock.verify();
    }

    #[test]
    fn test_dependency_probes_list_channels() {
        let mock = MockRunner::new();
        let dependency = client(&mock).dependency();

        assert_eq!(dependency.name, "kafka");
        assert_eq!(dependency.kind, DependencyKind::Broker);
        match dependency.readiness {
            Probe::Exec { container, program, args } => {
                assert_eq!(container, "kafka");
                assert_eq!(program, "kafka-topics");
                assert_eq!(args.last().map(String::as_str), Some("--list"));
            }
            other => panic!("unexpected probe {:?}", other),
        }
    }

    #[test]
    fn test_parse_channel_list() {
        let stdout = "__consumer_offsets\nwallet-transactions\n\n wallet-scores-success \n";
        assert_eq!(
            parse_channel_list(stdout),
            ["wallet-transactions", "wallet-scores-success"]
        );
    }
}

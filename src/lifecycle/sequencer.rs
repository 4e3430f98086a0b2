use crate::clients::{AppClient, AppStats, BrokerClient, ComposeCommand, RuntimeClient, StoreClient};
use crate::domain::{Dependency, HealthReport, Overall};
use crate::framework::{CommandRunner, HttpProbe, PollError, PollPolicy, Poller};
use crate::health::{HealthVerifier, ProbeExecutor};
use crate::lifecycle::StackConfig;
use crate::provisioner::{ChannelProvisioner, ChannelStatus, ProvisionError};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

/// Steps of a bootstrap run, in the only order they can happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    Preflight,
    CleanSlate,
    BringUp,
    GraceDelay1,
    BrokerReadinessPoll,
    ChannelProvisioning,
    GraceDelay2,
    HealthVerification,
    Report,
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Entry in the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: State,
    pub at: DateTime<Utc>,
}

/// Failures that end a run before the report.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Preflight failed: {0}")]
    Preflight(String),

    #[error("Stack bring-up failed: {0}")]
    BringUp(String),

    #[error("Broker never became ready: {0}")]
    BrokerUnavailable(PollError),

    #[error("Channel provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),

    #[error("Interrupted during {state}")]
    Cancelled { state: State },
}

impl SequenceError {
    /// Process exit code for this failure: 130 for an interrupt, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            SequenceError::Cancelled { .. } => 130,
            _ => 1,
        }
    }
}

/// Everything a run produced, fatal or not.
#[derive(Debug)]
pub struct RunSummary {
    pub transitions: Vec<Transition>,
    pub compose: Option<ComposeCommand>,
    pub provisioned: Vec<(String, ChannelStatus)>,
    pub report: Option<HealthReport>,
    pub stats: Option<AppStats>,
    pub outcome: Result<Overall, SequenceError>,
}

impl RunSummary {
    fn new() -> Self {
        Self {
            transitions: Vec::new(),
            compose: None,
            provisioned: Vec::new(),
            report: None,
            stats: None,
            outcome: Ok(Overall::Degraded),
        }
    }

    /// States entered, in order.
    pub fn states(&self) -> Vec<State> {
        self.transitions.iter().map(|t| t.state).collect()
    }

    pub fn reached(&self, state: State) -> bool {
        self.transitions.iter().any(|t| t.state == state)
    }

    /// 0 when every check passed, 2 when some failed, otherwise the error's code.
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            Ok(Overall::Healthy) => 0,
            Ok(Overall::Degraded) => 2,
            Err(e) => e.exit_code(),
        }
    }

    fn enter(&mut self, state: State) -> Span {
        self.transitions.push(Transition {
            state,
            at: Utc::now(),
        });
        let span = info_span!("state", state = ?state);
        span.in_scope(|| info!("Entering state"));
        span
    }
}

/// The bootstrap state machine.
///
/// Owns one client per collaborator and drives them strictly in [`State`]
/// order. Lower layers only return results; this is the one place that decides
/// whether a failure aborts the run, is logged and ignored, or goes into the
/// report.
///
/// # Example
///
/// ```ignore
/// let cancel = CancellationToken::new();
/// let sequencer = StackSequencer::new(config, runner, http, cancel.clone());
/// let summary = sequencer.run().await;
/// std::process::exit(summary.exit_code());
/// ```
pub struct StackSequencer {
    config: StackConfig,
    runtime: RuntimeClient,
    broker: BrokerClient,
    store: StoreClient,
    app: AppClient,
    provisioner: ChannelProvisioner,
    executor: ProbeExecutor,
    poller: Poller,
}

impl StackSequencer {
    pub fn new(
        config: StackConfig,
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpProbe>,
        cancel: CancellationToken,
    ) -> Self {
        let runtime = RuntimeClient::new(runner.clone(), &config.runtime, &config.compose_file);
        let broker = BrokerClient::new(
            runner.clone(),
            &config.broker_container,
            &config.broker_admin,
            &config.bootstrap_server,
        );
        let store = StoreClient::new(runner.clone(), &config.store_container, &config.store_shell);
        let app = AppClient::new(http.clone(), &config.app_url);

        Self {
            provisioner: ChannelProvisioner::new(broker.clone()),
            executor: ProbeExecutor::new(runner, http),
            poller: Poller::new(cancel),
            config,
            runtime,
            broker,
            store,
            app,
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Broker, store and application, in verification order.
    pub fn dependencies(&self) -> Vec<Dependency> {
        vec![
            self.broker.dependency(),
            self.store.dependency(),
            self.app.dependency(),
        ]
    }

    fn poll_policy(&self) -> PollPolicy {
        PollPolicy::unbounded(self.config.poll_interval).with_timeout(self.config.timeout)
    }

    /// Runs every state in order and returns the run log with the outcome.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new();
        summary.outcome = self.drive(&mut summary).await;

        match &summary.outcome {
            Ok(overall) => info!(?overall, "Bootstrap finished"),
            Err(e) => error!(error = %e, "Bootstrap aborted"),
        }
        summary
    }

    async fn drive(&self, summary: &mut RunSummary) -> Result<Overall, SequenceError> {
        let span = summary.enter(State::Preflight);
        let compose = self.preflight().instrument(span).await?;
        summary.compose = Some(compose.clone());

        let span = summary.enter(State::CleanSlate);
        self.clean_slate(&compose).instrument(span).await;

        let span = summary.enter(State::BringUp);
        self.bring_up(&compose).instrument(span).await?;

        let span = summary.enter(State::GraceDelay1);
        self.grace(State::GraceDelay1, "initial", self.config.initial_grace)
            .instrument(span)
            .await?;

        let span = summary.enter(State::BrokerReadinessPoll);
        self.wait_for_broker().instrument(span).await?;

        let span = summary.enter(State::ChannelProvisioning);
        summary.provisioned = self
            .provisioner
            .ensure_all(&self.config.channels())
            .instrument(span)
            .await?;

        let span = summary.enter(State::GraceDelay2);
        self.grace(State::GraceDelay2, "settle", self.config.settle_grace)
            .instrument(span)
            .await?;

        let span = summary.enter(State::HealthVerification);
        let verifier = HealthVerifier::new(self.executor.clone(), self.poller.clone(), self.poll_policy());
        let report = verifier.verify(&self.dependencies()).instrument(span).await;
        let overall = report.overall();
        summary.report = Some(report);
        if self.poller.cancel_token().is_cancelled() {
            return Err(SequenceError::Cancelled {
                state: State::HealthVerification,
            });
        }

        let span = summary.enter(State::Report);
        summary.stats = self.fetch_stats(summary.report.as_ref()).instrument(span).await;

        summary.enter(State::Done);
        Ok(overall)
    }

    async fn preflight(&self) -> Result<ComposeCommand, SequenceError> {
        let info = self.runtime.info().await;
        if !info.success() {
            return Err(SequenceError::Preflight(format!(
                "container runtime `{}` is not reachable: {}",
                self.runtime.runtime(),
                info.last_line()
            )));
        }

        self.runtime.detect_compose().await.ok_or_else(|| {
            SequenceError::Preflight(format!(
                "no compose tool found (tried `{}` and `{}`)",
                ComposeCommand::plugin(self.runtime.runtime()),
                ComposeCommand::standalone()
            ))
        })
    }

    async fn clean_slate(&self, compose: &ComposeCommand) {
        let output = self.runtime.compose_down(compose).await;
        if output.success() {
            info!("Previous stack removed");
        } else {
            warn!(exit_code = output.exit_code, reason = output.last_line(), "Clean slate failed, continuing");
        }
    }

    async fn bring_up(&self, compose: &ComposeCommand) -> Result<(), SequenceError> {
        let output = self.runtime.compose_up(compose).await;
        if output.success() {
            info!("Stack started");
            Ok(())
        } else {
            Err(SequenceError::BringUp(format!(
                "exit {}: {}",
                output.exit_code,
                output.last_line()
            )))
        }
    }

    async fn grace(&self, state: State, label: &str, duration: std::time::Duration) -> Result<(), SequenceError> {
        self.poller
            .grace_delay(label, duration)
            .await
            .map_err(|_| SequenceError::Cancelled { state })
    }

    async fn wait_for_broker(&self) -> Result<(), SequenceError> {
        let broker = self.broker.dependency();
        let executor = &self.executor;
        let probe = &broker.readiness;

        self.poller
            .wait_until_ready(&broker.name, &self.poll_policy(), move || async move {
                executor.check(probe).await.map(|_| ())
            })
            .await
            .map(|_| ())
            .map_err(|e| match e {
                e if e.is_cancelled() => SequenceError::Cancelled {
                    state: State::BrokerReadinessPoll,
                },
                e => SequenceError::BrokerUnavailable(e),
            })
    }

    async fn fetch_stats(&self, report: Option<&HealthReport>) -> Option<AppStats> {
        let app = self.app.dependency();
        let app_healthy = report
            .and_then(|r| r.find(&app.name, app.kind))
            .is_some_and(|entry| entry.outcome.is_healthy());
        if !app_healthy {
            return None;
        }

        match self.app.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                debug!(error = %e, "Statistics unavailable");
                None
            }
        }
    }
}

use stack_bootstrap::domain::{CheckOutcome, Overall};
use stack_bootstrap::framework::mock::{MockHttp, MockRunner};
use stack_bootstrap::lifecycle::{render_report, SequenceError, StackConfig, StackSequencer, State};
use stack_bootstrap::provisioner::ChannelStatus;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LISTING: &str = "wallet-scores-failure\nwallet-scores-success\nwallet-transactions\n";
const HEALTH_BODY: &str = r#"{"status":"healthy","version":"1.0.0","kafka_status":"connected","mongodb_status":"connected"}"#;
const STATS_BODY: &str = r#"{"total_wallets_processed":0,"successful_wallets":0,"failed_wallets":0,"average_processing_time_ms":0.0,"last_processed_wallet":null,"uptime_seconds":12.5}"#;

fn sequencer(runner: &MockRunner, http: &MockHttp, config: StackConfig) -> StackSequencer {
    StackSequencer::new(config, runner.runner(), http.probe(), CancellationToken::new())
}

fn expect_started_stack(runner: &MockRunner) {
    runner.expect("docker info").return_ok("Server Version: 27.0.3");
    runner.expect("docker compose version").return_ok("Docker Compose version v2.29.1");
    runner.expect("docker compose -f docker-compose.yml down --remove-orphans").return_ok("");
    runner.expect("docker compose -f docker-compose.yml up -d").return_ok("");
}

fn expect_channels_created(runner: &MockRunner) {
    for topic in ["wallet-transactions", "wallet-scores-success", "wallet-scores-failure"] {
        runner
            .expect(format!("--create --if-not-exists --topic {} ", topic))
            .return_ok(format!("Created topic {}.\n", topic));
    }
    runner.expect("kafka-topics --bootstrap-server localhost:9092 --list").return_ok(LISTING);
}

#[tokio::test(start_paused = true)]
async fn test_healthy_stack_exits_zero() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    // Broker readiness: two failures, then ready
    runner.expect("--list").times(2).return_exit(1, "TimeoutException: Timed out waiting for a node assignment");
    runner.expect("--list").return_ok("");
    expect_channels_created(&runner);
    // Final verification
    runner.expect("exec kafka kafka-topics").return_ok(LISTING);
    runner.expect("exec mongodb mongosh --quiet --eval").return_ok("1\n");
    http.expect_get("http://localhost:8000/api/v1/health").return_status(200, HEALTH_BODY);
    http.expect_get("http://localhost:8000/api/v1/stats").return_status(200, STATS_BODY);

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert_eq!(summary.outcome, Ok(Overall::Healthy));
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(
        summary.states(),
        [
            State::Preflight,
            State::CleanSlate,
            State::BringUp,
            State::GraceDelay1,
            State::BrokerReadinessPoll,
            State::ChannelProvisioning,
            State::GraceDelay2,
            State::HealthVerification,
            State::Report,
            State::Done,
        ]
    );

    let report = summary.report.as_ref().unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.entries().iter().all(|e| e.outcome.is_healthy()));
    assert!(summary
        .provisioned
        .iter()
        .all(|(_, status)| *status == ChannelStatus::Created));
    assert!(summary.stats.is_some());

    runner.verify();
    http.verify();
}

#[tokio::test(start_paused = true)]
async fn test_broker_poll_makes_n_plus_one_attempts_before_provisioning() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    runner.expect("--list").times(4).return_exit(1, "broker not available");
    runner.expect("--list").return_ok("");
    expect_channels_created(&runner);
    runner.expect("exec kafka kafka-topics").return_ok(LISTING);
    runner.expect("mongosh").return_ok("1\n");
    http.expect_get("/api/v1/health").return_status(200, "");
    http.expect_get("/api/v1/stats").return_refused();

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;
    assert_eq!(summary.exit_code(), 0);

    let calls = runner.calls();
    let first_create = calls.iter().position(|c| c.contains("--create")).unwrap();
    let lists_before_create = calls[..first_create]
        .iter()
        .filter(|c| c.contains("--list"))
        .count();
    assert_eq!(lists_before_create, 5);
    assert!(summary.stats.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_is_partial_and_still_reports() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    runner.expect("--list").times(2).return_exit(1, "not ready");
    runner.expect("--list").return_ok("");
    expect_channels_created(&runner);
    runner.expect("exec kafka kafka-topics").return_ok(LISTING);
    runner
        .expect("exec mongodb mongosh")
        .return_exit(1, "MongoServerSelectionError: connect ECONNREFUSED 127.0.0.1:27017");
    http.expect_get("/api/v1/health").return_status(200, HEALTH_BODY);
    http.expect_get("/api/v1/stats").return_status(200, STATS_BODY);

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert_eq!(summary.outcome, Ok(Overall::Degraded));
    assert_eq!(summary.exit_code(), 2);
    assert!(summary.reached(State::Report));

    let report = summary.report.as_ref().unwrap();
    assert_eq!(report.len(), 3);
    assert!(report.get("kafka").unwrap().outcome.is_healthy());
    assert!(matches!(report.get("mongodb").unwrap().outcome, CheckOutcome::Unhealthy(_)));
    assert!(report.get("app").unwrap().outcome.is_healthy());

    let text = render_report(&summary, &StackConfig::default());
    assert!(text.contains("DEGRADED (1 of 3 checks failed)"));
    assert!(text.contains("Application:    http://localhost:8000"));
    assert!(text.contains("Success: wallet-scores-success"));
    assert!(text.contains("Tail the logs:"));
    runner.verify();
    http.verify();
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_runtime_starts_nothing() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    runner
        .expect("docker info")
        .return_exit(1, "Cannot connect to the Docker daemon at unix:///var/run/docker.sock");

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert!(matches!(summary.outcome, Err(SequenceError::Preflight(_))));
    assert_eq!(summary.exit_code(), 1);
    assert_eq!(summary.states(), [State::Preflight]);
    assert_eq!(runner.count("up -d"), 0);
    assert_eq!(runner.calls().len(), 1);
    assert!(summary.report.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_clean_slate_failure_does_not_block_bring_up() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    runner.expect("docker info").return_ok("");
    runner.expect("docker compose version").return_ok("v2");
    runner.expect("down --remove-orphans").return_exit(1, "no configuration file provided");
    runner.expect("up -d").return_ok("");
    runner.expect("--list").return_ok("");
    expect_channels_created(&runner);
    runner.expect("exec kafka kafka-topics").return_ok(LISTING);
    runner.expect("mongosh").return_ok("1\n");
    http.expect_get("/api/v1/health").return_status(200, "");
    http.expect_get("/api/v1/stats").return_status(404, "");

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert!(summary.reached(State::BringUp));
    assert_eq!(runner.count("up -d"), 1);
    assert_eq!(summary.exit_code(), 0);
    runner.verify();
}

#[tokio::test(start_paused = true)]
async fn test_broker_timeout_aborts_before_provisioning() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    runner.expect("--list").times(3).return_exit(1, "broker not available");

    let config = StackConfig {
        timeout: Some(Duration::from_secs(12)),
        ..StackConfig::default()
    };
    let summary = sequencer(&runner, &http, config).run().await;

    assert!(matches!(
        summary.outcome,
        Err(SequenceError::BrokerUnavailable(ref e)) if e.attempts() == 3
    ));
    assert_eq!(summary.exit_code(), 1);
    assert!(!summary.reached(State::ChannelProvisioning));
    assert_eq!(runner.count("--create"), 0);
    runner.verify();
}

#[tokio::test(start_paused = true)]
async fn test_rerun_against_live_stack_is_idempotent() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    runner.expect("--list").return_ok(LISTING);
    runner.expect("--create").times(3).return_ok("");
    runner.expect("--list").return_ok(LISTING);
    runner.expect("exec kafka kafka-topics").return_ok(LISTING);
    runner.expect("mongosh").return_ok("1\n");
    http.expect_get("/api/v1/health").return_status(200, HEALTH_BODY);
    http.expect_get("/api/v1/stats").return_status(200, STATS_BODY);

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert_eq!(summary.exit_code(), 0);
    assert!(summary
        .provisioned
        .iter()
        .all(|(_, status)| *status == ChannelStatus::AlreadyPresent));
    runner.verify();
}

#[tokio::test(start_paused = true)]
async fn test_provisioning_rejection_is_fatal() {
    let runner = MockRunner::new();
    let http = MockHttp::new();
    expect_started_stack(&runner);
    runner.expect("--list").return_ok("");
    runner
        .expect("--create")
        .times(3)
        .return_exit(1, "InvalidReplicationFactorException: Replication factor: 1 larger than available brokers: 0.");

    let summary = sequencer(&runner, &http, StackConfig::default()).run().await;

    assert!(matches!(summary.outcome, Err(SequenceError::Provisioning(_))));
    assert_eq!(summary.exit_code(), 1);
    assert!(!summary.reached(State::HealthVerification));
    assert_eq!(http.count("/api/v1/health"), 0);
}

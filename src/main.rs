//! # Stack Bootstrap
//!
//! Command-line entry point. Parses flags (with env fallbacks and a `.env`
//! file), wires the real process runner and HTTP client into the
//! [`StackSequencer`], prints the report and exits with the run's code.

use clap::Parser;
use stack_bootstrap::framework::{ReqwestProbe, TokioRunner};
use stack_bootstrap::lifecycle::{
    enter_pressed, parse_duration, pause_until, render_report, setup_tracing, PauseOutcome,
    StackConfig, StackSequencer,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Per-request timeout for the application's HTTP endpoints.
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(
    name = "stack-bootstrap",
    version,
    about = "Start the wallet-scoring stack, provision its channels and verify its health"
)]
struct Cli {
    /// Container runtime binary
    #[arg(long, env = "STACK_RUNTIME", default_value = "docker")]
    runtime: String,

    /// Compose file describing the stack
    #[arg(long, env = "STACK_COMPOSE_FILE", default_value = "docker-compose.yml")]
    compose_file: PathBuf,

    /// Name of the broker container
    #[arg(long, env = "STACK_BROKER_CONTAINER", default_value = "kafka")]
    broker_container: String,

    /// Name of the document store container
    #[arg(long, env = "STACK_STORE_CONTAINER", default_value = "mongodb")]
    store_container: String,

    /// Broker address as seen from inside the broker container
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS", default_value = "localhost:9092")]
    bootstrap_server: String,

    /// Broker channel administration tool
    #[arg(long, env = "STACK_BROKER_ADMIN", default_value = "kafka-topics")]
    broker_admin: String,

    /// Document store shell used for the ping
    #[arg(long, env = "STACK_STORE_SHELL", default_value = "mongosh")]
    store_shell: String,

    /// Base URL of the application server
    #[arg(long, env = "STACK_APP_URL", default_value = "http://localhost:8000")]
    app_url: String,

    #[arg(long, env = "KAFKA_INPUT_TOPIC", default_value = "wallet-transactions")]
    input_topic: String,

    #[arg(long, env = "KAFKA_SUCCESS_TOPIC", default_value = "wallet-scores-success")]
    success_topic: String,

    #[arg(long, env = "KAFKA_FAILURE_TOPIC", default_value = "wallet-scores-failure")]
    failure_topic: String,

    /// Settle time after bring-up
    #[arg(long, default_value = "45s", value_parser = parse_duration)]
    initial_grace: Duration,

    /// Settle time after channel provisioning
    #[arg(long, default_value = "20s", value_parser = parse_duration)]
    settle_grace: Duration,

    /// Delay between readiness probes
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    poll_interval: Duration,

    /// Give up on the broker and application polls after this long (default: wait forever)
    #[arg(long, env = "STACK_TIMEOUT", value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Do not wait for Enter before exiting
    #[arg(long)]
    non_interactive: bool,

    /// Debug logging when RUST_LOG is not set
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> StackConfig {
        StackConfig {
            runtime: self.runtime,
            compose_file: self.compose_file,
            broker_container: self.broker_container,
            store_container: self.store_container,
            bootstrap_server: self.bootstrap_server,
            broker_admin: self.broker_admin,
            store_shell: self.store_shell,
            app_url: self.app_url,
            input_channel: self.input_topic,
            success_channel: self.success_topic,
            failure_channel: self.failure_topic,
            initial_grace: self.initial_grace,
            settle_grace: self.settle_grace,
            poll_interval: self.poll_interval,
            timeout: self.timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The application reads the same .env; a missing file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let non_interactive = cli.non_interactive;
    let config = cli.into_config();
    info!(?config, "Starting stack bootstrap");

    let http = match ReqwestProbe::new(HTTP_REQUEST_TIMEOUT) {
        Ok(http) => http,
        Err(e) => {
            error!(error = %e, "Cannot build HTTP client");
            return ExitCode::from(1);
        }
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, aborting current wait");
            interrupt.cancel();
        }
    });

    let runner = Arc::new(TokioRunner::new(config.runtime.clone()));
    let sequencer = StackSequencer::new(config, runner, Arc::new(http), cancel.clone());
    let summary = sequencer.run().await;

    println!("{}", render_report(&summary, sequencer.config()));

    let code = summary.exit_code();

    if !non_interactive {
        print!("Press Enter to exit...");
        let _ = std::io::stdout().flush();
        if pause_until(enter_pressed(), &cancel).await == PauseOutcome::Interrupted {
            println!();
            return ExitCode::from(130);
        }
    }

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

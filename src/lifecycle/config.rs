use crate::domain::{Channel, FAILURE_CHANNEL, INPUT_CHANNEL, SUCCESS_CHANNEL};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_RUNTIME: &str = "docker";
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_BROKER_CONTAINER: &str = "kafka";
pub const DEFAULT_STORE_CONTAINER: &str = "mongodb";
pub const DEFAULT_BOOTSTRAP_SERVER: &str = "localhost:9092";
pub const DEFAULT_BROKER_ADMIN: &str = "kafka-topics";
pub const DEFAULT_STORE_SHELL: &str = "mongosh";
pub const DEFAULT_APP_URL: &str = "http://localhost:8000";

pub const DEFAULT_INITIAL_GRACE: Duration = Duration::from_secs(45);
pub const DEFAULT_SETTLE_GRACE: Duration = Duration::from_secs(20);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Every knob of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub runtime: String,
    pub compose_file: PathBuf,
    pub broker_container: String,
    pub store_container: String,
    /// Broker address as seen from inside the broker container.
    pub bootstrap_server: String,
    pub broker_admin: String,
    pub store_shell: String,
    pub app_url: String,
    pub input_channel: String,
    pub success_channel: String,
    pub failure_channel: String,
    pub initial_grace: Duration,
    pub settle_grace: Duration,
    pub poll_interval: Duration,
    /// Bound for each otherwise unbounded poll. `None` waits until cancelled.
    pub timeout: Option<Duration>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            compose_file: PathBuf::from(DEFAULT_COMPOSE_FILE),
            broker_container: DEFAULT_BROKER_CONTAINER.to_string(),
            store_container: DEFAULT_STORE_CONTAINER.to_string(),
            bootstrap_server: DEFAULT_BOOTSTRAP_SERVER.to_string(),
            broker_admin: DEFAULT_BROKER_ADMIN.to_string(),
            store_shell: DEFAULT_STORE_SHELL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            input_channel: INPUT_CHANNEL.to_string(),
            success_channel: SUCCESS_CHANNEL.to_string(),
            failure_channel: FAILURE_CHANNEL.to_string(),
            initial_grace: DEFAULT_INITIAL_GRACE,
            settle_grace: DEFAULT_SETTLE_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl StackConfig {
    /// The three channels the application reads and writes.
    pub fn channels(&self) -> Vec<Channel> {
        Channel::named(&self.input_channel, &self.success_channel, &self.failure_channel)
    }
}

/// Parses `90`, `90s`, `500ms`, `5m` or `1h`. A bare number is seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration `{}`", input))?;

    let seconds = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration out of range: `{}`", input))
    };

    match unit.trim() {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => seconds(60),
        "h" => seconds(3600),
        other => Err(format!("unknown duration unit `{}` in `{}`", other, input)),
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Channel name the application consumes wallet transactions from.
pub const INPUT_CHANNEL: &str = "wallet-transactions";
/// Channel name the application publishes successful scores to.
pub const SUCCESS_CHANNEL: &str = "wallet-scores-success";
/// Channel name the application publishes scoring failures to.
pub const FAILURE_CHANNEL: &str = "wallet-scores-failure";

/// What the application uses a channel for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    Input,
    Success,
    Failure,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelRole::Input => "input",
            ChannelRole::Success => "success",
            ChannelRole::Failure => "failure",
        };
        f.write_str(label)
    }
}

/// A broker topic the stack needs before the application can start consuming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub role: ChannelRole,
    pub partitions: u32,
    pub replication_factor: u32,
}

impl Channel {
    /// Creates a single-partition, single-replica channel.
    pub fn new(name: impl Into<String>, role: ChannelRole) -> Self {
        Self {
            name: name.into(),
            role,
            partitions: 1,
            replication_factor: 1,
        }
    }

    /// The three channels with their interoperability names.
    pub fn defaults() -> Vec<Channel> {
        Self::named(INPUT_CHANNEL, SUCCESS_CHANNEL, FAILURE_CHANNEL)
    }

    /// The three channels, with names taken from configuration.
    pub fn named(input: &str, success: &str, failure: &str) -> Vec<Channel> {
        vec![
            Channel::new(input, ChannelRole::Input),
            Channel::new(success, ChannelRole::Success),
            Channel::new(failure, ChannelRole::Failure),
        ]
    }
}

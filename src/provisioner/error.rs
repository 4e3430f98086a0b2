//! Error types for channel provisioning.

use thiserror::Error;

/// Errors that can occur while ensuring the broker channels exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// The broker refused a create request for a reason other than "already exists".
    #[error("Broker rejected channel {channel} (exit {exit_code}): {stderr}")]
    Rejected {
        channel: String,
        exit_code: i32,
        stderr: String,
    },

    /// The broker stopped answering administrative commands.
    #[error("Broker not ready: {0}")]
    BrokerNotReady(String),

    /// A channel reported as created does not show up in the channel list.
    #[error("Channel {0} missing after provisioning")]
    Missing(String),
}

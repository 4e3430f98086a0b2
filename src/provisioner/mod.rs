//! # Channel Provisioner
//!
//! Makes sure the broker channels the application needs exist. Creation is
//! idempotent: a channel that is already there counts as success, so the whole
//! bootstrap can be re-run against a live stack.
//!
//! # Main Components
//!
//! - [`ChannelProvisioner::ensure_channel`] - create one channel if absent
//! - [`ChannelProvisioner::ensure_all`] - create all channels concurrently, then confirm them
//! - [`ProvisionError`] - why provisioning could not complete

pub mod error;

pub use error::*;

use crate::clients::{parse_channel_list, BrokerClient};
use crate::domain::Channel;
use futures::future::try_join_all;
use std::fmt;
use tracing::{info, instrument, warn};

/// Marker the broker's admin tool prints when a channel is already present.
const ALREADY_EXISTS: &str = "already exists";

/// What `ensure_channel` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    Created,
    AlreadyPresent,
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Created => f.write_str("created"),
            ChannelStatus::AlreadyPresent => f.write_str("already present"),
        }
    }
}

/// Creates broker channels through a [`BrokerClient`].
#[derive(Clone)]
pub struct ChannelProvisioner {
    broker: BrokerClient,
}

impl ChannelProvisioner {
    pub fn new(broker: BrokerClient) -> Self {
        Self { broker }
    }

    /// Creates `channel` unless it already exists.
    ///
    /// The request carries `--if-not-exists`; an explicit "already exists"
    /// rejection is accepted as well. Any other non-zero exit is
    /// [`ProvisionError::Rejected`].
    #[instrument(skip(self), fields(channel = %channel.name))]
    pub async fn ensure_channel(&self, channel: &Channel) -> Result<ChannelStatus, ProvisionError> {
        let output = self.broker.create_channel(channel).await;

        let status = if output.success() {
            if output.stdout.contains("Created") {
                ChannelStatus::Created
            } else {
                ChannelStatus::AlreadyPresent
            }
        } else if output.stderr.contains(ALREADY_EXISTS) || output.stdout.contains(ALREADY_EXISTS) {
            ChannelStatus::AlreadyPresent
        } else {
            warn!(exit_code = output.exit_code, reason = output.last_line(), "Channel rejected");
            return Err(ProvisionError::Rejected {
                channel: channel.name.clone(),
                exit_code: output.exit_code,
                stderr: output.last_line().to_string(),
            });
        };

        info!(%status, "Channel ensured");
        Ok(status)
    }

    /// Ensures every channel, concurrently, then re-reads the channel list and
    /// checks that each one is really there.
    #[instrument(skip_all, fields(count = channels.len()))]
    pub async fn ensure_all(
        &self,
        channels: &[Channel],
    ) -> Result<Vec<(String, ChannelStatus)>, ProvisionError> {
        let statuses =
            try_join_all(channels.iter().map(|channel| self.ensure_channel(channel))).await?;

        let listing = self.broker.list_channels().await;
        if !listing.success() {
            return Err(ProvisionError::BrokerNotReady(listing.last_line().to_string()));
        }
        let present = parse_channel_list(&listing.stdout);
        if let Some(missing) = channels.iter().find(|c| !present.contains(&c.name)) {
            return Err(ProvisionError::Missing(missing.name.clone()));
        }

        Ok(channels
            .iter()
            .map(|c| c.name.clone())
            .zip(statuses)
            .collect())
    }
}

use crate::clients::{ComposeCommand, DOCS_PATH, HEALTH_PATH, STATS_PATH};
use crate::domain::{CheckOutcome, ChannelRole, Overall};
use crate::lifecycle::{RunSummary, SequenceError, StackConfig};
use std::fmt;

/// Host port the broker publishes.
pub const BROKER_PORT: u16 = 9092;
/// Host port the document store publishes.
pub const STORE_PORT: u16 = 27017;

/// Renders the operator-facing report for a finished run.
///
/// A run that got past preflight always gets the endpoint, channel and command
/// blocks, whatever the health outcome.
pub fn render_report(summary: &RunSummary, config: &StackConfig) -> String {
    ReportView { summary, config }.to_string()
}

struct ReportView<'a> {
    summary: &'a RunSummary,
    config: &'a StackConfig,
}

impl ReportView<'_> {
    fn headline(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.summary.outcome {
            Ok(Overall::Healthy) => writeln!(f, "Overall: HEALTHY"),
            Ok(Overall::Degraded) => {
                let (failed, total) = self
                    .summary
                    .report
                    .as_ref()
                    .map(|r| (r.failures().count(), r.len()))
                    .unwrap_or_default();
                writeln!(f, "Overall: DEGRADED ({} of {} checks failed)", failed, total)
            }
            Err(e) => writeln!(f, "Overall: ABORTED ({})", e),
        }
    }

    fn health(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(report) = &self.summary.report else {
            return Ok(());
        };
        writeln!(f, "\nHealth:")?;
        for entry in report.entries() {
            match &entry.outcome {
                CheckOutcome::Healthy => write!(
                    f,
                    "  [ok]   {} ({}), {} attempt(s)",
                    entry.dependency, entry.kind, entry.attempts
                )?,
                CheckOutcome::Unhealthy(reason) => write!(
                    f,
                    "  [FAIL] {} ({}): {}",
                    entry.dependency, entry.kind, reason
                )?,
            }
            match &entry.detail {
                Some(detail) => writeln!(f, " [{}]", detail)?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }

    fn channels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nChannels:")?;
        for channel in self.config.channels() {
            let label = match channel.role {
                ChannelRole::Input => "Input:  ",
                ChannelRole::Success => "Success:",
                ChannelRole::Failure => "Failure:",
            };
            let status = self
                .summary
                .provisioned
                .iter()
                .find(|(name, _)| *name == channel.name)
                .map(|(_, status)| format!(" ({})", status))
                .unwrap_or_default();
            writeln!(f, "  {} {}{}", label, channel.name, status)?;
        }
        Ok(())
    }

    fn endpoints(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let app = self.config.app_url.trim_end_matches('/');
        writeln!(f, "\nEndpoints:")?;
        writeln!(f, "  Application:    {}", app)?;
        writeln!(f, "  Health check:   {}{}", app, HEALTH_PATH)?;
        writeln!(f, "  Statistics:     {}{}", app, STATS_PATH)?;
        writeln!(f, "  API docs:       {}{}", app, DOCS_PATH)?;
        writeln!(f, "  Broker:         localhost:{}", BROKER_PORT)?;
        writeln!(f, "  Document store: mongodb://localhost:{}", STORE_PORT)
    }

    fn stats(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(stats) = &self.summary.stats else {
            return Ok(());
        };
        writeln!(
            f,
            "\nProcessed wallets: {} ({} successful, {} failed, avg {:.1} ms)",
            stats.total_wallets_processed,
            stats.successful_wallets,
            stats.failed_wallets,
            stats.average_processing_time_ms
        )
    }

    fn commands(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let compose = self
            .summary
            .compose
            .clone()
            .unwrap_or_else(|| ComposeCommand::plugin(&self.config.runtime));
        let file = self.config.compose_file.display();
        writeln!(f, "\nCommands:")?;
        writeln!(f, "  Stop the stack: {} -f {} down", compose, file)?;
        writeln!(f, "  Tail the logs:  {} -f {} logs -f", compose, file)
    }

    fn elapsed(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transitions = &self.summary.transitions;
        if let (Some(first), Some(last)) = (transitions.first(), transitions.last()) {
            let elapsed = last.at - first.at;
            writeln!(
                f,
                "\nFinished in {}s ({} states entered, last: {})",
                elapsed.num_seconds(),
                transitions.len(),
                last.state
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== Stack bootstrap report ====")?;
        self.headline(f)?;

        if let Err(SequenceError::Preflight(_)) = &self.summary.outcome {
            writeln!(
                f,
                "\nNothing was started. Make sure `{}` is running and a compose tool is installed.",
                self.config.runtime
            )?;
            return Ok(());
        }

        self.health(f)?;
        self.channels(f)?;
        self.endpoints(f)?;
        self.stats(f)?;
        self.commands(f)?;
        self.elapsed(f)
    }
}

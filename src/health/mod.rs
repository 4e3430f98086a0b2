//! # Health Verifier
//!
//! Final verification pass over every dependency. It never stops at the first
//! failure: each dependency gets exactly one entry in the [`HealthReport`].
//!
//! Broker and store checks are single-shot, since both were gated earlier in the
//! run. The application is the slowest to bind its port, so its check goes
//! through the [`Poller`] and is bounded only by the poll policy and the shared
//! cancellation token.

pub mod probe;

pub use probe::ProbeExecutor;

use crate::domain::{Dependency, DependencyKind, HealthEntry, HealthReport};
use crate::framework::{PollPolicy, Poller};
use std::sync::Mutex;
use tracing::{info, instrument, warn};

pub struct HealthVerifier {
    executor: ProbeExecutor,
    poller: Poller,
    app_policy: PollPolicy,
}

impl HealthVerifier {
    pub fn new(executor: ProbeExecutor, poller: Poller, app_policy: PollPolicy) -> Self {
        Self {
            executor,
            poller,
            app_policy,
        }
    }

    /// Checks every dependency in order and returns one entry per dependency.
    #[instrument(skip_all, fields(dependencies = dependencies.len()))]
    pub async fn verify(&self, dependencies: &[Dependency]) -> HealthReport {
        let mut report = HealthReport::new();
        for dependency in dependencies {
            let entry = match dependency.kind {
                DependencyKind::Application => self.poll(dependency).await,
                DependencyKind::Broker | DependencyKind::DocumentStore => {
                    self.check_once(dependency).await
                }
            };
            report.record(entry);
        }
        info!(overall = ?report.overall(), "Health verification finished");
        report
    }

    async fn check_once(&self, dependency: &Dependency) -> HealthEntry {
        match self.executor.check(&dependency.health).await {
            Ok(detail) => {
                info!(dependency = %dependency.name, "Healthy");
                HealthEntry::healthy(&dependency.name, dependency.kind, 1).with_detail(detail)
            }
            Err(reason) => {
                warn!(dependency = %dependency.name, %reason, "Unhealthy");
                HealthEntry::unhealthy(&dependency.name, dependency.kind, 1, reason)
            }
        }
    }

    async fn poll(&self, dependency: &Dependency) -> HealthEntry {
        let executor = &self.executor;
        let probe = &dependency.health;
        let detail = Mutex::new(None);
        let slot = &detail;

        let result = self
            .poller
            .wait_until_ready(&dependency.name, &self.app_policy, move || async move {
                let found = executor.check(probe).await?;
                if let Ok(mut slot) = slot.lock() {
                    *slot = found;
                }
                Ok::<(), String>(())
            })
            .await;

        match result {
            Ok(ready) => {
                let detail = detail.into_inner().ok().flatten();
                HealthEntry::healthy(&dependency.name, dependency.kind, ready.attempts)
                    .with_detail(detail)
            }
            Err(e) => HealthEntry::unhealthy(&dependency.name, dependency.kind, e.attempts(), e.to_string()),
        }
    }
}

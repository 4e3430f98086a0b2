use crate::domain::DependencyKind;
use serde::Serialize;

/// Result of a single health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "lowercase")]
pub enum CheckOutcome {
    Healthy,
    Unhealthy(String),
}

impl CheckOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, CheckOutcome::Healthy)
    }
}

/// Report line for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthEntry {
    pub dependency: String,
    pub kind: DependencyKind,
    pub outcome: CheckOutcome,
    /// Probe invocations this check needed.
    pub attempts: u32,
    /// Extra information reported by the dependency itself, if any.
    pub detail: Option<String>,
}

impl HealthEntry {
    pub fn healthy(dependency: impl Into<String>, kind: DependencyKind, attempts: u32) -> Self {
        Self {
            dependency: dependency.into(),
            kind,
            outcome: CheckOutcome::Healthy,
            attempts,
            detail: None,
        }
    }

    pub fn unhealthy(
        dependency: impl Into<String>,
        kind: DependencyKind,
        attempts: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            dependency: dependency.into(),
            kind,
            outcome: CheckOutcome::Unhealthy(reason.into()),
            attempts,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }
}

/// Aggregate outcome of a [`HealthReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Overall {
    Healthy,
    Degraded,
}

/// Terminal artifact of a run: one entry per dependency, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    entries: Vec<HealthEntry>,
}

impl HealthReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any earlier entry for the same dependency.
    ///
    /// Entries are keyed by name and kind, so a broker and a store sharing a
    /// container name still get one entry each.
    pub fn record(&mut self, entry: HealthEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.dependency == entry.dependency && e.kind == entry.kind)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[HealthEntry] {
        &self.entries
    }

    /// Entry for a name and kind. Unlike [`get`](Self::get), this is exact
    /// when names collide.
    pub fn find(&self, dependency: &str, kind: DependencyKind) -> Option<&HealthEntry> {
        self.entries
            .iter()
            .find(|e| e.dependency == dependency && e.kind == kind)
    }

    pub fn get(&self, dependency: &str) -> Option<&HealthEntry> {
        self.entries.iter().find(|e| e.dependency == dependency)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn overall(&self) -> Overall {
        if !self.entries.is_empty() && self.entries.iter().all(|e| e.outcome.is_healthy()) {
            Overall::Healthy
        } else {
            Overall::Degraded
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall() == Overall::Healthy
    }

    pub fn failures(&self) -> impl Iterator<Item = &HealthEntry> {
        self.entries.iter().filter(|e| !e.outcome.is_healthy())
    }
}

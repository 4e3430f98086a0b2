use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of infrastructure a [`Dependency`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    Broker,
    DocumentStore,
    Application,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyKind::Broker => "broker",
            DependencyKind::DocumentStore => "document-store",
            DependencyKind::Application => "application",
        };
        f.write_str(label)
    }
}

/// How a dependency is probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Run `program args...` inside the named container; exit 0 means ready.
    Exec {
        container: String,
        program: String,
        args: Vec<String>,
    },
    /// `GET url`; a 2xx status means ready.
    Http { url: String },
}

/// One piece of infrastructure the stack needs.
///
/// Identity is the `name`. The set is fixed for a run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub kind: DependencyKind,
    /// Gate used while bringing the stack up.
    pub readiness: Probe,
    /// Check used in the final verification pass.
    pub health: Probe,
}

impl Dependency {
    pub fn new(name: impl Into<String>, kind: DependencyKind, readiness: Probe, health: Probe) -> Self {
        Self {
            name: name.into(),
            kind,
            readiness,
            health,
        }
    }
}

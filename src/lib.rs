//! # Stack Bootstrap
//!
//! > **Bring a wallet-scoring stack from "nothing running" to "verified healthy".**
//!
//! This crate starts a compose-defined stack (application server, message broker,
//! document store), waits for each dependency to actually accept work, creates the
//! broker channels the application needs, and finishes with a health report that
//! has one entry per dependency.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Readiness, not "started"
//!
//! A container that is running is not a broker that accepts admin commands. Every
//! gate in this crate is a real probe polled until it passes. The two fixed
//! grace delays are kept, but they are labelled as what they are: settle timers
//! with no guarantee.
//!
//! ### One place decides
//!
//! Runners, pollers and clients only return structured results. The
//! [`StackSequencer`](lifecycle::StackSequencer) is the single place that turns a
//! result into "abort", "log and continue" or "put it in the report".
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: run commands, poll probes, issue HTTP probes. Knows nothing about brokers.
//! - **Key items**: [`CommandRunner`](framework::CommandRunner), [`Poller`](framework::Poller), [`HttpProbe`](framework::HttpProbe).
//!
//! ### 2. The Model ([`domain`])
//! - **Role**: dependencies, channels and the health report.
//!
//! ### 3. The Interface ([`clients`])
//! - **Role**: typed wrappers that know the exact command lines of the runtime, the broker admin tool, the store shell and the application's HTTP API.
//! - **Key items**: [`RuntimeClient`](clients::RuntimeClient), [`BrokerClient`](clients::BrokerClient).
//!
//! ### 4. The Core ([`provisioner`], [`health`])
//! - **Role**: idempotent channel creation and the final verification pass.
//!
//! ### 5. The Orchestrator ([`lifecycle`])
//! - **Role**: configuration, the state machine, report rendering and tracing setup.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Bring the stack up, give up on any single wait after 5 minutes
//! stack-bootstrap --timeout 5m --non-interactive
//!
//! # Same, with every spawned command logged
//! stack-bootstrap --verbose
//! ```
//!
//! Exit codes: `0` all healthy, `1` fatal abort (preflight, bring-up, broker,
//! provisioning), `2` some health checks failed, `130` interrupted.
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```
//!
//! See the [`framework::mock`] module for the scripted runner the tests use instead
//! of a container runtime.

pub mod clients;
pub mod domain;
pub mod framework;
pub mod health;
pub mod lifecycle;
pub mod provisioner;

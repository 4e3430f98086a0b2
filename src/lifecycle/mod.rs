//! # Lifecycle
//!
//! Orchestration layer: wires the clients together and drives one bootstrap run
//! from "nothing running" to a rendered health report.
//!
//! # Main Components
//!
//! - [`StackConfig`] - every knob of a run, with defaults matching the application stack
//! - [`StackSequencer`] - the state machine that owns ordering and failure classification
//! - [`render_report`] - the operator-facing summary
//! - [`pause_until`] - the exit prompt, cut short by an interrupt
//! - [`setup_tracing`] - structured logging for the binary

pub mod config;
pub mod prompt;
pub mod render;
pub mod sequencer;
pub mod tracing;

pub use config::*;
pub use prompt::*;
pub use render::*;
pub use sequencer::*;
pub use self::tracing::setup_tracing;

//! Generic engine for driving external processes.
//!
//! This module knows nothing about brokers, stores or compose files. It provides
//! the building blocks the rest of the crate composes:
//!
//! # Main Components
//!
//! - [`CommandRunner`] / [`TokioRunner`] - run one command on the host or inside a container
//! - [`Poller`] - retry a probe until it succeeds, with timeouts and cancellation
//! - [`HttpProbe`] / [`ReqwestProbe`] - the HTTP seam used for the application server
//! - [`FrameworkError`] - engine-level errors
//!
//! # Testing
//!
//! See [`mock`] module for scripted runners that replace the container runtime in tests.

pub mod error;
pub mod http;
pub mod mock;
pub mod poller;
pub mod runner;

// Re-export core types for convenience
pub use error::*;
pub use http::*;
pub use poller::*;
pub use runner::*;

//! # Observability & Tracing
//!
//! [`setup_tracing`] initializes structured logging once for the whole run.
//!
//! The subscriber uses a compact format without module paths
//! (`with_target(false)`). Every sequencer state runs inside a `state` span, so a
//! retry notice shows which step issued it:
//!
//! ```text
//! INFO state{state=BrokerReadinessPoll}: Entering state
//! WARN state{state=BrokerReadinessPoll}: Not ready yet, retrying in 5s probe="kafka" attempt=1 reason="exit 1: TimeoutException"
//! INFO state{state=BrokerReadinessPoll}: Ready probe="kafka" attempts=2 elapsed=5.01s
//! ```
//!
//! ## Levels
//!
//! `RUST_LOG` wins when set. Otherwise the level is `info`, or `debug` with
//! `--verbose`, which adds every spawned command line and each probe attempt.
//!
//! ```bash
//! RUST_LOG=stack_bootstrap::framework=debug stack-bootstrap --non-interactive
//! ```

use tracing_subscriber::EnvFilter;

pub fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // State spans carry the context; module paths are noise
        .compact()
        .init();
}

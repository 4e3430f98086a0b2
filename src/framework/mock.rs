//! # Mock Framework
//!
//! Utilities for testing the bootstrapper without a container runtime.
//!
//! [`MockRunner`] stands in for [`CommandRunner`] and [`MockHttp`] for
//! [`HttpProbe`]. Both work the same way: you queue expectations with a fluent
//! builder, hand the mock to the code under test, and call `verify()` at the end
//! to make sure every expectation was consumed.
//!
//! An expectation matches a call when its pattern is a substring of the rendered
//! command line (see [`command_line`]) or of the URL. Among matching
//! expectations the oldest one answers, so repeated probes are scripted simply by
//! queueing several responses for the same pattern:
//!
//! ```
//! use stack_bootstrap::framework::mock::MockRunner;
//! use stack_bootstrap::framework::{CommandRunner, Target};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mock = MockRunner::new();
//! mock.expect("kafka-topics").times(2).return_exit(1, "broker not available");
//! mock.expect("kafka-topics").return_ok("wallet-transactions\n");
//!
//! let runner = mock.runner();
//! let list = vec!["--list".to_string()];
//! let target = Target::container("kafka");
//! assert!(!runner.run(&target, "kafka-topics", &list).await.success());
//! assert!(!runner.run(&target, "kafka-topics", &list).await.success());
//! assert!(runner.run(&target, "kafka-topics", &list).await.success());
//!
//! mock.verify();
//! assert_eq!(mock.count("kafka-topics"), 3);
//! # }
//! ```
//!
//! Calls nothing matches panic, which fails the test at the offending command.
//! Every call is also written to a journal, so tests can assert that something
//! did *not* happen (for example, that no `compose up` ran after a failed
//! preflight).

use crate::framework::http::{HttpProbe, HttpResponse};
use crate::framework::runner::{command_line, CommandOutput, CommandRunner, Target};
use crate::framework::FrameworkError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Expectation<R> {
    pattern: String,
    response: R,
}

type Queue<R> = Arc<Mutex<VecDeque<Expectation<R>>>>;

fn take_matching<R>(queue: &Queue<R>, subject: &str) -> Option<R> {
    let mut exps = queue.lock().unwrap();
    let index = exps.iter().position(|e| subject.contains(&e.pattern))?;
    exps.remove(index).map(|e| e.response)
}

fn assert_drained<R>(queue: &Queue<R>, kind: &str) {
    let exps = queue.lock().unwrap();
    if !exps.is_empty() {
        let pending: Vec<&str> = exps.iter().map(|e| e.pattern.as_str()).collect();
        panic!(
            "Not all {} expectations were met. {} remaining: {:?}",
            kind,
            exps.len(),
            pending
        );
    }
}

// =============================================================================
// COMMAND RUNNER MOCK
// =============================================================================

/// Scripted [`CommandRunner`].
#[derive(Clone, Default)]
pub struct MockRunner {
    expectations: Queue<CommandOutput>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a shareable runner backed by this mock.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::new(self.clone())
    }

    /// Expects a command whose rendered line contains `pattern`.
    pub fn expect(&self, pattern: impl Into<String>) -> CommandExpectationBuilder {
        CommandExpectationBuilder {
            pattern: pattern.into(),
            times: 1,
            expectations: self.expectations.clone(),
        }
    }

    /// Every command line seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// Number of calls whose command line contains `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        assert_drained(&self.expectations, "command");
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, target: &Target, program: &str, args: &[String]) -> CommandOutput {
        let line = command_line(target, program, args);
        self.journal.lock().unwrap().push(line.clone());
        match take_matching(&self.expectations, &line) {
            Some(output) => output,
            None => panic!("Unexpected command: {}", line),
        }
    }
}

/// Builder for command expectations.
pub struct CommandExpectationBuilder {
    pattern: String,
    times: usize,
    expectations: Queue<CommandOutput>,
}

impl CommandExpectationBuilder {
    /// Queues the response `n` times instead of once.
    pub fn times(mut self, n: usize) -> Self {
        self.times = n;
        self
    }

    /// Sets the expectation to exit 0 with the given stdout.
    pub fn return_ok(self, stdout: impl Into<String>) {
        let output = CommandOutput::ok(stdout);
        self.push(output);
    }

    /// Sets the expectation to exit with `exit_code` and the given stderr.
    pub fn return_exit(self, exit_code: i32, stderr: impl Into<String>) {
        let output = CommandOutput::new(exit_code, "", stderr);
        self.push(output);
    }

    /// Sets the expectation to return a fully specified output.
    pub fn return_output(self, output: CommandOutput) {
        self.push(output);
    }

    fn push(self, output: CommandOutput) {
        let mut exps = self.expectations.lock().unwrap();
        for _ in 0..self.times {
            exps.push_back(Expectation {
                pattern: self.pattern.clone(),
                response: output.clone(),
            });
        }
    }
}

// =============================================================================
// HTTP MOCK
// =============================================================================

/// Scripted [`HttpProbe`].
#[derive(Clone, Default)]
pub struct MockHttp {
    expectations: Queue<Result<HttpResponse, FrameworkError>>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl MockHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> Arc<dyn HttpProbe> {
        Arc::new(self.clone())
    }

    /// Expects a `GET` whose URL contains `pattern`.
    pub fn expect_get(&self, pattern: impl Into<String>) -> HttpExpectationBuilder {
        HttpExpectationBuilder {
            pattern: pattern.into(),
            times: 1,
            expectations: self.expectations.clone(),
        }
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }

    pub fn verify(&self) {
        assert_drained(&self.expectations, "HTTP");
    }
}

#[async_trait]
impl HttpProbe for MockHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, FrameworkError> {
        self.journal.lock().unwrap().push(url.to_string());
        match take_matching(&self.expectations, url) {
            Some(response) => response,
            None => panic!("Unexpected GET {}", url),
        }
    }
}

/// Builder for HTTP expectations.
pub struct HttpExpectationBuilder {
    pattern: String,
    times: usize,
    expectations: Queue<Result<HttpResponse, FrameworkError>>,
}

impl HttpExpectationBuilder {
    pub fn times(mut self, n: usize) -> Self {
        self.times = n;
        self
    }

    /// Sets the expectation to answer with `status` and `body`.
    pub fn return_status(self, status: u16, body: impl Into<String>) {
        let response = HttpResponse::new(status, body);
        self.push(Ok(response));
    }

    /// Sets the expectation to fail at the transport level (connection refused).
    pub fn return_refused(self) {
        let error = FrameworkError::Http {
            url: self.pattern.clone(),
            reason: "connection refused".to_string(),
        };
        self.push(Err(error));
    }

    fn push(self, response: Result<HttpResponse, FrameworkError>) {
        let mut exps = self.expectations.lock().unwrap();
        for _ in 0..self.times {
            exps.push_back(Expectation {
                pattern: self.pattern.clone(),
                response: response.clone(),
            });
        }
    }
}

use crate::clients::AppHealth;
use crate::domain::Probe;
use crate::framework::{CommandRunner, HttpProbe, Target};
use std::sync::Arc;
use tracing::debug;

/// Runs a single [`Probe`] once and says whether it passed.
///
/// `Ok` carries optional detail reported by the dependency (the parsed health
/// body for HTTP probes). `Err` carries a one-line reason.
#[derive(Clone)]
pub struct ProbeExecutor {
    runner: Arc<dyn CommandRunner>,
    http: Arc<dyn HttpProbe>,
}

impl ProbeExecutor {
    pub fn new(runner: Arc<dyn CommandRunner>, http: Arc<dyn HttpProbe>) -> Self {
        Self { runner, http }
    }

    pub async fn check(&self, probe: &Probe) -> Result<Option<String>, String> {
        match probe {
            Probe::Exec {
                container,
                program,
                args,
            } => {
                let output = self
                    .runner
                    .run(&Target::container(container.as_str()), program, args)
                    .await;
                if output.success() {
                    Ok(None)
                } else {
                    Err(format!("exit {}: {}", output.exit_code, output.last_line()))
                }
            }
            Probe::Http { url } => match self.http.get(url).await {
                Ok(response) if response.is_success() => {
                    let detail = AppHealth::parse(&response.body).map(|h| h.to_string());
                    debug!(url, status = response.status, ?detail, "HTTP probe passed");
                    Ok(detail)
                }
                Ok(response) => Err(format!("HTTP {}", response.status)),
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{MockHttp, MockRunner};

    #[tokio::test]
    async fn test_exec_probe_reports_exit_code() {
        let runner = MockRunner::new();
        runner.expect("exec mongodb mongosh").return_exit(1, "MongoNetworkError: connect ECONNREFUSED");
        let executor = ProbeExecutor::new(runner.runner(), MockHttp::new().probe());

        let probe = Probe::Exec {
            container: "mongodb".into(),
            program: "mongosh".into(),
            args: vec!["--quiet".into()],
        };
        assert_eq!(
            executor.check(&probe).await,
            Err("exit 1: MongoNetworkError: connect ECONNREFUSED".to_string())
        );
    }

    #[tokio::test]
    async fn test_http_probe_extracts_detail() {
        let http = MockHttp::new();
        http.expect_get("/api/v1/health").return_status(503, "");
        http.expect_get("/api/v1/health")
            .return_status(200, r#"{"status":"healthy","kafka_status":"connected"}"#);
        let executor = ProbeExecutor::new(MockRunner::new().runner(), http.probe());

        let probe = Probe::Http {
            url: "http://localhost:8000/api/v1/health".into(),
        };
        assert_eq!(executor.check(&probe).await, Err("HTTP 503".to_string()));
        assert_eq!(
            executor.check(&probe).await,
            Ok(Some("status=healthy kafka=connected".to_string()))
        );
    }
}

use crate::domain::{Dependency, DependencyKind, Probe};
use crate::framework::{FrameworkError, HttpProbe};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const HEALTH_PATH: &str = "/api/v1/health";
pub const STATS_PATH: &str = "/api/v1/stats";
pub const DOCS_PATH: &str = "/docs";

/// Body of the application's health endpoint. Every field is optional so an
/// older or partial payload still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppHealth {
    pub status: String,
    pub version: Option<String>,
    pub kafka_status: Option<String>,
    pub mongodb_status: Option<String>,
}

impl AppHealth {
    /// Parses a health body; anything that is not the expected JSON yields `None`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

impl fmt::Display for AppHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status={}", self.status)?;
        if let Some(kafka) = &self.kafka_status {
            write!(f, " kafka={}", kafka)?;
        }
        if let Some(mongodb) = &self.mongodb_status {
            write!(f, " mongodb={}", mongodb)?;
        }
        Ok(())
    }
}

/// Processing counters served by the application's stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppStats {
    pub total_wallets_processed: u64,
    pub successful_wallets: u64,
    pub failed_wallets: u64,
    pub average_processing_time_ms: f64,
    pub last_processed_wallet: Option<String>,
    pub uptime_seconds: f64,
}

/// Client for the application server's HTTP surface.
#[derive(Clone)]
pub struct AppClient {
    http: Arc<dyn HttpProbe>,
    base_url: String,
}

impl AppClient {
    pub fn new(http: Arc<dyn HttpProbe>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url, HEALTH_PATH)
    }

    pub fn stats_url(&self) -> String {
        format!("{}{}", self.base_url, STATS_PATH)
    }

    pub fn docs_url(&self) -> String {
        format!("{}{}", self.base_url, DOCS_PATH)
    }

    /// The application as a [`Dependency`], probed over its health endpoint.
    pub fn dependency(&self) -> Dependency {
        let probe = Probe::Http {
            url: self.health_url(),
        };
        Dependency::new("app", DependencyKind::Application, probe.clone(), probe)
    }

    /// Fetches the processing counters. Non-2xx and undecodable bodies are errors.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<AppStats, FrameworkError> {
        let url = self.stats_url();
        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(FrameworkError::Http {
                url,
                reason: format!("status {}", response.status),
            });
        }
        let stats = serde_json::from_str(&response.body).map_err(|e| FrameworkError::Decode {
            url,
            reason: e.to_string(),
        })?;
        debug!(?stats, "Fetched stats");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::mock::{MockHttp, MockRunner};
    use crate::health::ProbeExecutor;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let mock = MockHttp::new();
        let client = AppClient::new(mock.probe(), "http://localhost:8000/");
        assert_eq!(client.health_url(), "http://localhost:8000/api/v1/health");
        assert_eq!(client.docs_url(), "http://localhost:8000/docs");
        assert_eq!(
            client.dependency().health,
            Probe::Http {
                url: "http://localhost:8000/api/v1/health".into()
            }
        );
    }

    #[test]
    fn test_parse_health_body() {
        let body = r#"{"status":"healthy","timestamp":"2024-01-01T00:00:00","version":"1.0.0",
            "environment":"development","kafka_status":"connected","mongodb_status":"connected"}"#;
        let health = AppHealth::parse(body).unwrap();
        assert_eq!(health.to_string(), "status=healthy kafka=connected mongodb=connected");
        assert!(AppHealth::parse("OK").is_none());
    }

    #[tokio::test]
    async fn test_dependency_checks_health_endpoint() {
        let mock = MockHttp::new();
        mock.expect_get("http://localhost:8000/api/v1/health").return_status(503, "starting");
        mock.expect_get("http://localhost:8000/api/v1/health")
            .return_status(200, r#"{"status":"healthy"}"#);

        let client = AppClient::new(mock.probe(), "http://localhost:8000");
        let executor = ProbeExecutor::new(MockRunner::new().runner(), mock.probe());
        let health = client.dependency().health;

        assert_eq!(executor.check(&health).await, Err("HTTP 503".to_string()));
        assert_eq!(executor.check(&health).await, Ok(Some("status=healthy".to_string())));
        mock.verify();
    }

    #[tokio::test]
    async fn test_stats_decodes_counters() {
        let mock = MockHttp::new();
        mock.expect_get("/api/v1/stats").return_status(
            200,
            r#"{"total_wallets_processed":12,"successful_wallets":10,"failed_wallets":2,
                "average_processing_time_ms":41.5,"last_processed_wallet":"0xabc","uptime_seconds":30.0}"#,
        );

        let client = AppClient::new(mock.probe(), "http://localhost:8000");
        let stats = client.stats().await.unwrap();

        assert_eq!(stats.total_wallets_processed, 12);
        assert_eq!(stats.failed_wallets, 2);
        assert_eq!(stats.last_processed_wallet.as_deref(), Some("0xabc"));
        mock.verify();
    }

    #[tokio::test]
    async fn test_stats_rejects_bad_body() {
        let mock = MockHttp::new();
        mock.expect_get("/api/v1/stats").return_status(200, "<html>");
        mock.expect_get("/api/v1/stats").return_status(500, "");

        let client = AppClient::new(mock.probe(), "http://localhost:8000");
        assert!(matches!(client.stats().await, Err(FrameworkError::Decode { .. })));
        assert!(matches!(client.stats().await, Err(FrameworkError::Http { .. })));
        mock.verify();
    }
}

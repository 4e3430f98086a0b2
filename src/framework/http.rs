//! # HTTP Probe
//!
//! The application server is the one dependency probed over HTTP instead of a
//! command. [`HttpProbe`] is the seam; [`ReqwestProbe`] is the real client and
//! [`MockHttp`](crate::framework::mock::MockHttp) the test double.

use crate::framework::FrameworkError;
use async_trait::async_trait;
use std::time::Duration;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues `GET` requests. Transport failures are `Err`; any HTTP status is `Ok`.
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FrameworkError>;
}

/// [`HttpProbe`] backed by `reqwest`, with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new(request_timeout: Duration) -> Result<Self, FrameworkError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| FrameworkError::Http {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn get(&self, url: &str) -> Result<HttpResponse, FrameworkError> {
        let transport = |e: reqwest::Error| FrameworkError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;
        Ok(HttpResponse { status, body })
    }
}

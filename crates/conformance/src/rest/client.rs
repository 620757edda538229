//! HTTP boundary of the resource suite.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so the async
//! runtime is never blocked. Error statuses are ordinary responses here: the
//! scenarios assert on them.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::RestConfig;
use crate::error::ConformanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status and raw body of one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Decode the body as JSON.
    pub fn json<D: DeserializeOwned>(&self) -> Result<D, ConformanceError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ConformanceError::Http(format!(
                "cannot decode response body: {e}; body: {}",
                self.body
            ))
        })
    }
}

/// The resource endpoints under test.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Root every path is resolved against, without a trailing slash.
    fn base_url(&self) -> &str;

    /// Send `body` as JSON, or no body at all when `None`. `path` starts
    /// with `/` and may carry a query string.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse, ConformanceError>;
}

/// [`ResourceClient`] over a real HTTP connection.
#[derive(Clone, Debug)]
pub struct HttpResourceClient {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpResourceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fails with [`ConformanceError::Config`] when no base URL is set.
    pub fn from_config(config: &RestConfig) -> Result<Self, ConformanceError> {
        Ok(Self::new(config.require_base_url()?, config.timeout()))
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpResponse, ConformanceError> {
        let url = format!("{}{}", self.base_url, path);
        let agent = self.agent.clone();
        let body = body.cloned();
        debug!(%method, %url, with_body = body.is_some(), "http request");

        let target = url.clone();
        let response = tokio::task::spawn_blocking(move || exchange(&agent, method, &target, body))
            .await
            .map_err(|e| ConformanceError::Http(format!("task join error: {e}")))??;

        debug!(%method, %url, status = response.status, "http response");
        Ok(response)
    }
}

fn exchange(
    agent: &ureq::Agent,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<HttpResponse, ConformanceError> {
    let transport = |e: ureq::Error| ConformanceError::Http(format!("{method} {url}: {e}"));

    let response = match method {
        Method::Get => agent.get(url).header("Accept", "application/json").call(),
        Method::Delete => agent.delete(url).header("Accept", "application/json").call(),
        Method::Post | Method::Put | Method::Patch => {
            let request = match method {
                Method::Post => agent.post(url),
                Method::Put => agent.put(url),
                _ => agent.patch(url),
            }
            .header("Accept", "application/json");
            match &body {
                Some(json) => request.send_json(json),
                None => request.send_empty(),
            }
        }
    }
    .map_err(transport)?;

    let status = response.status().as_u16();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(transport)?;
    Ok(HttpResponse { status, body })
}

/// Fail with [`ConformanceError::HttpStatusMismatch`] unless `response` has
/// status `expected`.
pub(crate) fn ensure_status(
    context: &str,
    expected: u16,
    response: &HttpResponse,
) -> Result<(), ConformanceError> {
    if response.status == expected {
        Ok(())
    } else {
        Err(ConformanceError::HttpStatusMismatch {
            context: context.to_string(),
            expected,
            actual: response.status,
            body: response.body.clone(),
        })
    }
}

//! reqwest implementation of the core client traits

use std::collections::BTreeMap;
use std::error::Error as _;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use taskbench_core::{
    ClientFactory, HttpClient, HttpMethod, HttpResponse, RenderedRequest, TransportError,
};

use crate::config::ClientConfig;

/// HTTP client backed by one `reqwest::Client` (and its connection pool)
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReqwestClient {
    /// Build a client from `config`.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        config
            .validate()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.clone())
            .default_headers(header_map(&config.default_headers)?)
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.config.timeout)
        } else if err.is_connect() {
            TransportError::Connect(error_chain(&err))
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(error_chain(&err))
        } else {
            TransportError::Request(error_chain(&err))
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn execute(&self, request: &RenderedRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(to_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.config.timeout)
            } else {
                TransportError::Body(error_chain(&e))
            }
        })?;

        Ok(HttpResponse::from_parts(status, headers, body))
    }
}

/// Creates a separate [`ReqwestClient`] per virtual user
///
/// Each virtual user gets its own connection pool, so one user's keep-alive
/// connections never serve another's requests.
#[derive(Debug, Clone)]
pub struct ReqwestClientFactory {
    config: ClientConfig,
}

impl ReqwestClientFactory {
    /// Create a factory; the configuration is validated up front.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        config
            .validate()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self { config })
    }

    /// Configuration every client is created with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl ClientFactory for ReqwestClientFactory {
    fn name(&self) -> &str {
        "reqwest"
    }

    fn create(&self, runner_id: usize) -> Result<Arc<dyn HttpClient>, TransportError> {
        tracing::trace!(runner_id, "Creating HTTP client");
        Ok(Arc::new(ReqwestClient::new(self.config.clone())?))
    }
}

fn to_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Config(format!("invalid header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            TransportError::Config(format!("invalid header value for `{name}`: {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// reqwest hides the interesting part (e.g. "Connection refused") in sources
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

//! Mock clients shared by the runner and scheduler tests

use crate::response::HttpResponse;
use crate::scenario::{Expectation, Extraction, Scenario, ScenarioStep};
use crate::template::{HttpMethod, RenderedRequest, RequestTemplate};
use crate::traits::{ClientFactory, HttpClient, TransportError};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Responder =
    Arc<dyn Fn(&RenderedRequest, usize) -> Result<HttpResponse, TransportError> + Send + Sync>;

// ============================================================================
// Mock HttpClient
// ============================================================================

/// Clones share call counters and the request log
#[derive(Clone)]
pub(crate) struct MockHttpClient {
    responder: Responder,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RenderedRequest>>>,
}

impl MockHttpClient {
    fn with_responder(
        responder: impl Fn(&RenderedRequest, usize) -> Result<HttpResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always answer with `status` and `body`
    pub(crate) fn ok(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::with_responder(move |_, _| Ok(HttpResponse::new(status, body.clone())))
    }

    /// Always fail with `error`
    pub(crate) fn failing(error: TransportError) -> Self {
        Self::with_responder(move |_, _| Err(error.clone()))
    }

    /// Panic on every call
    pub(crate) fn panicking() -> Self {
        Self::with_responder(|_, _| panic!("simulated client bug"))
    }

    /// POST creates a task with id `100 + n`; GET echoes the id from the URL
    pub(crate) fn task_api() -> Self {
        Self::with_responder(|request, call| match request.method {
            HttpMethod::Post => Ok(HttpResponse::new(
                200,
                format!(r#"{{"id": {}}}"#, 100 + call),
            )),
            _ => {
                let id = request.url.rsplit('/').next().unwrap_or_default();
                Ok(HttpResponse::new(
                    200,
                    format!(r#"{{"id": {id}, "title": "t"}}"#),
                ))
            }
        })
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<RenderedRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn execute(&self, request: &RenderedRequest) -> Result<HttpResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        (self.responder)(request, call)
    }
}

// ============================================================================
// Mock ClientFactory
// ============================================================================

pub(crate) struct MockClientFactory {
    client: Option<MockHttpClient>,
    created: AtomicUsize,
}

impl MockClientFactory {
    /// Every runner gets a clone of `client`
    pub(crate) fn new(client: MockHttpClient) -> Self {
        Self {
            client: Some(client),
            created: AtomicUsize::new(0),
        }
    }

    /// `create` always fails
    pub(crate) fn broken() -> Self {
        Self {
            client: None,
            created: AtomicUsize::new(0),
        }
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockClientFactory {
    fn name(&self) -> &str {
        "mock"
    }

    fn create(&self, _runner_id: usize) -> Result<Arc<dyn HttpClient>, TransportError> {
        let client = self
            .client
            .clone()
            .ok_or_else(|| TransportError::Config("no client available".into()))?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(client))
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// POST a task, check it, capture `id`, then GET it back
pub(crate) fn add_and_get_scenario() -> Scenario {
    Scenario::new("simple add task and query")
        .variable("base_url", "http://localhost:8000")
        .step(
            ScenarioStep::new(
                "add task",
                RequestTemplate::post("{{base_url}}/api/v1/task")
                    .header("Content-Type", "application/json")
                    .body(r#"{"title":"t"}"#),
            )
            .expect(Expectation::status(200))
            .expect(Expectation::json_field("id"))
            .extract(Extraction::json("id", "id")),
        )
        .step(ScenarioStep::new(
            "get task",
            RequestTemplate::get("{{base_url}}/api/v1/task/{{id}}"),
        ))
}

/// Single GET step
pub(crate) fn single_get_scenario() -> Scenario {
    Scenario::new("single get").step(ScenarioStep::new(
        "get",
        RequestTemplate::get("http://localhost:8000/api/v1/tasks"),
    ))
}

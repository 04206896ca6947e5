//! Test helpers for code that dispatches hooks.
//!
//! Provides a recording [`StubBackend`], a [`CountingStopHandle`], a
//! tracing [`LogCapture`] layer, and an axum-backed [`MockHttpServer`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use bytes::Bytes;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use tushub_core::traits::StopUpload;
use tushub_core::{AppError, AppResult, HookEvent, HookType};

use crate::backend::{HookBackend, HookOutcome};
use crate::error::HookError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One recorded backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCall {
    /// Hook that was invoked.
    pub hook: HookType,
    /// Upload the event referred to.
    pub upload_id: String,
    /// Whether output capture was requested.
    pub capture_output: bool,
}

/// Backend that records every invocation and returns a canned outcome.
#[derive(Debug, Default)]
pub struct StubBackend {
    output: Bytes,
    return_code: i32,
    error: Option<HookError>,
    fail_setup: bool,
    delays: BTreeMap<HookType, Duration>,
    setups: AtomicUsize,
    calls: Mutex<Vec<StubCall>>,
    completed: AtomicUsize,
    progress: Notify,
}

impl StubBackend {
    /// A backend that succeeds with empty output and return code `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output returned by every invocation.
    pub fn with_output(mut self, output: impl Into<Bytes>) -> Self {
        self.output = output.into();
        self
    }

    /// Return code reported by every invocation.
    pub fn with_return_code(mut self, return_code: i32) -> Self {
        self.return_code = return_code;
        self
    }

    /// Error reported by every invocation.
    pub fn with_error(mut self, error: HookError) -> Self {
        self.error = Some(error);
        self
    }

    /// Makes `setup` fail.
    pub fn with_failing_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    /// Delays every invocation of `hook`.
    pub fn with_delay(mut self, hook: HookType, delay: Duration) -> Self {
        self.delays.insert(hook, delay);
        self
    }

    /// Invocations started so far, in start order.
    pub fn calls(&self) -> Vec<StubCall> {
        lock(&self.calls).clone()
    }

    /// Number of invocations started so far.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Number of invocations of `hook` started so far.
    pub fn calls_for(&self, hook: HookType) -> usize {
        lock(&self.calls).iter().filter(|c| c.hook == hook).count()
    }

    /// Number of invocations that have returned.
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of `setup` calls.
    pub fn setup_count(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` invocations have returned.
    pub async fn wait_for_completed(&self, count: usize, timeout: Duration) -> AppResult<()> {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.progress.notified();
                if self.completed_count() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .map_err(|_| {
            AppError::internal(format!(
                "Timed out waiting for {count} completed invocations, saw {}",
                self.completed_count()
            ))
        })
    }
}

impl StubBackend {
    fn run_setup(&self) -> AppResult<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        if self.fail_setup {
            return Err(AppError::hook("stub setup failed"));
        }
        Ok(())
    }

    async fn respond(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> HookOutcome {
        lock(&self.calls).push(StubCall {
            hook,
            upload_id: event.id().to_string(),
            capture_output,
        });

        if let Some(delay) = self.delays.get(&hook) {
            tokio::time::sleep(*delay).await;
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        self.progress.notify_waiters();

        HookOutcome {
            output: self.output.clone(),
            return_code: self.return_code,
            error: self.error.clone(),
        }
    }
}

#[async_trait]
impl HookBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn setup(&mut self) -> AppResult<()> {
        self.run_setup()
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> HookOutcome {
        self.respond(hook, event, capture_output).await
    }
}

/// Shared stub, so a test keeps a handle after handing the backend over.
#[async_trait]
impl HookBackend for Arc<StubBackend> {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn setup(&mut self) -> AppResult<()> {
        self.run_setup()
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        capture_output: bool,
    ) -> HookOutcome {
        self.respond(hook, event, capture_output).await
    }
}

/// Stop handle counting how often it was triggered.
#[derive(Debug, Default)]
pub struct CountingStopHandle {
    count: AtomicUsize,
}

impl CountingStopHandle {
    /// Creates an untriggered handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stop requests received.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl StopUpload for CountingStopHandle {
    fn stop_upload(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A tracing event captured by [`LogCapture`].
#[derive(Debug, Clone)]
pub struct CapturedLog {
    /// Event level.
    pub level: Level,
    /// All recorded fields, including `message`.
    pub fields: BTreeMap<String, String>,
}

impl CapturedLog {
    /// Value of field `name`, formatted as a string.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Tracing layer collecting every event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Installs a capturing subscriber for the current thread.
    ///
    /// Events are captured until the returned guard is dropped. Tasks must
    /// run on the same thread, as they do on the default test runtime.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    /// All captured events.
    pub fn records(&self) -> Vec<CapturedLog> {
        lock(&self.records).clone()
    }

    /// Captured events whose `event` field equals `name`.
    pub fn events_named(&self, name: &str) -> Vec<CapturedLog> {
        lock(&self.records)
            .iter()
            .filter(|r| r.field("event") == Some(name))
            .cloned()
            .collect()
    }

    /// Number of captured events whose `event` field equals `name`.
    pub fn count(&self, name: &str) -> usize {
        self.events_named(name).len()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        lock(&self.records).push(CapturedLog {
            level: *event.metadata().level(),
            fields: visitor.fields,
        });
    }
}

/// A request received by [`MockHttpServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// Value of header `name` (case insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug)]
struct MockState {
    responses: Vec<(u16, String)>,
    served: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn next_response(&self) -> (StatusCode, String) {
        let served = self.served.fetch_add(1, Ordering::SeqCst);
        let (status, body) = self
            .responses
            .get(served)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or((500, String::new()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
    }
}

async fn record_request(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    lock(&state.requests).push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    });
    state.next_response()
}

/// HTTP server answering every request with a scripted list of responses.
///
/// Once the script is exhausted the last response is repeated.
#[derive(Debug)]
pub struct MockHttpServer {
    addr: std::net::SocketAddr,
    state: Arc<MockState>,
    task: tokio::task::JoinHandle<()>,
}

impl MockHttpServer {
    /// Starts listening on a random local port.
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let state = Arc::new(MockState {
            responses,
            served: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .fallback(record_request)
            .with_state(Arc::clone(&state));
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }
}

impl Drop for MockHttpServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

//! HTTP webhooks.
//!
//! Every invocation is a `POST` of the event JSON to a single endpoint with
//! the hook name in the `Hook-Name` header. Transport errors and `5xx`
//! answers are retried with a constant backoff. Any status of 400 or above
//! is a structured rejection carrying the endpoint's status and body.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, Url};

use tushub_core::{AppError, AppResult, HookEvent, HookType};

use super::{HookBackend, HookOutcome};
use crate::error::HookError;

/// Header carrying the hook name.
pub const HOOK_NAME_HEADER: &str = "Hook-Name";

/// Posts events to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpHook {
    endpoint: String,
    max_retries: u32,
    backoff: Duration,
    timeout: Duration,
    client: Option<Client>,
}

impl HttpHook {
    /// Creates an HTTP hook backend. No connection is made until `setup`.
    pub fn new(
        endpoint: impl Into<String>,
        max_retries: u32,
        backoff: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_retries,
            backoff,
            timeout,
            client: None,
        }
    }

    async fn into_outcome(response: Response) -> HookOutcome {
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return HookOutcome::failure(
                    HookError::Transport(e.to_string()),
                    i32::from(status.as_u16()),
                    Bytes::new(),
                );
            }
        };

        let code = i32::from(status.as_u16());
        if status.as_u16() >= 400 {
            let error = HookError::rejected(
                format!("endpoint returned: {status}"),
                status.as_u16(),
                body.clone(),
            );
            return HookOutcome::failure(error, code, body);
        }

        HookOutcome::success(body, code)
    }
}

#[async_trait]
impl HookBackend for HttpHook {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn setup(&mut self) -> AppResult<()> {
        Url::parse(&self.endpoint).map_err(|e| {
            AppError::configuration(format!("Invalid hook endpoint '{}': {e}", self.endpoint))
        })?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| AppError::hook(format!("Failed to build HTTP client: {e}")))?;

        self.client = Some(client);
        Ok(())
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        _capture_output: bool,
    ) -> HookOutcome {
        let Some(client) = &self.client else {
            return HookOutcome::failure(
                HookError::Transport("backend used before setup".to_string()),
                0,
                Bytes::new(),
            );
        };

        let payload = match event.to_json() {
            Ok(payload) => Bytes::from(payload),
            Err(e) => return HookOutcome::failure(e.into(), 0, Bytes::new()),
        };

        let mut attempt = 0;
        loop {
            let result = client
                .post(&self.endpoint)
                .header(HOOK_NAME_HEADER, hook.as_str())
                .header(CONTENT_TYPE, "application/json")
                .body(payload.clone())
                .send()
                .await;

            let retries_left = attempt < self.max_retries;
            match result {
                Ok(response) if response.status().is_server_error() && retries_left => {
                    tracing::debug!(
                        hook = %hook,
                        status = %response.status(),
                        attempt,
                        "Hook endpoint failed, retrying"
                    );
                }
                Ok(response) => return Self::into_outcome(response).await,
                Err(e) if retries_left => {
                    tracing::debug!(hook = %hook, error = %e, attempt, "Hook request failed, retrying");
                }
                Err(e) => {
                    return HookOutcome::failure(
                        HookError::Transport(e.to_string()),
                        0,
                        Bytes::new(),
                    );
                }
            }

            attempt += 1;
            tokio::time::sleep(self.backoff).await;
        }
    }
}

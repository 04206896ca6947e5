//! gRPC hooks.
//!
//! Calls `v1.HookService/Send` with the event converted to protobuf. The
//! payload of the `Any` in the response becomes the hook output. Calls
//! failing with a transient status are retried with a constant backoff.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::uri::PathAndQuery;
use tonic::codec::ProstCodec;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use tushub_core::{AppError, AppResult, HookEvent, HookType};

use super::{HookBackend, HookOutcome};
use crate::error::HookError;

/// Protobuf messages of the hook service.
pub mod proto {
    use std::collections::HashMap;

    /// Upload snapshot.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Upload {
        #[prost(string, tag = "1")]
        pub id: String,
        #[prost(int64, tag = "2")]
        pub size: i64,
        #[prost(bool, tag = "3")]
        pub size_is_deferred: bool,
        #[prost(int64, tag = "4")]
        pub offset: i64,
        #[prost(map = "string, string", tag = "5")]
        pub meta_data: HashMap<String, String>,
        #[prost(bool, tag = "6")]
        pub is_partial: bool,
        #[prost(bool, tag = "7")]
        pub is_final: bool,
        #[prost(string, repeated, tag = "8")]
        pub partial_uploads: Vec<String>,
        #[prost(map = "string, string", tag = "9")]
        pub storage: HashMap<String, String>,
    }

    /// Request that caused the event.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct HttpRequest {
        #[prost(string, tag = "1")]
        pub method: String,
        #[prost(string, tag = "2")]
        pub uri: String,
        #[prost(string, tag = "3")]
        pub remote_addr: String,
    }

    /// A single hook invocation.
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Hook {
        #[prost(message, optional, tag = "1")]
        pub upload: Option<Upload>,
        #[prost(message, optional, tag = "2")]
        pub http_request: Option<HttpRequest>,
        #[prost(string, tag = "3")]
        pub name: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SendRequest {
        #[prost(message, optional, tag = "1")]
        pub hook: Option<Hook>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct SendResponse {
        #[prost(message, optional, tag = "1")]
        pub response: Option<prost_types::Any>,
    }
}

const SEND_PATH: &str = "/v1.HookService/Send";

/// Calls a remote gRPC hook service.
#[derive(Debug, Clone)]
pub struct GrpcHook {
    endpoint: String,
    max_retries: u32,
    backoff: Duration,
    channel: Option<Channel>,
}

impl GrpcHook {
    /// Creates a gRPC hook backend. The channel is opened by `setup`.
    pub fn new(endpoint: impl Into<String>, max_retries: u32, backoff: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            max_retries,
            backoff,
            channel: None,
        }
    }

    async fn send(
        channel: Channel,
        request: proto::SendRequest,
    ) -> Result<proto::SendResponse, Status> {
        let mut grpc = tonic::client::Grpc::new(channel);
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;

        let codec: ProstCodec<proto::SendRequest, proto::SendResponse> = ProstCodec::default();
        let path = PathAndQuery::from_static(SEND_PATH);
        let response = grpc.unary(tonic::Request::new(request), path, codec).await?;
        Ok(response.into_inner())
    }
}

/// Converts an event into the protobuf invocation of `hook`.
pub fn to_proto(hook: HookType, event: &HookEvent) -> proto::SendRequest {
    let upload = &event.upload;
    let request = &event.http_request;

    proto::SendRequest {
        hook: Some(proto::Hook {
            upload: Some(proto::Upload {
                id: upload.id.clone(),
                size: i64::try_from(upload.size).unwrap_or(i64::MAX),
                size_is_deferred: upload.size_is_deferred,
                offset: i64::try_from(upload.offset).unwrap_or(i64::MAX),
                meta_data: upload.meta_data.clone(),
                is_partial: upload.is_partial,
                is_final: upload.is_final,
                partial_uploads: upload.partial_uploads.clone(),
                storage: upload.storage.clone(),
            }),
            http_request: Some(proto::HttpRequest {
                method: request.method.clone(),
                uri: request.uri.clone(),
                remote_addr: request.remote_addr.clone(),
            }),
            name: hook.as_str().to_string(),
        }),
    }
}

fn is_retryable(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::ResourceExhausted
    )
}

#[async_trait]
impl HookBackend for GrpcHook {
    fn name(&self) -> &'static str {
        "grpc"
    }

    async fn setup(&mut self) -> AppResult<()> {
        let endpoint = Endpoint::from_shared(self.endpoint.clone()).map_err(|e| {
            AppError::configuration(format!("Invalid hook endpoint '{}': {e}", self.endpoint))
        })?;

        self.channel = Some(endpoint.connect_lazy());
        Ok(())
    }

    async fn invoke_hook(
        &self,
        hook: HookType,
        event: &HookEvent,
        _capture_output: bool,
    ) -> HookOutcome {
        let Some(channel) = &self.channel else {
            return HookOutcome::failure(
                HookError::Transport("backend used before setup".to_string()),
                0,
                Bytes::new(),
            );
        };

        let request = to_proto(hook, event);
        let mut attempt = 0;
        loop {
            match Self::send(channel.clone(), request.clone()).await {
                Ok(response) => {
                    let output = response.response.map(|any| any.value).unwrap_or_default();
                    return HookOutcome::success(output, 0);
                }
                Err(status) if is_retryable(status.code()) && attempt < self.max_retries => {
                    tracing::debug!(
                        hook = %hook,
                        code = ?status.code(),
                        attempt,
                        "Hook service unavailable, retrying"
                    );
                }
                Err(status) => {
                    let code = status.code() as i32;
                    let error = HookError::Rpc {
                        code,
                        message: status.message().to_string(),
                    };
                    return HookOutcome::failure(error, code, Bytes::new());
                }
            }

            attempt += 1;
            tokio::time::sleep(self.backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tushub_core::FileInfo;

    #[test]
    fn test_to_proto_copies_upload() {
        let event = HookEvent::new(FileInfo::new("abc", 1024).with_offset(10).with_meta("k", "v"));
        let request = to_proto(HookType::PostReceive, &event);
        let hook = request.hook.expect("hook");

        assert_eq!(hook.name, "post-receive");
        let upload = hook.upload.expect("upload");
        assert_eq!(upload.id, "abc");
        assert_eq!(upload.size, 1024);
        assert_eq!(upload.offset, 10);
        assert_eq!(upload.meta_data.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_retryable_codes() {
        assert!(is_retryable(Code::Unavailable));
        assert!(!is_retryable(Code::InvalidArgument));
    }

    #[tokio::test]
    async fn test_setup_rejects_invalid_endpoint() {
        let mut hook = GrpcHook::new("not a uri", 0, Duration::from_millis(1));
        assert!(hook.setup().await.is_err());
    }
}

use std::fmt::Debug;
use std::time::{Duration, Instant};

use bytes::Bytes;
use prost::Message;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue};
use tonic::{Code, Status};

use crate::grpc::client::GrpcSuite;
use crate::grpc::codec::RawCodec;
use crate::grpc::response::GrpcExchange;
use crate::{E2eError, Result};

/// gRPC 一元调用构建器
///
/// ```no_run
/// # #[derive(Clone, PartialEq, prost::Message)]
/// # struct GetUserRequest { #[prost(string, tag = "1")] id: String }
/// # async fn demo() {
/// use rue2e::{GrpcConfig, grpc::{Code, GrpcSuite}};
///
/// let suite = GrpcSuite::new(GrpcConfig::new("localhost:9090"));
/// suite
///     .call("testpb.TestService/GetUser")
///     .body(GetUserRequest { id: "999".to_string() })
///     .execute()
///     .await
///     .expect_code(Code::NotFound)
///     .expect_error_message("user 999 not found");
/// # }
/// ```
pub struct GrpcRequest {
    suite: GrpcSuite,
    method: String,
    body: Bytes,
    request_debug: Option<String>,
    metadata: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl GrpcRequest {
    pub(crate) fn new(suite: GrpcSuite, method: &str) -> Self {
        Self {
            suite,
            method: method.trim_start_matches('/').to_string(),
            body: Bytes::new(),
            request_debug: None,
            metadata: Vec::new(),
            timeout: None,
        }
    }

    /// 设置请求消息，立即编码为 protobuf
    pub fn body<M: Message + Debug>(mut self, message: M) -> Self {
        self.body = Bytes::from(message.encode_to_vec());
        self.request_debug = Some(format!("{:?}", message));
        self
    }

    /// 追加 metadata，同名 key 可以出现多次
    pub fn metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 执行调用
    ///
    /// 非 OK 的状态（包括超时产生的 `DeadlineExceeded`）会被记录下来供断言使用，
    /// 只有请求本身无法构造时才终止测试。
    pub async fn execute(self) -> GrpcExchange {
        let context = self.suite.context.clone();
        let method = self.method.clone();

        match self.try_execute().await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(error = %e, method = %method, "gRPC call failed");
                context.fail_now(&format!("Failed to execute gRPC call {}: {}", method, e))
            }
        }
    }

    pub async fn try_execute(self) -> Result<GrpcExchange> {
        let path = method_path(&self.method)?;
        let metadata = build_metadata(&self.metadata)?;
        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| self.suite.config.effective_timeout());
        let channel = self.suite.channel()?;

        tracing::debug!(method = %self.method, addr = %self.suite.config.target, ?timeout, "sending gRPC request");

        let mut request = tonic::Request::new(self.body.clone());
        *request.metadata_mut() = metadata;

        let mut grpc = tonic::client::Grpc::new(channel);
        let start = Instant::now();
        let call = async move {
            grpc.ready()
                .await
                .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
            grpc.unary(request, path, RawCodec).await
        };
        let outcome = tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(Status::deadline_exceeded(format!(
                    "deadline exceeded after {:?}",
                    timeout
                )))
            });
        let duration = start.elapsed();

        let (code, message, metadata, body) = match outcome {
            Ok(response) => {
                let (metadata, body, _) = response.into_parts();
                (Code::Ok, String::new(), metadata, body)
            }
            Err(status) => (
                status.code(),
                status.message().to_string(),
                status.metadata().clone(),
                Bytes::new(),
            ),
        };

        tracing::debug!(
            method = %self.method,
            code = ?code,
            bytes = body.len(),
            elapsed_ms = duration.as_millis() as u64,
            "gRPC response captured"
        );
        if code != Code::Ok {
            self.suite.context.log(&format!(
                "gRPC call {} returned {:?}: {}",
                self.method, code, message
            ));
        }

        Ok(GrpcExchange {
            context: self.suite.context.clone(),
            method: self.method,
            target: self.suite.config.target.clone(),
            request_debug: self.request_debug,
            request_metadata: self.metadata,
            code,
            message,
            metadata,
            body,
            duration,
        })
    }
}

/// "pkg.Service/Method" 转换为 HTTP/2 路径
fn method_path(method: &str) -> Result<PathAndQuery> {
    match method.split_once('/') {
        Some((service, name)) if !service.is_empty() && !name.is_empty() && !name.contains('/') => {
            PathAndQuery::try_from(format!("/{}", method))
                .map_err(|e| E2eError::InvalidMethod(format!("{}: {}", method, e)))
        }
        _ => Err(E2eError::InvalidMethod(format!(
            "{}: expected \"package.Service/Method\"",
            method
        ))),
    }
}

fn build_metadata(entries: &[(String, String)]) -> Result<MetadataMap> {
    let mut map = MetadataMap::new();
    for (key, value) in entries {
        let name = key
            .parse::<MetadataKey<Ascii>>()
            .map_err(|e| E2eError::InvalidHeader(format!("{}: {}", key, e)))?;
        let value = value
            .parse::<MetadataValue<Ascii>>()
            .map_err(|e| E2eError::InvalidHeader(format!("{}: {}", key, e)))?;
        map.append(name, value);
    }
    Ok(map)
}

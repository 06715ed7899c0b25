use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use prost::Message;
use tonic::Code;
use tonic::metadata::MetadataMap;

use crate::assertion::{Exchange, ensure_eq};
use crate::context::TestContext;
use crate::utils::Report;

/// 一次 gRPC 调用的捕获结果，成功和失败的状态都会记录
pub struct GrpcExchange {
    pub(crate) context: Arc<dyn TestContext>,
    pub(crate) method: String,
    pub(crate) target: String,
    pub(crate) request_debug: Option<String>,
    pub(crate) request_metadata: Vec<(String, String)>,
    pub(crate) code: Code,
    pub(crate) message: String,
    pub(crate) metadata: MetadataMap,
    pub(crate) body: Bytes,
    pub(crate) duration: Duration,
}

impl GrpcExchange {
    pub fn code(&self) -> Code {
        self.code
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// 状态消息，成功时为空
    pub fn status_message(&self) -> &str {
        &self.message
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// 原始响应字节
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 将响应解码为指定的消息类型
    pub fn decode<M: Message + Default>(&self) -> M {
        self.require_ok();
        M::decode(self.body.clone())
            .unwrap_or_else(|e| self.abort(&format!("Failed to unmarshal response: {}", e)))
    }

    fn require_ok(&self) {
        if !self.is_ok() {
            self.abort(&format!(
                "Cannot validate message: RPC failed with {:?}: {}",
                self.code, self.message
            ));
        }
    }

    pub fn expect_code(self, code: Code) -> Self {
        if self.code != code {
            self.fail(
                "gRPC status code mismatch",
                &format_args!("{:?}", code),
                &format_args!("{:?}", self.code),
            );
        }
        self
    }

    /// 按 protobuf 字段语义比较：响应先解码成 `M`，再与期望消息比较
    pub fn expect_message<M>(self, expected: &M) -> Self
    where
        M: Message + Default + PartialEq + Debug,
    {
        let actual: M = self.decode();
        if &actual != expected {
            self.fail(
                "gRPC response message mismatch",
                &format_args!("{:?}", expected),
                &format_args!("{:?}", actual),
            );
        }
        self
    }

    /// 状态消息精确匹配
    pub fn expect_error_message(self, message: &str) -> Self {
        ensure_eq(&self, "gRPC error message mismatch", message, self.message.as_str());
        self
    }

    pub fn expect_metadata(self, key: &str, value: &str) -> Self {
        let assertion = format!("Metadata mismatch ({})", key);
        match self.metadata.get(key).and_then(|v| v.to_str().ok()) {
            Some(actual) => ensure_eq(&self, &assertion, value, actual),
            None => self.fail(&assertion, &value, &"<missing>"),
        }
        self
    }
}

impl Exchange for GrpcExchange {
    fn context(&self) -> &dyn TestContext {
        self.context.as_ref()
    }

    fn report(&self) -> Report {
        let mut report = Report::new("gRPC")
            .field("Method", &self.method)
            .field("Target", &self.target);

        if let Some(request) = &self.request_debug {
            report = report.field("Request", request);
        }
        report = report.headers(
            "Request Metadata",
            self.request_metadata.iter().map(|(k, v)| (k, v)),
        );

        report = report
            .blank()
            .field("Response", format_args!("{:?}", self.code));
        if !self.is_ok() {
            report = report.field("Message", &self.message);
        }

        let metadata = self.metadata.clone().into_headers();
        report.headers(
            "Response Metadata",
            metadata
                .iter()
                .map(|(k, v)| (k.as_str(), v.to_str().unwrap_or("<binary>"))),
        )
    }
}

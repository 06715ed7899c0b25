use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::assertion::{Exchange, PathError, decode_expected, ensure_eq, ensure_json, lookup_path};
use crate::context::TestContext;
use crate::graphql::types::{GraphQLError, GraphQLResponse};
use crate::http::types::Status;
use crate::payload::Payload;
use crate::utils::{Report, shorten};

/// Query 和 Vars 在诊断信息中的最大长度
const SUMMARY_LEN: usize = 100;

/// 一次 GraphQL 调用的捕获结果
pub struct GraphQLExchange {
    pub(crate) context: Arc<dyn TestContext>,
    pub(crate) endpoint: url::Url,
    pub(crate) query: String,
    pub(crate) variables: Map<String, Value>,
    pub(crate) request_headers: BTreeMap<String, String>,
    pub(crate) status: Status,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) response: GraphQLResponse,
    pub(crate) duration: Duration,
}

impl GraphQLExchange {
    pub fn response(&self) -> &GraphQLResponse {
        &self.response
    }

    pub fn data(&self) -> Option<&Value> {
        self.response.data.as_ref()
    }

    pub fn errors(&self) -> &[GraphQLError] {
        &self.response.errors
    }

    /// HTTP 层的状态码，GraphQL 错误通常仍然是 200
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn request_headers(&self) -> &BTreeMap<String, String> {
        &self.request_headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 将 data 反序列化为指定类型
    pub fn decode_data<T: DeserializeOwned>(&self) -> T {
        let data = self.data().cloned().unwrap_or(Value::Null);
        serde_json::from_value(data)
            .unwrap_or_else(|e| self.abort(&format!("Failed to parse response data: {}", e)))
    }

    fn joined_messages(&self) -> String {
        self.response.messages().join(", ")
    }

    pub fn expect_no_errors(self) -> Self {
        if self.response.has_errors() {
            self.fail("Expected no GraphQL errors", &"no errors", &self.joined_messages());
        }
        self
    }

    pub fn expect_errors(self) -> Self {
        if !self.response.has_errors() {
            self.fail("Expected GraphQL errors", &"at least one error", &"no errors");
        }
        self
    }

    /// 错误列表中任意一条消息完全相等即通过
    pub fn expect_error_message(self, message: &str) -> Self {
        if !self.response.errors.iter().any(|e| e.message == message) {
            self.fail(
                "Expected error message not found",
                &message,
                &self.joined_messages(),
            );
        }
        self
    }

    /// 整个 data 结构相等
    pub fn expect_data(self, expected: impl Into<Payload>) -> Self {
        let expected = decode_expected(&self, &expected.into());
        let actual = self.data().cloned().unwrap_or(Value::Null);
        ensure_json(&self, "GraphQL data mismatch", &expected, &actual);
        self
    }

    /// 按点号路径取出 data 中的值并直接比较
    ///
    /// 叶子值使用 `serde_json::Value` 的相等性，不做数值归一化：
    /// `1` 和 `1.0` 在这里不相等。
    pub fn expect_data_path(self, path: &str, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        let root = self.data().unwrap_or(&Value::Null);

        match lookup_path(root, path) {
            Ok(actual) => {
                if actual != &expected {
                    self.fail(&format!("Data at path {:?} mismatch", path), &expected, actual);
                }
            }
            Err(err @ PathError::NotFound { .. }) => {
                self.fail(&err.to_string(), &expected, &"<missing>")
            }
            Err(err @ PathError::NotTraversable { .. }) => self.abort(&err.to_string()),
        }
        self
    }

    pub fn expect_header(self, key: &str, value: &str) -> Self {
        let assertion = format!("Header mismatch ({})", key);
        match self.headers.get(key).and_then(|v| v.to_str().ok()) {
            Some(actual) => ensure_eq(&self, &assertion, value, actual),
            None => self.fail(&assertion, &value, &"<missing>"),
        }
        self
    }
}

impl Exchange for GraphQLExchange {
    fn context(&self) -> &dyn TestContext {
        self.context.as_ref()
    }

    fn report(&self) -> Report {
        let mut report = Report::new("GraphQL")
            .field("Endpoint", &self.endpoint)
            .field("Query", shorten(&self.query, SUMMARY_LEN));

        if !self.variables.is_empty() {
            let vars = Value::Object(self.variables.clone()).to_string();
            report = report.field("Vars", shorten(&vars, SUMMARY_LEN));
        }

        report = report
            .blank()
            .headers("Request Headers", &self.request_headers)
            .blank()
            .field("Response", self.status)
            .headers(
                "Response Headers",
                self.headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_str().unwrap_or("<invalid utf-8>"))),
            )
            .body("Response Body", &self.body);

        if self.response.has_errors() {
            report = report.blank().line("Errors:");
            for message in self.response.messages() {
                report = report.line(format!("  - {}", message));
            }
        }

        report
    }
}

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use once_cell::sync::OnceCell;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::assertion::{Exchange, decode_expected, ensure_eq, ensure_json};
use crate::context::TestContext;
use crate::http::types::{Method, Status};
use crate::payload::Payload;
use crate::utils::{MAX_BODY_LEN, Report, truncate};

/// 一次 HTTP 调用的捕获结果
///
/// 请求与响应在执行时一次性记录，之后只读。body 的 JSON 解码结果在第一次
/// 使用时缓存。
pub struct HttpExchange {
    pub(crate) context: Arc<dyn TestContext>,
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) url: url::Url,
    pub(crate) request_headers: BTreeMap<String, String>,
    pub(crate) request_body: Vec<u8>,
    pub(crate) status: Status,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) duration: Duration,
    pub(crate) json: OnceCell<Result<Value, String>>,
}

impl HttpExchange {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).and_then(|v| v.to_str().ok())
    }

    pub fn url(&self) -> &url::Url {
        &self.url
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 解码后的 JSON body，解析失败时终止测试
    pub fn body_json(&self) -> &Value {
        let parsed = self
            .json
            .get_or_init(|| serde_json::from_slice(&self.body).map_err(|e| e.to_string()));

        match parsed {
            Ok(value) => value,
            Err(e) => self.abort(&format!(
                "Failed to parse JSON response: {}. Body: {}",
                e,
                truncate(&self.text(), MAX_BODY_LEN)
            )),
        }
    }

    /// 将 body 反序列化为指定类型
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body_json().clone())
            .unwrap_or_else(|e| self.abort(&format!("Failed to decode response body: {}", e)))
    }

    /// 状态码精确匹配
    pub fn expect_status(self, code: u16) -> Self {
        ensure_eq(&self, "Status code mismatch", &Status::new(code), &self.status);
        self
    }

    /// JSON body 结构相等，期望值可以是 JSON 字符串或 `serde_json::Value`
    pub fn expect_json(self, expected: impl Into<Payload>) -> Self {
        let expected = decode_expected(&self, &expected.into());
        ensure_json(&self, "JSON response mismatch", &expected, self.body_json());
        self
    }

    /// 单个响应 header 精确匹配
    pub fn expect_header(self, key: &str, value: &str) -> Self {
        let assertion = format!("Header mismatch ({})", key);
        match self.header(key) {
            Some(actual) => ensure_eq(&self, &assertion, value, actual),
            None => self.fail(&assertion, &value, &"<missing>"),
        }
        self
    }
}

impl Exchange for HttpExchange {
    fn context(&self) -> &dyn TestContext {
        self.context.as_ref()
    }

    fn report(&self) -> Report {
        Report::new("HTTP")
            .line(format!("{} {}", self.method, self.path))
            .field("URL", &self.url)
            .blank()
            .headers("Request Headers", &self.request_headers)
            .body("Request Body", &self.request_body)
            .blank()
            .field("Response", self.status)
            .headers(
                "Response Headers",
                self.headers
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.to_str().unwrap_or("<invalid utf-8>"))),
            )
            .body("Response Body", &self.body)
    }
}

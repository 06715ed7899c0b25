use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::http::client::HttpSuite;
use crate::http::response::HttpExchange;
use crate::http::types::{
    Method, Status, build_header_map, request_headers, resolve_url, set_header,
};
use crate::payload::Payload;
use crate::{E2eError, Result};

/// 单个 HTTP 请求的构建器
///
/// 配置方法按值链式调用，`execute` 消耗构建器并返回只读的 [`HttpExchange`]。
/// 断言只存在于执行结果上，执行前无法断言:
///
/// ```compile_fail
/// # fn demo(suite: rue2e::http::HttpSuite) {
/// suite.get("/health").expect_status(200);
/// # }
/// ```
///
/// ```no_run
/// # async fn demo() {
/// use rue2e::{Config, http::HttpSuite};
///
/// let suite = HttpSuite::new(Config::new("http://localhost:8080"));
/// suite
///     .post("/api/users")
///     .body(r#"{"name": "Alice"}"#)
///     .execute()
///     .await
///     .expect_status(201)
///     .expect_header("Content-Type", "application/json");
/// # }
/// ```
pub struct HttpRequest {
    suite: HttpSuite,
    method: Method,
    path: String,
    body: Option<Payload>,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    timeout: Option<Duration>,
    deferred: Option<E2eError>,
}

impl HttpRequest {
    pub(crate) fn new(suite: HttpSuite, method: Method, path: &str) -> Self {
        Self {
            suite,
            method,
            path: path.to_string(),
            body: None,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            timeout: None,
            deferred: None,
        }
    }

    /// 设置请求体: 字符串原样发送，`serde_json::Value` 序列化为 JSON
    pub fn body(mut self, body: impl Into<Payload>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 序列化任意结构体作为 JSON 请求体，错误推迟到执行时报告
    pub fn json<T: Serialize + ?Sized>(mut self, data: &T) -> Self {
        match Payload::from_serialize(data) {
            Ok(payload) => self.body = Some(payload),
            Err(e) => self.deferred = Some(e),
        }
        self
    }

    /// 同名 header 不区分大小写，后设置的覆盖先设置的
    pub fn header(mut self, key: &str, value: &str) -> Self {
        set_header(&mut self.headers, key, value);
        self
    }

    /// 添加 query 参数，同名参数覆盖
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn authorization(self, value: &str) -> Self {
        self.header("Authorization", value)
    }

    pub fn bearer(self, token: &str) -> Self {
        self.authorization(&format!("Bearer {}", token))
    }

    /// 本次请求的超时，替换套件的默认值；零值表示使用默认值
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 执行请求，任何基础设施错误都会立即终止测试
    pub async fn execute(self) -> HttpExchange {
        let context = self.suite.context.clone();
        let label = format!("{} request to {}", self.method, self.path);

        match self.try_execute().await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(error = %e, "{} failed", label);
                context.fail_now(&format!("Failed to execute {}: {}", label, e))
            }
        }
    }

    /// 与 [`execute`](Self::execute) 相同，但把基础设施错误作为 `Err` 返回
    pub async fn try_execute(self) -> Result<HttpExchange> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let url = resolve_url(&self.suite.config.base_url, &self.path, &self.query)?;
        let request_body = match &self.body {
            Some(body) => body.to_bytes()?,
            None => Vec::new(),
        };
        let sent_headers = request_headers(&self.headers, self.body.is_some());
        let header_map = build_header_map(&sent_headers)?;
        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| self.suite.config.effective_timeout());

        tracing::debug!(method = %self.method, url = %url, ?timeout, "sending HTTP request");

        let mut request = self
            .suite
            .client
            .request(self.method.to_reqwest(), url.clone())
            .headers(header_map)
            .timeout(timeout);
        if self.body.is_some() {
            request = request.body(request_body.clone());
        }

        let start = Instant::now();
        let call = async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            // 响应流只读取一次，之后的断言都使用这份缓存
            let body = response.bytes().await?;
            Ok::<_, E2eError>((status, headers, body))
        };
        let (status, headers, body) = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| E2eError::Timeout(timeout))??;
        let duration = start.elapsed();

        tracing::debug!(
            method = %self.method,
            url = %url,
            status,
            bytes = body.len(),
            elapsed_ms = duration.as_millis() as u64,
            "HTTP response captured"
        );

        Ok(HttpExchange {
            context: self.suite.context,
            method: self.method,
            path: self.path,
            url,
            request_headers: sent_headers,
            request_body,
            status: Status::new(status),
            headers,
            body,
            duration,
            json: Default::default(),
        })
    }
}

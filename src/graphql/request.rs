use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::graphql::client::GraphQLSuite;
use crate::graphql::response::GraphQLExchange;
use crate::graphql::types::{GraphQLResponse, envelope};
use crate::http::types::{Status, build_header_map, parse_base_url, request_headers, set_header};
use crate::utils::{MAX_BODY_LEN, truncate};
use crate::{E2eError, Result};

/// GraphQL query / mutation 构建器
///
/// ```no_run
/// # async fn demo() {
/// use rue2e::{GraphQLConfig, graphql::GraphQLSuite};
/// use serde_json::json;
///
/// let suite = GraphQLSuite::new(GraphQLConfig::new("http://localhost:8080/graphql"));
/// suite
///     .query("query($id: ID!) { user(id: $id) { name } }")
///     .variable("id", "1")
///     .execute()
///     .await
///     .expect_no_errors()
///     .expect_data_path("user.name", "Alice");
/// # }
/// ```
pub struct GraphQLRequest {
    suite: GraphQLSuite,
    query: String,
    variables: Map<String, Value>,
    headers: BTreeMap<String, String>,
    timeout: Option<Duration>,
    deferred: Option<E2eError>,
}

impl GraphQLRequest {
    pub(crate) fn new(suite: GraphQLSuite, query: &str) -> Self {
        Self {
            suite,
            query: query.to_string(),
            variables: Map::new(),
            headers: BTreeMap::new(),
            timeout: None,
            deferred: None,
        }
    }

    /// 替换全部变量，参数必须序列化为 JSON 对象
    pub fn variables<T: Serialize>(mut self, variables: T) -> Self {
        match serde_json::to_value(variables) {
            Ok(Value::Object(map)) => self.variables = map,
            Ok(Value::Null) => self.variables.clear(),
            Ok(other) => {
                self.deferred = Some(E2eError::Other(format!(
                    "GraphQL variables must be a JSON object, got {}",
                    other
                )))
            }
            Err(e) => self.deferred = Some(e.into()),
        }
        self
    }

    /// 设置单个变量
    pub fn variable<T: Serialize>(mut self, key: &str, value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.variables.insert(key.to_string(), value);
            }
            Err(e) => self.deferred = Some(e.into()),
        }
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        set_header(&mut self.headers, key, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 执行请求，传输错误或无法解析的响应信封都会终止测试
    pub async fn execute(self) -> GraphQLExchange {
        let context = self.suite.context.clone();

        match self.try_execute().await {
            Ok(exchange) => exchange,
            Err(e) => {
                tracing::warn!(error = %e, "GraphQL request failed");
                context.fail_now(&format!("Failed to execute GraphQL request: {}", e))
            }
        }
    }

    pub async fn try_execute(self) -> Result<GraphQLExchange> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let endpoint = parse_base_url(&self.suite.config.endpoint)?;
        let request_body = serde_json::to_vec(&envelope(&self.query, &self.variables))?;
        let sent_headers = request_headers(&self.headers, true);
        let header_map = build_header_map(&sent_headers)?;
        let timeout = self
            .timeout
            .filter(|t| !t.is_zero())
            .unwrap_or_else(|| self.suite.config.effective_timeout());

        tracing::debug!(endpoint = %endpoint, ?timeout, "sending GraphQL request");

        let request = self
            .suite
            .client
            .post(endpoint.clone())
            .headers(header_map)
            .timeout(timeout)
            .body(request_body);

        let start = Instant::now();
        let call = async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, E2eError>((status, headers, body))
        };
        let (status, headers, body) = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| E2eError::Timeout(timeout))??;
        let duration = start.elapsed();

        let response: GraphQLResponse =
            serde_json::from_slice(&body).map_err(|e| E2eError::InvalidGraphQLResponse {
                reason: e.to_string(),
                body: truncate(&String::from_utf8_lossy(&body), MAX_BODY_LEN),
            })?;

        tracing::debug!(
            endpoint = %endpoint,
            status,
            errors = response.errors.len(),
            elapsed_ms = duration.as_millis() as u64,
            "GraphQL response captured"
        );

        Ok(GraphQLExchange {
            context: self.suite.context,
            endpoint,
            query: self.query,
            variables: self.variables,
            request_headers: sent_headers,
            status: Status::new(status),
            headers,
            body,
            response,
            duration,
        })
    }
}

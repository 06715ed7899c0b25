use std::sync::Arc;

use crate::config::GraphQLConfig;
use crate::context::{TestContext, TestScope};
use crate::graphql::request::GraphQLRequest;

/// GraphQL 测试套件，所有请求 POST 到同一个端点
#[derive(Clone)]
pub struct GraphQLSuite {
    pub(crate) config: GraphQLConfig,
    pub(crate) context: Arc<dyn TestContext>,
    pub(crate) client: reqwest::Client,
}

impl GraphQLSuite {
    pub fn new(config: GraphQLConfig) -> Self {
        Self::with_context(TestScope::shared(), config)
    }

    pub fn with_context(context: Arc<dyn TestContext>, config: GraphQLConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.effective_timeout())
            .build()
            .unwrap_or_else(|e| context.fail_now(&format!("Failed to build HTTP client: {}", e)));

        tracing::debug!(endpoint = %config.endpoint, "GraphQL suite created");

        Self {
            config,
            context,
            client,
        }
    }

    pub fn config(&self) -> &GraphQLConfig {
        &self.config
    }

    pub fn query(&self, query: &str) -> GraphQLRequest {
        GraphQLRequest::new(self.clone(), query)
    }

    /// 与 `query` 相同，只是让调用处读起来更清楚
    pub fn mutation(&self, mutation: &str) -> GraphQLRequest {
        GraphQLRequest::new(self.clone(), mutation)
    }
}

use std::sync::Arc;

use crate::config::Config;
use crate::context::{TestContext, TestScope};
use crate::http::request::HttpRequest;
use crate::http::types::Method;

/// HTTP 测试套件
///
/// 持有基础 URL、默认超时和测试上下文；克隆开销很小，内部的
/// `reqwest::Client` 共享连接池。
#[derive(Clone)]
pub struct HttpSuite {
    pub(crate) config: Config,
    pub(crate) context: Arc<dyn TestContext>,
    pub(crate) client: reqwest::Client,
}

impl HttpSuite {
    /// 使用默认的 [`TestScope`] 创建套件，失败时 panic
    pub fn new(config: Config) -> Self {
        Self::with_context(TestScope::shared(), config)
    }

    pub fn with_context(context: Arc<dyn TestContext>, config: Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.effective_timeout())
            .build()
            .unwrap_or_else(|e| context.fail_now(&format!("Failed to build HTTP client: {}", e)));

        tracing::debug!(base_url = %config.base_url, "HTTP suite created");

        Self {
            config,
            context,
            client,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn request(&self, method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(self.clone(), method, path)
    }

    pub fn get(&self, path: &str) -> HttpRequest {
        self.request(Method::Get, path)
    }

    pub fn post(&self, path: &str) -> HttpRequest {
        self.request(Method::Post, path)
    }

    pub fn put(&self, path: &str) -> HttpRequest {
        self.request(Method::Put, path)
    }

    pub fn delete(&self, path: &str) -> HttpRequest {
        self.request(Method::Delete, path)
    }

    pub fn patch(&self, path: &str) -> HttpRequest {
        self.request(Method::Patch, path)
    }

    pub fn head(&self, path: &str) -> HttpRequest {
        self.request(Method::Head, path)
    }

    pub fn options(&self, path: &str) -> HttpRequest {
        self.request(Method::Options, path)
    }
}

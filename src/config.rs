use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{E2eError, Result};

/// 默认请求超时
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn or_default_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

/// HTTP 测试套件配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// 基础 URL，支持 `:3000`、`localhost:3000` 这类简写
    pub base_url: String,
    /// 默认超时，零值表示使用 [`DEFAULT_TIMEOUT`]
    pub timeout: Duration,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn effective_timeout(&self) -> Duration {
        or_default_timeout(self.timeout)
    }
}

/// GraphQL 测试套件配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLConfig {
    /// GraphQL 端点的完整 URL
    pub endpoint: String,
    pub timeout: Duration,
}

impl GraphQLConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn effective_timeout(&self) -> Duration {
        or_default_timeout(self.timeout)
    }
}

/// gRPC 测试套件配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcConfig {
    /// 服务地址，例如 `localhost:9090`
    pub target: String,
    pub timeout: Duration,
}

impl GrpcConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn effective_timeout(&self) -> Duration {
        or_default_timeout(self.timeout)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HttpSection {
    base_url: String,
    #[serde(default)]
    timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphQLSection {
    endpoint: String,
    #[serde(default)]
    timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct GrpcSection {
    target: String,
    #[serde(default)]
    timeout_ms: u64,
}

/// 配置文件内容
///
/// ```toml
/// [http]
/// base_url = "http://localhost:8080"
/// timeout_ms = 5000
///
/// [graphql]
/// endpoint = "http://localhost:8080/graphql"
///
/// [grpc]
/// target = "localhost:9090"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    http: Option<HttpSection>,
    graphql: Option<GraphQLSection>,
    grpc: Option<GrpcSection>,
}

impl ConfigFile {
    pub fn http(&self) -> Result<Config> {
        let section = self
            .http
            .as_ref()
            .ok_or_else(|| E2eError::ConfigError("missing [http] section".to_string()))?;
        Ok(Config::new(&section.base_url).with_timeout(Duration::from_millis(section.timeout_ms)))
    }

    pub fn graphql(&self) -> Result<GraphQLConfig> {
        let section = self
            .graphql
            .as_ref()
            .ok_or_else(|| E2eError::ConfigError("missing [graphql] section".to_string()))?;
        Ok(GraphQLConfig::new(&section.endpoint)
            .with_timeout(Duration::from_millis(section.timeout_ms)))
    }

    pub fn grpc(&self) -> Result<GrpcConfig> {
        let section = self
            .grpc
            .as_ref()
            .ok_or_else(|| E2eError::ConfigError("missing [grpc] section".to_string()))?;
        Ok(GrpcConfig::new(&section.target).with_timeout(Duration::from_millis(section.timeout_ms)))
    }
}

/// 配置文件加载器，只在测试代码显式调用时读取
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ConfigFile> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<ConfigFile> {
        Ok(toml::from_str(content)?)
    }
}

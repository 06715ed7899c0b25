use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    #[error("无效的 Header: {0}")]
    InvalidHeader(String),

    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("无效的 gRPC 方法: {0}")]
    InvalidMethod(String),

    #[error("gRPC 连接失败: {0}")]
    GrpcTransport(#[from] tonic::transport::Error),

    #[error("请求超时: {0:?}")]
    Timeout(Duration),

    #[error("JSON 解析错误: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL 解析错误: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("无效的 GraphQL 响应: {reason}. Body: {body}")]
    InvalidGraphQLResponse { reason: String, body: String },

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for E2eError {
    fn from(err: anyhow::Error) -> Self {
        E2eError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for E2eError {
    fn from(err: toml::de::Error) -> Self {
        E2eError::ConfigError(err.to_string())
    }
}

/// Result type for rue2e crate
pub type Result<T> = std::result::Result<T, E2eError>;

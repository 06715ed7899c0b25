//! 面向 HTTP、gRPC 和 GraphQL 服务的端到端测试工具
//!
//! 每种协议提供一个套件 (suite) 和一个请求构建器。构建器执行一次调用后返回
//! 只读的捕获结果，断言都在捕获结果上链式调用，第一个失败的断言会带着完整的
//! 请求/响应诊断信息终止测试。
//!
//! ```no_run
//! use rue2e::{Config, http::HttpSuite};
//! use serde_json::json;
//!
//! # async fn create_user() {
//! let suite = HttpSuite::new(Config::new("http://localhost:8080"));
//! suite
//!     .post("/api/users")
//!     .json(&json!({"name": "Alice"}))
//!     .execute()
//!     .await
//!     .expect_status(201)
//!     .expect_json(json!({"id": "3", "name": "Alice"}));
//! # }
//! ```

pub mod assertion;
pub mod config;
pub mod context;
pub mod error;
pub mod graphql;
pub mod grpc;
pub mod http;
pub mod logger;
pub mod payload;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ConfigFile, ConfigLoader, DEFAULT_TIMEOUT, GraphQLConfig, GrpcConfig};
pub use context::{Cleanup, TestContext, TestScope};
pub use error::{E2eError, Result};
pub use payload::Payload;

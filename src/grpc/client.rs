use std::sync::{Arc, Mutex, PoisonError};

use tonic::transport::{Channel, Endpoint};

use crate::config::GrpcConfig;
use crate::context::{TestContext, TestScope};
use crate::grpc::request::GrpcRequest;
use crate::{E2eError, Result};

enum ChannelSlot {
    Idle,
    Open(Channel),
    Released,
}

/// gRPC 测试套件
///
/// Channel 在第一次调用时以非 TLS 方式惰性建立，之后所有调用共用；
/// 测试上下文结束时由清理钩子释放。
#[derive(Clone)]
pub struct GrpcSuite {
    pub(crate) config: GrpcConfig,
    pub(crate) context: Arc<dyn TestContext>,
    endpoint: Endpoint,
    slot: Arc<Mutex<ChannelSlot>>,
}

impl GrpcSuite {
    pub fn new(config: GrpcConfig) -> Self {
        Self::with_context(TestScope::shared(), config)
    }

    pub fn with_context(context: Arc<dyn TestContext>, config: GrpcConfig) -> Self {
        let endpoint = build_endpoint(&config).unwrap_or_else(|e| {
            context.fail_now(&format!("Failed to connect to gRPC server: {}", e))
        });

        let slot = Arc::new(Mutex::new(ChannelSlot::Idle));
        let released = slot.clone();
        let target = config.target.clone();
        context.cleanup(Box::new(move || {
            *released.lock().unwrap_or_else(PoisonError::into_inner) = ChannelSlot::Released;
            tracing::debug!(addr = %target, "gRPC channel released");
        }));

        tracing::debug!(addr = %config.target, "gRPC suite created");

        Self {
            config,
            context,
            endpoint,
            slot,
        }
    }

    pub fn config(&self) -> &GrpcConfig {
        &self.config
    }

    /// 创建一元调用，方法名形如 `package.Service/Method`
    pub fn call(&self, method: &str) -> GrpcRequest {
        GrpcRequest::new(self.clone(), method)
    }

    pub(crate) fn channel(&self) -> Result<Channel> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match &*slot {
            ChannelSlot::Open(channel) => Ok(channel.clone()),
            ChannelSlot::Idle => {
                let channel = self.endpoint.connect_lazy();
                *slot = ChannelSlot::Open(channel.clone());
                Ok(channel)
            }
            ChannelSlot::Released => Err(E2eError::Other(format!(
                "gRPC channel to {} has already been released",
                self.config.target
            ))),
        }
    }
}

fn build_endpoint(config: &GrpcConfig) -> Result<Endpoint> {
    let target = config.target.trim();
    if target.is_empty() {
        return Err(E2eError::InvalidUrl("gRPC target is empty".to_string()));
    }

    let uri = if target.contains("://") {
        target.to_string()
    } else {
        format!("http://{}", target)
    };

    Ok(Endpoint::from_shared(uri)?.connect_timeout(config.effective_timeout()))
}

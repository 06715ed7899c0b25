use std::fmt::Display;

use serde_json::Value;

use crate::assertion::json::json_eq;
use crate::context::TestContext;
use crate::payload::Payload;
use crate::utils::{Report, display_json};

/// 已捕获的一次调用，所有断言都基于它执行
///
/// 每个协议提供上下文和请求/响应的诊断信息，失败处理由这里统一完成。
pub trait Exchange {
    fn context(&self) -> &dyn TestContext;

    /// 请求与响应部分的诊断报告
    fn report(&self) -> Report;

    /// 以完整诊断信息终止测试
    fn fail(&self, assertion: &str, expected: &dyn Display, actual: &dyn Display) -> ! {
        let message = self.report().mismatch(assertion, expected, actual);
        tracing::debug!(assertion = %assertion, "assertion failed");
        self.context().fail_now(&message)
    }

    /// 基础设施错误，只带底层错误信息
    fn abort(&self, message: &str) -> ! {
        tracing::warn!("{}", message);
        self.context().fail_now(message)
    }
}

/// 精确相等，失败时显示两边的值
pub fn ensure_eq<E, T>(exchange: &E, assertion: &str, expected: &T, actual: &T)
where
    E: Exchange + ?Sized,
    T: PartialEq + Display + ?Sized,
{
    if expected != actual {
        exchange.fail(assertion, &expected, &actual);
    }
}

/// JSON 结构相等
pub fn ensure_json<E>(exchange: &E, assertion: &str, expected: &Value, actual: &Value)
where
    E: Exchange + ?Sized,
{
    if !json_eq(expected, actual) {
        exchange.fail(
            assertion,
            &format_args!("\n{}", display_json(expected)),
            &format_args!("\n{}", display_json(actual)),
        );
    }
}

/// 解码期望值，字符串先按 JSON 解析
pub fn decode_expected<E>(exchange: &E, expected: &Payload) -> Value
where
    E: Exchange + ?Sized,
{
    expected
        .decode()
        .unwrap_or_else(|e| exchange.abort(&format!("Failed to parse expected JSON: {}", e)))
}

#![allow(dead_code)]

pub mod graphql;
pub mod grpc;

use std::future::Future;
use std::sync::Mutex;

use rue2e::{Cleanup, TestContext};
use serde_json::{Value, json};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// 在独立任务中运行断言，返回 panic 携带的失败信息
pub async fn failure_message<F>(future: F) -> String
where
    F: Future<Output = ()> + Send + 'static,
{
    let err = tokio::spawn(future)
        .await
        .expect_err("expected the test step to fail");
    let payload = err.into_panic();
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_default()
}

/// 回显请求的 responder
///
/// body 为 `{method, path, query?, body?}`，每个请求头以 `x-echo-<name>` 返回。
pub struct EchoResponder;

impl Respond for EchoResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut body = json!({
            "method": request.method.as_str(),
            "path": request.url.path(),
        });
        if let Some(query) = request.url.query() {
            body["query"] = json!(query);
        }
        if !request.body.is_empty() {
            body["body"] = serde_json::from_slice(&request.body)
                .unwrap_or_else(|_| json!(String::from_utf8_lossy(&request.body)));
        }

        let mut template = ResponseTemplate::new(200).set_body_json(body);
        for (name, value) in request.headers.iter() {
            if let Ok(value) = value.to_str() {
                template = template.insert_header(format!("x-echo-{}", name.as_str()), value);
            }
        }
        template
    }
}

/// 启动回显服务器，其他 mock 可以在它之前挂载并优先匹配
pub async fn start_echo_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(EchoResponder)
        .with_priority(u8::MAX)
        .mount(&server)
        .await;
    server
}

pub fn echo(method: &str, path: &str) -> Value {
    json!({"method": method, "path": path})
}

/// 记录日志和清理动作的测试上下文，清理由测试显式触发
#[derive(Default)]
pub struct RecordingContext {
    pub logs: Mutex<Vec<String>>,
    cleanups: Mutex<Vec<Cleanup>>,
}

impl RecordingContext {
    pub fn run_cleanups(&self) {
        let actions = std::mem::take(&mut *self.cleanups.lock().unwrap());
        for action in actions.into_iter().rev() {
            action();
        }
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.lock().unwrap().len()
    }
}

impl TestContext for RecordingContext {
    fn fail_now(&self, message: &str) -> ! {
        self.logs.lock().unwrap().push(format!("FAIL: {}", message));
        panic!("{}", message)
    }

    fn cleanup(&self, action: Cleanup) {
        self.cleanups.lock().unwrap().push(action);
    }

    fn log(&self, message: &str) {
        self.logs.lock().unwrap().push(message.to_string());
    }
}

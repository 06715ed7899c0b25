use std::sync::{Arc, Mutex};

/// 清理回调，在测试结束时执行
pub type Cleanup = Box<dyn FnOnce() + Send + 'static>;

/// 测试上下文 - 断言引擎只依赖这个接口，不依赖具体的测试框架
///
/// `fail_now` 立即终止当前测试；`cleanup` 注册在作用域结束时执行的释放动作。
pub trait TestContext: Send + Sync {
    /// 以给定消息终止测试，不会返回
    fn fail_now(&self, message: &str) -> !;

    /// 注册清理动作
    fn cleanup(&self, action: Cleanup);

    /// 输出一条非致命的日志
    fn log(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// 基于 panic 的默认上下文，配合 `#[test]` / `#[tokio::test]` 使用
///
/// 失败时 panic（payload 为完整的诊断文本），清理动作在 drop 时逆序执行，
/// 即使测试因断言失败而 unwind 也会执行。
#[derive(Default)]
pub struct TestScope {
    cleanups: Mutex<Vec<Cleanup>>,
}

impl TestScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// 已注册但尚未执行的清理动作数量
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl TestContext for TestScope {
    fn fail_now(&self, message: &str) -> ! {
        panic!("{}", message)
    }

    fn cleanup(&self, action: Cleanup) {
        match self.cleanups.lock() {
            Ok(mut cleanups) => cleanups.push(action),
            // 锁被 panic 毒化时直接执行，保证资源仍然被释放
            Err(_) => action(),
        }
    }
}

impl Drop for TestScope {
    fn drop(&mut self) {
        let cleanups = match self.cleanups.get_mut() {
            Ok(cleanups) => std::mem::take(cleanups),
            Err(poisoned) => std::mem::take(poisoned.into_inner()),
        };

        for action in cleanups.into_iter().rev() {
            action();
        }
    }
}

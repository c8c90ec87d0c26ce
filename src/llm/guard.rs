//! 后端包装器：串行化与超时
//!
//! - SerializedBackend：同一后端实例同时只允许一个生成请求在途，其余排队等待
//! - TimeoutBackend：单次生成超过时限返回 [`BackendError::Timeout`]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::llm::{BackendError, GenerativeBackend};

/// 串行化包装：生成期间持有锁，并发提交的任务按到达顺序排队
pub struct SerializedBackend {
    inner: Arc<dyn GenerativeBackend>,
    gate: Mutex<()>,
}

impl SerializedBackend {
    pub fn new(inner: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

#[async_trait]
impl GenerativeBackend for SerializedBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let _permit = self.gate.lock().await;
        self.inner.generate(prompt).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

/// 超时包装
pub struct TimeoutBackend {
    inner: Arc<dyn GenerativeBackend>,
    timeout: Duration,
}

impl TimeoutBackend {
    pub fn new(inner: Arc<dyn GenerativeBackend>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl GenerativeBackend for TimeoutBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        match tokio::time::timeout(self.timeout, self.inner.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} generation timed out after {:?}",
                    self.inner.name(),
                    self.timeout
                );
                Err(BackendError::Timeout(self.timeout))
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

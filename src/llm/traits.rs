//! 生成式后端抽象
//!
//! 所有后端（OpenAI 兼容 / Qwen3 本地服务 / DeepSeek / Stub）实现 GenerativeBackend：
//! 输入完整 prompt，返回模型生成的原始文本（不做任何结构化处理）。

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// 后端调用错误
#[derive(Error, Debug)]
pub enum BackendError {
    /// 后端无法初始化（缺少 Key / 地址、未知 provider 等）
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// 单次生成失败（网络、服务端错误、请求构造失败等）
    #[error("Generation failed: {0}")]
    Generation(String),

    /// 底层 API / HTTP 调用失败，保留原始错误
    #[error("API request failed: {source}")]
    Api {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    pub fn api(err: impl StdError + Send + Sync + 'static) -> Self {
        BackendError::Api {
            source: Box::new(err),
        }
    }

    /// 超时类错误可重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Timeout(_))
    }
}

/// 生成式后端 trait：generate(prompt) -> text
///
/// 实现方可以是有状态的重量级资源；同一实例上的并发调用由 [`crate::llm::SerializedBackend`] 串行化。
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;

    /// 后端名称（日志用）
    fn name(&self) -> &str {
        "backend"
    }

    /// 累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

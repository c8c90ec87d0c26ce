//! 生成式后端层：抽象与实现（OpenAI 兼容 / Qwen3 本地服务 / DeepSeek / Stub）及串行化、超时包装

pub mod deepseek;
pub mod guard;
pub mod mock;
pub mod openai;
pub mod qwen;
pub mod traits;

pub use deepseek::{create_deepseek_client, DEEPSEEK_CHAT, DEEPSEEK_REASONER};
pub use guard::{SerializedBackend, TimeoutBackend};
pub use mock::StubBackend;
pub use openai::{strip_reasoning_blocks, GenerationParams, OpenAiClient, TokenUsage};
pub use qwen::{create_qwen_client, QWEN3_4B, QWEN_DEFAULT_BASE_URL};
pub use traits::{BackendError, GenerativeBackend};

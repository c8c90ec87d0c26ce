//! OpenAI 兼容 API 后端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 Qwen3 本地服务（vLLM / Ollama）、
//! DeepSeek、OpenAI、自建代理等。整个 prompt 作为单条 User 消息发送。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use regex::Regex;

use crate::llm::{BackendError, GenerativeBackend};

/// Token 使用统计（累计值）
#[derive(Debug, Clone, Default)]
pub struct TokenUsage {
    pub prompt_tokens: Arc<AtomicU64>,
    pub completion_tokens: Arc<AtomicU64>,
    pub total_tokens: Arc<AtomicU64>,
}

impl TokenUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, prompt: u64, completion: u64) {
        self.prompt_tokens.fetch_add(prompt, Ordering::Relaxed);
        self.completion_tokens.fetch_add(completion, Ordering::Relaxed);
        self.total_tokens.fetch_add(prompt + completion, Ordering::Relaxed);
    }

    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.total_tokens.load(Ordering::Relaxed),
        )
    }
}

/// 采样参数（对应 [llm.generation]）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 150,
            temperature: 0.3,
        }
    }
}

/// Qwen3 的软开关：追加在用户消息末尾时关闭思考模式
pub const NO_THINK_DIRECTIVE: &str = "/no_think";

/// 去掉推理模型输出中的 `<think>...</think>` 段落
///
/// 生成被 max_new_tokens 截断时 `<think>` 没有闭合，此时从 `<think>` 起到结尾全部丢弃；
/// 服务端模板吞掉开头标签时只剩 `</think>`，其之前的内容同样视为推理段。
pub fn strip_reasoning_blocks(text: &str) -> String {
    static THINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = THINK_RE.get_or_init(|| {
        Regex::new(r"(?s)<think>.*?(?:</think>|\z)").expect("valid regex")
    });
    let stripped = re.replace_all(text, "");
    let rest = match stripped.rfind("</think>") {
        Some(i) => &stripped[i + "</think>".len()..],
        None => &stripped[..],
    };
    rest.trim().to_string()
}

/// OpenAI 兼容后端：持有 Client、model 名与采样参数，generate 时取首条 choice 的 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: GenerationParams,
    strip_reasoning: bool,
    disable_thinking: bool,
    /// 累计 token 使用统计
    pub usage: TokenUsage,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new()
                .with_api_base(url)
                .with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            params: GenerationParams::default(),
            strip_reasoning: false,
            disable_thinking: false,
            usage: TokenUsage::new(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// 是否剥离 `<think>` 推理段（Qwen3 等思考模型）
    pub fn with_strip_reasoning(mut self, strip: bool) -> Self {
        self.strip_reasoning = strip;
        self
    }

    /// 在 prompt 末尾追加 [`NO_THINK_DIRECTIVE`]，关闭 Qwen3 思考模式
    pub fn with_disable_thinking(mut self, disable: bool) -> Self {
        self.disable_thinking = disable;
        self
    }

    /// 实际发送的用户消息
    pub(crate) fn user_content(&self, prompt: &str) -> String {
        if self.disable_thinking {
            format!("{prompt} {NO_THINK_DIRECTIVE}")
        } else {
            prompt.to_string()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 获取累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(self.user_content(prompt))
            .build()
            .map_err(BackendError::api)?
            .into();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .max_completion_tokens(self.params.max_new_tokens)
            .temperature(self.params.temperature)
            .build()
            .map_err(BackendError::api)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(BackendError::api)?;

        if let Some(usage) = &response.usage {
            self.usage.add(
                usage.prompt_tokens as u64,
                usage.completion_tokens as u64,
            );
        }

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        if self.strip_reasoning {
            Ok(strip_reasoning_blocks(&content))
        } else {
            Ok(content.trim().to_string())
        }
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.usage.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_reasoning_blocks() {
        let raw = "<think>\nthe user wants coffee\n</think>\n\n cup, mug, coffee machine.";
        assert_eq!(strip_reasoning_blocks(raw), "cup, mug, coffee machine.");
    }

    #[test]
    fn test_strip_truncated_reasoning_block() {
        let raw = "<think>\nOkay, the user wants coffee. Let me think about which objects";
        assert_eq!(strip_reasoning_blocks(raw), "");
        assert!(crate::proposal::parse_response(&strip_reasoning_blocks(raw)).is_empty());
    }

    #[test]
    fn test_strip_reasoning_missing_open_tag() {
        let raw = "the user wants coffee\n</think>\n\ncup, mug";
        assert_eq!(strip_reasoning_blocks(raw), "cup, mug");
    }

    #[test]
    fn test_strip_empty_no_think_block() {
        let raw = "<think>\n\n</think>\n\ntable, sponge";
        assert_eq!(strip_reasoning_blocks(raw), "table, sponge");
    }

    #[test]
    fn test_disable_thinking_appends_directive() {
        let client =
            OpenAiClient::new(Some("http://localhost:8000/v1"), "Qwen/Qwen3-4B", Some("EMPTY"));
        assert_eq!(client.user_content("wipe the table"), "wipe the table");
        let client = client.with_disable_thinking(true);
        assert_eq!(client.user_content("wipe the table"), "wipe the table /no_think");
    }

    #[test]
    fn test_api_error_keeps_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = BackendError::api(io);
        let source = err.source().expect("source attached");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_strip_reasoning_without_block() {
        assert_eq!(strip_reasoning_blocks("  table, sponge "), "table, sponge");
    }

    #[test]
    fn test_token_usage_accumulates() {
        let usage = TokenUsage::new();
        usage.add(10, 5);
        usage.add(3, 2);
        assert_eq!(usage.get(), (13, 7, 20));
    }

    #[test]
    fn test_token_usage_through_trait() {
        let client = OpenAiClient::new(None, "gpt-4o-mini", Some("sk-test"));
        client.usage.add(4, 6);
        let backend: &dyn GenerativeBackend = &client;
        assert_eq!(backend.token_usage(), (4, 6, 10));
    }
}

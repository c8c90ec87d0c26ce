//! Qwen3 本地服务后端
//!
//! 模型加载与硬件选择交给外部推理服务（vLLM / Ollama / llama.cpp server 等，均暴露 OpenAI 兼容接口），
//! 这里只负责连到该服务。Qwen3 默认开启思考模式：请求中追加 `/no_think` 关闭它，
//! 输出中残留的 `<think>` 段（包括被截断未闭合的）仍会被剥离。

use crate::llm::{GenerationParams, OpenAiClient};

/// 本地推理服务默认地址（vLLM 默认端口）
pub const QWEN_DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
pub const QWEN3_4B: &str = "Qwen/Qwen3-4B";

/// 创建 Qwen3 后端
///
/// - 地址：`base_url` 参数 > 环境变量 `QWEN_BASE_URL` > [`QWEN_DEFAULT_BASE_URL`]
/// - 模型：`model` 参数 > 环境变量 `QWEN_MODEL` > [`QWEN3_4B`]
/// - 本地服务通常不校验 Key，缺省使用 `EMPTY`
pub fn create_qwen_client(
    base_url: Option<&str>,
    model: Option<&str>,
    params: GenerationParams,
) -> OpenAiClient {
    let base_url = base_url
        .map(String::from)
        .or_else(|| std::env::var("QWEN_BASE_URL").ok())
        .unwrap_or_else(|| QWEN_DEFAULT_BASE_URL.to_string());

    let model = model
        .map(String::from)
        .or_else(|| std::env::var("QWEN_MODEL").ok())
        .unwrap_or_else(|| QWEN3_4B.to_string());

    let api_key = std::env::var("QWEN_API_KEY").unwrap_or_else(|_| "EMPTY".to_string());

    tracing::debug!("Qwen3 backend: {} @ {}", model, base_url);
    OpenAiClient::new(Some(&base_url), &model, Some(api_key.as_str()))
        .with_params(params)
        .with_disable_thinking(true)
        .with_strip_reasoning(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_arguments_win() {
        let client = create_qwen_client(
            Some("http://gpu-box:9000/v1"),
            Some("Qwen/Qwen3-8B"),
            GenerationParams::default(),
        );
        assert_eq!(client.model(), "Qwen/Qwen3-8B");
    }

    #[test]
    fn test_thinking_disabled_in_requests() {
        let client =
            create_qwen_client(Some(QWEN_DEFAULT_BASE_URL), None, GenerationParams::default());
        let content = client.user_content("clean the sink");
        assert!(content.ends_with(crate::llm::openai::NO_THINK_DIRECTIVE));
    }
}

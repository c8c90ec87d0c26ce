//! 流水线构建器：按配置选择后端、构建物品清单并组装 Orchestrator
//!
//! 交互式主程序、批处理演示与集成测试共用同一套初始化逻辑。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{Orchestrator, PipelineError};
use crate::grounding::{
    find_scene, load_pose_file, parse_categories, scan_image_files, InventorySnapshot,
    StubExtractor,
};
use crate::llm::{
    create_deepseek_client, create_qwen_client, BackendError, GenerationParams,
    GenerativeBackend, OpenAiClient, SerializedBackend, StubBackend, TimeoutBackend,
};
use crate::proposal::PromptBuilder;

fn env_present(key: &str) -> bool {
    std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn unavailable(backend: &str, reason: impl Into<String>) -> PipelineError {
    PipelineError::BackendUnavailable {
        backend: backend.to_string(),
        source: BackendError::Unavailable(reason.into()),
    }
}

/// 根据配置与环境变量选择后端（未包装）
///
/// - `auto`：有 `DEEPSEEK_API_KEY` 用 DeepSeek，有 `OPENAI_API_KEY` 用 OpenAI，有 `QWEN_BASE_URL` 用本地 Qwen3，
///   都没有时退回 Stub 并告警
/// - 显式 provider 无法构造（缺少 Key、未知名称）时返回 [`PipelineError::BackendUnavailable`]
pub fn select_backend(cfg: &AppConfig) -> Result<Arc<dyn GenerativeBackend>, PipelineError> {
    let provider = cfg.llm.provider.trim().to_lowercase();
    let params = GenerationParams {
        max_new_tokens: cfg.llm.generation.max_new_tokens,
        temperature: cfg.llm.generation.temperature,
    };

    let provider = match provider.as_str() {
        "auto" if env_present("DEEPSEEK_API_KEY") => "deepseek",
        "auto" if env_present("OPENAI_API_KEY") => "openai",
        "auto" if env_present("QWEN_BASE_URL") => "qwen",
        "auto" => {
            tracing::warn!("No API key or local server configured, using stub backend");
            "mock"
        }
        other => other,
    };

    match provider {
        "mock" | "stub" => {
            tracing::info!("Using stub backend");
            Ok(Arc::new(StubBackend::new()))
        }
        "qwen" => {
            let model = cfg.llm.qwen.model.as_deref().or(cfg.llm.model.as_deref());
            let base = cfg.llm.qwen.base_url.as_deref().or(cfg.llm.base_url.as_deref());
            let client = create_qwen_client(base, model, params);
            tracing::info!("Using Qwen3 backend ({})", client.model());
            Ok(Arc::new(client))
        }
        "deepseek" => {
            if !env_present("DEEPSEEK_API_KEY") && !env_present("OPENAI_API_KEY") {
                return Err(unavailable("deepseek", "DEEPSEEK_API_KEY not set"));
            }
            let model = cfg.llm.deepseek.model.as_deref().or(cfg.llm.model.as_deref());
            let client = create_deepseek_client(model, params);
            tracing::info!("Using DeepSeek backend ({})", client.model());
            Ok(Arc::new(client))
        }
        "openai" => {
            let key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| unavailable("openai", "OPENAI_API_KEY not set"))?;
            let model = cfg
                .llm
                .openai
                .model
                .clone()
                .or_else(|| cfg.llm.model.clone())
                .unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI backend ({})", model);
            Ok(Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, Some(key.as_str()))
                    .with_params(params),
            ))
        }
        other => Err(unavailable(other, format!("unknown provider '{other}'"))),
    }
}

/// 选择后端并包上超时与串行化
pub fn create_backend_from_config(
    cfg: &AppConfig,
) -> Result<Arc<dyn GenerativeBackend>, PipelineError> {
    wrap_backend(select_backend(cfg)?, cfg.llm.timeouts.request)
}

/// 超时在内、串行化在外：排队等待的时间不计入单次请求的超时
pub fn wrap_backend(
    backend: Arc<dyn GenerativeBackend>,
    timeout_secs: u64,
) -> Result<Arc<dyn GenerativeBackend>, PipelineError> {
    if timeout_secs == 0 {
        return Err(PipelineError::Config("llm.timeouts.request must be > 0".to_string()));
    }
    let timed: Arc<dyn GenerativeBackend> =
        Arc::new(TimeoutBackend::new(backend, Duration::from_secs(timeout_secs)));
    Ok(Arc::new(SerializedBackend::new(timed)))
}

/// 按 [inventory] 段构建模拟物品清单
///
/// 类别：`categories` > `scene` 预置；图像：`data_dir` 下的 `color_*.jpg`；位姿：`pose_file`
pub fn build_inventory_from_config(cfg: &AppConfig) -> Result<InventorySnapshot, PipelineError> {
    let section = &cfg.inventory;

    let categories = match section.categories.as_deref().map(parse_categories) {
        Some(list) if !list.is_empty() => list,
        _ => find_scene(&section.scene)
            .map(|scene| scene.categories())
            .ok_or_else(|| PipelineError::Config(format!("unknown scene '{}'", section.scene)))?,
    };

    let images = match &section.data_dir {
        Some(dir) => scan_image_files(dir)?,
        None => Vec::new(),
    };
    let poses = match &section.pose_file {
        Some(path) => load_pose_file(path)?,
        None => Default::default(),
    };

    let inventory = StubExtractor::new(categories)
        .with_images(images)
        .with_poses(poses)
        .with_seed(section.seed)
        .extract()?;
    Ok(inventory)
}

/// 流水线构建器：未显式提供的后端与清单按配置创建
pub struct PipelineBuilder {
    config: AppConfig,
    backend: Option<Arc<dyn GenerativeBackend>>,
    inventory: Option<InventorySnapshot>,
}

impl PipelineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            backend: None,
            inventory: None,
        }
    }

    /// 使用指定后端（仍会包上超时与串行化）
    pub fn with_backend(mut self, backend: Arc<dyn GenerativeBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// 使用已有清单（如从 JSON 导入），跳过模拟提取
    pub fn with_inventory(mut self, inventory: InventorySnapshot) -> Self {
        self.inventory = Some(inventory);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build(self) -> Result<Orchestrator, PipelineError> {
        let backend = match self.backend {
            Some(b) => wrap_backend(b, self.config.llm.timeouts.request)?,
            None => create_backend_from_config(&self.config)?,
        };
        let inventory = match self.inventory {
            Some(inv) => inv,
            None => build_inventory_from_config(&self.config)?,
        };
        tracing::info!(
            "Pipeline ready: backend {}, {} objects in inventory",
            backend.name(),
            inventory.len()
        );

        let prompts =
            PromptBuilder::from_file_or_default(self.config.pipeline.exemplars_path.as_deref());

        Ok(Orchestrator::new(backend, Arc::new(inventory))
            .with_prompt_builder(prompts)
            .with_fallback_count(self.config.pipeline.fallback_count)
            .with_max_retries(self.config.pipeline.max_retries))
    }
}

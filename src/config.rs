//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `NLMAP__*` 覆盖（双下划线表示嵌套，如 `NLMAP__LLM__PROVIDER=qwen`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub pipeline: PipelineSection,
    pub inventory: InventorySection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、生成参数与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// auto / mock / qwen / openai / deepseek；auto 按环境变量中的 API Key 选择，均无时用 Stub
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub qwen: LlmQwenSection,
    #[serde(default)]
    pub deepseek: LlmDeepSeekSection,
    #[serde(default)]
    pub openai: LlmOpenAiSection,
    #[serde(default)]
    pub generation: LlmGenerationSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            qwen: LlmQwenSection::default(),
            deepseek: LlmDeepSeekSection::default(),
            openai: LlmOpenAiSection::default(),
            generation: LlmGenerationSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "auto".to_string()
}

/// [llm.qwen] 段：本地 OpenAI 兼容服务（如 vLLM 部署的 Qwen3）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmQwenSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmOpenAiSection {
    pub model: Option<String>,
}

/// [llm.generation] 段
#[derive(Debug, Clone, Deserialize)]
pub struct LlmGenerationSection {
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmGenerationSection {
    fn default() -> Self {
        Self {
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_max_new_tokens() -> u32 {
    150
}

fn default_temperature() -> f32 {
    0.3
}

/// [llm.timeouts] 段（秒）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [pipeline] 段：兜底物体数、超时重试次数、few-shot 语料文件
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// 落地集合为空时取清单前 N 个物体；0 关闭
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub exemplars_path: Option<PathBuf>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            fallback_count: default_fallback_count(),
            max_retries: default_max_retries(),
            exemplars_path: None,
        }
    }
}

fn default_fallback_count() -> usize {
    3
}

fn default_max_retries() -> u32 {
    1
}

/// [inventory] 段：物品清单来源
///
/// `categories`（`;` 分隔）优先于 `scene` 预置；`data_dir` 下的 `color_*.jpg` 作为图像来源，
/// `pose_file` 为可选的位姿 JSON；`seed` 固定模拟采样；`export_path` 设置后启动时导出清单。
#[derive(Debug, Clone, Deserialize)]
pub struct InventorySection {
    #[serde(default = "default_scene")]
    pub scene: String,
    pub categories: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub pose_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub export_path: Option<PathBuf>,
}

impl Default for InventorySection {
    fn default() -> Self {
        Self {
            scene: default_scene(),
            categories: None,
            data_dir: None,
            pose_file: None,
            seed: None,
            export_path: None,
        }
    }
}

fn default_scene() -> String {
    "kitchen".to_string()
}

/// 从 config 目录加载配置，环境变量 NLMAP__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 NLMAP__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!("Config file {} not found, ignored", path.display());
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("NLMAP")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, "auto");
        assert_eq!(cfg.llm.generation.max_new_tokens, 150);
        assert!((cfg.llm.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.pipeline.fallback_count, 3);
        assert_eq!(cfg.pipeline.max_retries, 1);
        assert_eq!(cfg.inventory.scene, "kitchen");
    }

    #[test]
    fn test_explicit_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[llm]
provider = "mock"

[llm.generation]
temperature = 0.7

[pipeline]
fallback_count = 5

[inventory]
scene = "office"
categories = "desk;chair"
seed = 42
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.generation.max_new_tokens, 150);
        assert!((cfg.llm.generation.temperature - 0.7).abs() < 1e-6);
        assert_eq!(cfg.pipeline.fallback_count, 5);
        assert_eq!(cfg.inventory.categories.as_deref(), Some("desk;chair"));
        assert_eq!(cfg.inventory.seed, Some(42));
    }
}

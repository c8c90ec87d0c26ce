//! NLMap Agent - 自然语言任务 → 物体落地 → 分阶段规划
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排器、错误与恢复、任务记录、会话监管、流水线构建
//! - **grounding**: 场景物品清单、物体匹配、模拟感知、预置场景
//! - **llm**: 生成式后端抽象与实现（OpenAI 兼容 / Qwen3 / DeepSeek / Stub）
//! - **observability**: 日志初始化
//! - **planning**: 两阶段计划 prompt 合成与结构校验
//! - **proposal**: few-shot 物体提议 prompt 与回复解析

pub mod config;
pub mod core;
pub mod grounding;
pub mod llm;
pub mod observability;
pub mod planning;
pub mod proposal;

pub use crate::core::{Orchestrator, PipelineBuilder, PipelineError, TaskOutcome};
pub use crate::grounding::{GroundedMatch, InventorySnapshot, MatchKind, SceneObject};

//! 流水线错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 PipelineError 决定 Retry / Skip / Abort。
//! 解析与落地阶段不会失败，错误只来自后端、物品清单与配置。

use thiserror::Error;

use crate::grounding::InventoryError;
use crate::llm::BackendError;

/// 流水线运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 后端无法初始化；致命，批处理中止
    #[error("Backend '{backend}' unavailable: {source}")]
    BackendUnavailable {
        backend: String,
        #[source]
        source: BackendError,
    },

    /// 单次生成失败；只影响当前任务
    #[error("Generation failed for task '{task}': {source}")]
    BackendGeneration {
        task: String,
        #[source]
        source: BackendError,
    },

    #[error("Object not in inventory: {0}")]
    InventoryMissing(String),

    #[error("Inventory error: {0}")]
    Inventory(InventoryError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Task is empty")]
    EmptyTask,

    #[error("Task cancelled")]
    Cancelled,
}

impl PipelineError {
    /// 致命错误：批处理不再继续后续任务
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::BackendUnavailable { .. }
                | PipelineError::Inventory(_)
                | PipelineError::Config(_)
        )
    }
}

impl From<InventoryError> for PipelineError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Missing(id) => PipelineError::InventoryMissing(id),
            other => PipelineError::Inventory(other),
        }
    }
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 原样重试当前阶段（如请求超时）
    Retry,
    /// 放弃当前任务，继续后续任务；附带给用户的说明
    Skip(String),
    /// 终止整个批处理
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_maps_to_inventory_missing() {
        let err: PipelineError = InventoryError::Missing("cup".to_string()).into();
        assert!(matches!(err, PipelineError::InventoryMissing(id) if id == "cup"));

        let err: PipelineError = InventoryError::DuplicateId("cup".to_string()).into();
        assert!(matches!(err, PipelineError::Inventory(_)));
    }

    #[test]
    fn test_fatal_classification() {
        let unavailable = PipelineError::BackendUnavailable {
            backend: "qwen".to_string(),
            source: BackendError::Unavailable("connection refused".to_string()),
        };
        assert!(unavailable.is_fatal());

        let generation = PipelineError::BackendGeneration {
            task: "make coffee".to_string(),
            source: BackendError::Generation("empty choices".to_string()),
        };
        assert!(!generation.is_fatal());
        assert!(!PipelineError::EmptyTask.is_fatal());
        assert!(!PipelineError::Cancelled.is_fatal());
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err = PipelineError::BackendGeneration {
            task: "t".to_string(),
            source: BackendError::Generation("boom".to_string()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_source_chain_reaches_api_error() {
        use std::error::Error;
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "HTTP 504");
        let err = PipelineError::BackendGeneration {
            task: "make coffee".to_string(),
            source: BackendError::api(io),
        };
        let root = err.source().and_then(|backend| backend.source()).unwrap();
        let io = root.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::TimedOut);
        assert!(err.to_string().contains("HTTP 504"));
    }
}

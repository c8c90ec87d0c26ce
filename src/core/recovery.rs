//! 错误恢复引擎
//!
//! 根据 PipelineError 类型返回 RecoveryAction，供批处理决定是重试当前阶段、跳过当前任务还是终止。

use crate::core::{PipelineError, RecoveryAction};

/// 将错误映射为可执行动作；超时类错误在重试次数用尽前返回 Retry
#[derive(Debug, Clone)]
pub struct RecoveryEngine {
    max_retries: u32,
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl RecoveryEngine {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `attempt` 为已经失败的次数（从 1 开始）
    pub fn handle(&self, err: &PipelineError, attempt: u32) -> RecoveryAction {
        match err {
            PipelineError::BackendGeneration { source, .. }
                if source.is_retryable() && attempt <= self.max_retries =>
            {
                RecoveryAction::Retry
            }
            PipelineError::BackendGeneration { task, source } => {
                RecoveryAction::Skip(format!("任务「{task}」生成失败：{source}"))
            }
            PipelineError::EmptyTask => RecoveryAction::Skip("任务为空，已跳过".to_string()),
            PipelineError::InventoryMissing(id) => {
                RecoveryAction::Skip(format!("物品清单中没有「{id}」"))
            }
            PipelineError::Cancelled => RecoveryAction::Skip("任务已取消".to_string()),
            PipelineError::BackendUnavailable { .. }
            | PipelineError::Inventory(_)
            | PipelineError::Config(_) => RecoveryAction::Abort,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::llm::BackendError;

    fn generation(source: BackendError) -> PipelineError {
        PipelineError::BackendGeneration {
            task: "清理厨房桌子".to_string(),
            source,
        }
    }

    #[test]
    fn test_timeout_retried_until_budget_exhausted() {
        let engine = RecoveryEngine::new(2);
        let err = generation(BackendError::Timeout(Duration::from_secs(5)));
        assert_eq!(engine.handle(&err, 1), RecoveryAction::Retry);
        assert_eq!(engine.handle(&err, 2), RecoveryAction::Retry);
        assert!(matches!(engine.handle(&err, 3), RecoveryAction::Skip(_)));
    }

    #[test]
    fn test_zero_retries_skips_immediately() {
        let engine = RecoveryEngine::new(0);
        let err = generation(BackendError::Timeout(Duration::from_secs(5)));
        assert!(matches!(engine.handle(&err, 1), RecoveryAction::Skip(_)));
    }

    #[test]
    fn test_generation_error_skips_task() {
        let engine = RecoveryEngine::default();
        let err = generation(BackendError::Generation("HTTP 500".to_string()));
        match engine.handle(&err, 1) {
            RecoveryAction::Skip(msg) => {
                assert!(msg.contains("清理厨房桌子"));
                assert!(msg.contains("HTTP 500"));
            }
            other => panic!("Expected Skip, got {other:?}"),
        }
    }

    #[test]
    fn test_unavailable_aborts() {
        let engine = RecoveryEngine::default();
        let err = PipelineError::BackendUnavailable {
            backend: "qwen".to_string(),
            source: BackendError::Unavailable("no server".to_string()),
        };
        assert_eq!(engine.handle(&err, 1), RecoveryAction::Abort);
    }

    #[test]
    fn test_cancelled_and_empty_skip() {
        let engine = RecoveryEngine::default();
        assert!(matches!(engine.handle(&PipelineError::Cancelled, 1), RecoveryAction::Skip(_)));
        assert!(matches!(engine.handle(&PipelineError::EmptyTask, 1), RecoveryAction::Skip(_)));
    }
}

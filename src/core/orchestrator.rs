//! 流水线编排器
//!
//! 串起 PromptBuilder → GenerativeBackend → parse_response → ground_objects → PlanSynthesizer。
//! 调用方持有 Orchestrator 并按引用传递；物品清单通过 `Arc` 只读共享，后端调用是唯一的挂起点。
//! 落地集合为空时的兜底（取清单前 N 个物体）在这里做，不在匹配器里。

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::{ActionHint, PipelineError, RecoveryAction, RecoveryEngine, TaskOutcome};
use crate::grounding::{self, GroundedMatch, InventorySnapshot};
use crate::llm::{BackendError, GenerativeBackend};
use crate::planning::{parse_plan, PlanSynthesizer};
use crate::proposal::{parse_response, PromptBuilder};

/// 默认兜底物体数
pub const DEFAULT_FALLBACK_COUNT: usize = 3;

/// 批处理结果：成功的任务记录、被跳过的任务与跳过原因、导致中止的错误
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
    pub skipped: Vec<(String, String)>,
    pub aborted: Option<PipelineError>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none() && self.skipped.is_empty()
    }
}

pub struct Orchestrator {
    backend: Arc<dyn GenerativeBackend>,
    prompts: PromptBuilder,
    planner: PlanSynthesizer,
    inventory: Arc<InventorySnapshot>,
    fallback_count: usize,
    recovery: RecoveryEngine,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>, inventory: Arc<InventorySnapshot>) -> Self {
        Self {
            planner: PlanSynthesizer::new(backend.clone()),
            backend,
            prompts: PromptBuilder::new(),
            inventory,
            fallback_count: DEFAULT_FALLBACK_COUNT,
            recovery: RecoveryEngine::default(),
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// 0 表示关闭兜底
    pub fn with_fallback_count(mut self, n: usize) -> Self {
        self.fallback_count = n;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.recovery = RecoveryEngine::new(max_retries);
        self
    }

    pub fn inventory(&self) -> &Arc<InventorySnapshot> {
        &self.inventory
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count
    }

    /// 后端累计 token 使用：(prompt, completion, total)
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.backend.token_usage()
    }

    /// 阶段一：构建 few-shot prompt，调用后端，解析出物体提议
    pub async fn propose_objects(&self, task: &str) -> Result<Vec<String>, PipelineError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(PipelineError::EmptyTask);
        }
        let prompt = self.prompts.build(task);
        let raw = self
            .with_retry(task, || self.backend.generate(&prompt))
            .await?;
        tracing::debug!(task, raw = %raw, "Proposal response");

        let proposals = parse_response(&raw);
        tracing::info!("Proposed {} objects for '{}': {:?}", proposals.len(), task, proposals);
        Ok(proposals)
    }

    /// 阶段二：对照物品清单落地；不会失败
    pub fn ground_objects(&self, proposals: &[String]) -> Vec<GroundedMatch> {
        let matches = grounding::ground_objects(proposals, &self.inventory);
        tracing::info!(
            "Grounded {}/{} proposals",
            matches.iter().filter(|m| m.is_grounded()).count(),
            matches.len()
        );
        matches
    }

    /// 阶段三：生成两阶段计划，原样返回后端文本
    pub async fn synthesize_plan(
        &self,
        task: &str,
        names: &[String],
    ) -> Result<String, PipelineError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(PipelineError::EmptyTask);
        }
        self.with_retry(task, || self.planner.synthesize(task, names))
            .await
    }

    /// 完整流水线：提议 → 落地 →（必要时兜底）→ 规划 → 结构校验 → 操作提示
    pub async fn run_task(&self, task: &str) -> Result<TaskOutcome, PipelineError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(PipelineError::EmptyTask);
        }
        let started_at = Local::now();

        let clock = Instant::now();
        let proposals = self.propose_objects(task).await?;
        let proposal_elapsed = clock.elapsed();

        let matches = self.ground_objects(&proposals);
        let grounded = grounding::grounded_names(&matches);

        let used_fallback =
            grounded.is_empty() && self.fallback_count > 0 && !self.inventory.is_empty();
        let plan_objects = if used_fallback {
            let fallback = self.inventory.first_n(self.fallback_count);
            tracing::warn!("No proposal grounded, falling back to {:?}", fallback);
            fallback
        } else {
            grounded.clone()
        };

        let clock = Instant::now();
        let plan_text = self.synthesize_plan(task, &plan_objects).await?;
        let planning_elapsed = clock.elapsed();

        let plan = match parse_plan(&plan_text) {
            Ok(plan) => Some(plan),
            Err(e) if !grounded.is_empty() => {
                tracing::warn!("Plan for '{}' failed validation: {}", task, e);
                None
            }
            Err(e) => {
                tracing::debug!("Plan for '{}' not structured: {}", task, e);
                None
            }
        };

        let actions = ActionHint::for_objects(&grounded, &self.inventory)?;

        tracing::info!(
            "Task '{}' done: proposal {:.2}s, planning {:.2}s",
            task,
            proposal_elapsed.as_secs_f64(),
            planning_elapsed.as_secs_f64()
        );

        Ok(TaskOutcome {
            id: Uuid::new_v4(),
            started_at,
            task: task.to_string(),
            proposals,
            matches,
            used_fallback,
            plan_objects,
            plan_text,
            plan,
            actions,
            proposal_elapsed,
            planning_elapsed,
        })
    }

    /// 可取消的 run_task（交互式前端 Ctrl+C 时触发 token）
    pub async fn run_task_with_cancel(
        &self,
        task: &str,
        cancel: &CancellationToken,
    ) -> Result<TaskOutcome, PipelineError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Task '{}' cancelled", task.trim());
                Err(PipelineError::Cancelled)
            }
            result = self.run_task(task) => result,
        }
    }

    /// 顺序执行多个任务：单个任务失败时记录并继续，致命错误中止剩余任务
    pub async fn run_batch<S: AsRef<str>>(&self, tasks: &[S]) -> BatchReport {
        let mut report = BatchReport::default();
        for task in tasks {
            let task = task.as_ref();
            match self.run_task(task).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    // 阶段内重试已用尽，这里只区分跳过与中止
                    let action = self.recovery.handle(&e, u32::MAX);
                    if action == RecoveryAction::Abort {
                        tracing::error!("Batch aborted at '{}': {}", task, e);
                        report.aborted = Some(e);
                        break;
                    }
                    let reason = match action {
                        RecoveryAction::Skip(reason) => reason,
                        _ => e.to_string(),
                    };
                    tracing::warn!("Skipping task '{}': {}", task, e);
                    report.skipped.push((task.to_string(), reason));
                }
            }
        }
        report
    }

    /// 后端调用重试：超时类错误在 max_retries 次内重试，其余错误直接返回
    async fn with_retry<F, Fut>(&self, task: &str, mut call: F) -> Result<String, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, BackendError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(text) => return Ok(text),
                Err(source) => {
                    attempt += 1;
                    let err = PipelineError::BackendGeneration {
                        task: task.to_string(),
                        source,
                    };
                    if self.recovery.handle(&err, attempt) == RecoveryAction::Retry {
                        tracing::warn!(
                            "Attempt {}/{} for '{}' failed ({}), retrying",
                            attempt,
                            self.recovery.max_retries(),
                            task,
                            err
                        );
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }
}

//! Stub 后端（用于测试与离线演示，无需模型服务）
//!
//! 行为完全确定：
//! - 预置脚本（with_responses / with_script）按顺序消费，用完后回到默认行为
//! - 物体提议 prompt：任务与示例语料中某条完全一致时返回该条答案，否则返回任务文本中出现的示例物体名
//! - 规划 prompt：按 `Available objects` 行生成固定格式的两阶段计划
//!
//! 所有收到的 prompt 都会被记录，便于断言。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{BackendError, GenerativeBackend};
use crate::planning::{
    ACQUISITION_HEADER, EXECUTION_HEADER, NO_OBJECTS_MARKER, OBJECTS_PREFIX, TASK_PREFIX,
};
use crate::proposal::{lookup_exemplar, DEFAULT_EXEMPLARS, OBJECT_QUERY_SUFFIX};

/// Stub 后端
#[derive(Debug, Default)]
pub struct StubBackend {
    script: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置若干条成功回复
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(responses.into_iter().map(|r| Ok(r.into())))
    }

    /// 预置回复序列，Err 项会以 [`BackendError::Generation`] 返回
    pub fn with_script<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<String, String>>,
    {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的全部 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn default_reply(prompt: &str) -> String {
        if let Some(objects) = plan_objects(prompt) {
            let task = line_after(prompt, TASK_PREFIX).unwrap_or_default();
            return canned_plan(task, &objects);
        }
        match proposal_task(prompt) {
            Some(task) => propose_for_task(task),
            None => String::new(),
        }
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match scripted {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(BackendError::Generation(msg)),
            None => Ok(Self::default_reply(prompt)),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn line_after<'a>(prompt: &'a str, prefix: &str) -> Option<&'a str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
}

/// 规划 prompt 中的物体列表；不是规划 prompt 时返回 None
fn plan_objects(prompt: &str) -> Option<Vec<String>> {
    let line = line_after(prompt, OBJECTS_PREFIX)?;
    if line == NO_OBJECTS_MARKER {
        return Some(Vec::new());
    }
    Some(
        line.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// 提议 prompt 最后一行中的任务文本
fn proposal_task(prompt: &str) -> Option<&str> {
    prompt
        .trim_end()
        .lines()
        .last()?
        .strip_prefix("The task '")?
        .strip_suffix(OBJECT_QUERY_SUFFIX)?
        .trim_end()
        .strip_suffix('\'')
}

fn propose_for_task(task: &str) -> String {
    if let Some(answer) = lookup_exemplar(DEFAULT_EXEMPLARS, task) {
        return answer.trim().to_string();
    }

    let task_lower = task.to_lowercase();
    let mut found: Vec<&str> = Vec::new();
    for line in DEFAULT_EXEMPLARS.lines() {
        let Some((_, answer)) = line.split_once(OBJECT_QUERY_SUFFIX) else {
            continue;
        };
        for name in answer.trim().trim_end_matches('.').split(',').map(str::trim) {
            if !name.is_empty() && task_lower.contains(name) && !found.contains(&name) {
                found.push(name);
            }
        }
    }

    if found.is_empty() {
        String::new()
    } else {
        format!("{}.", found.join(", "))
    }
}

fn canned_plan(task: &str, objects: &[String]) -> String {
    let mut out = String::new();
    out.push_str(ACQUISITION_HEADER);
    out.push('\n');
    if objects.is_empty() {
        out.push_str("1. 确认当前场景中与任务相关的物品\n");
    } else {
        for (i, obj) in objects.iter().enumerate() {
            out.push_str(&format!("{}. 前往{}所在位置，拿取{}\n", i + 1, obj, obj));
        }
    }
    out.push('\n');
    out.push_str(EXECUTION_HEADER);
    out.push('\n');
    out.push_str(&format!("1. 使用已获取的物品执行任务：{}\n", task));
    out.push_str("2. 检查任务完成情况\n");
    out
}

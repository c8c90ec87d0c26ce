//! 计划文本结构校验（可选）
//!
//! 识别两阶段标题（`阶段一` / `阶段二`，或英文 `Phase 1` / `Phase 2`、`acquisition` / `execution`）
//! 与其下的编号步骤，得到结构化的 [`Plan`]。后端输出的原始文本始终是主结果，这里只用于检查与展示。

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// 计划阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlanPhase {
    /// 获取所需物品
    Acquisition,
    /// 分步执行
    Execution,
}

/// 结构化计划：两个有序阶段，每步为一段自由文本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub acquisition: Vec<String>,
    pub execution: Vec<String>,
}

impl Plan {
    pub fn step_count(&self) -> usize {
        self.acquisition.len() + self.execution.len()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanFormatError {
    #[error("Plan has no {0:?} section")]
    MissingPhase(PlanPhase),

    #[error("Plan section {0:?} has no steps")]
    EmptyPhase(PlanPhase),
}

fn step_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:\d+\s*[.、:：)）]|[-•])\s*(\S.*)$").expect("valid regex")
    })
}

fn acquisition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)阶段一|阶段1|phase\s*(?:1|one)\b|acquisition|acquire")
            .expect("valid regex")
    })
}

fn execution_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)阶段二|阶段2|phase\s*(?:2|two)\b|execution|execute").expect("valid regex")
    })
}

fn header_phase(line: &str) -> Option<PlanPhase> {
    if acquisition_re().is_match(line) {
        Some(PlanPhase::Acquisition)
    } else if execution_re().is_match(line) {
        Some(PlanPhase::Execution)
    } else {
        None
    }
}

/// 解析计划文本；两个阶段都必须出现且至少各有一步
pub fn parse_plan(text: &str) -> Result<Plan, PlanFormatError> {
    let mut plan = Plan::default();
    let mut current: Option<PlanPhase> = None;
    let mut seen_acquisition = false;
    let mut seen_execution = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let (Some(phase), Some(caps)) = (current, step_re().captures(line)) {
            let step = caps[1].trim().to_string();
            match phase {
                PlanPhase::Acquisition => plan.acquisition.push(step),
                PlanPhase::Execution => plan.execution.push(step),
            }
            continue;
        }

        if let Some(phase) = header_phase(line) {
            match phase {
                PlanPhase::Acquisition => seen_acquisition = true,
                PlanPhase::Execution => seen_execution = true,
            }
            current = Some(phase);
        }
    }

    if !seen_acquisition {
        return Err(PlanFormatError::MissingPhase(PlanPhase::Acquisition));
    }
    if !seen_execution {
        return Err(PlanFormatError::MissingPhase(PlanPhase::Execution));
    }
    if plan.acquisition.is_empty() {
        return Err(PlanFormatError::EmptyPhase(PlanPhase::Acquisition));
    }
    if plan.execution.is_empty() {
        return Err(PlanFormatError::EmptyPhase(PlanPhase::Execution));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "**阶段一：获取所需物品**\n\
        1. 前往厨房台面，拿取咖啡机\n\
        2. 前往橱柜，取出咖啡杯\n\
        \n\
        **阶段二：分步执行规划**\n\
        1. 将咖啡机放置在工作台面上\n\
        2. 启动咖啡机\n\
        3. 取出咖啡";

    #[test]
    fn test_parse_chinese_plan() {
        let plan = parse_plan(SAMPLE).unwrap();
        assert_eq!(plan.acquisition, vec!["前往厨房台面，拿取咖啡机", "前往橱柜，取出咖啡杯"]);
        assert_eq!(plan.execution.len(), 3);
        assert_eq!(plan.execution[2], "取出咖啡");
        assert_eq!(plan.step_count(), 5);
    }

    #[test]
    fn test_parse_english_plan_with_preamble() {
        let text = "Sure! Here is the plan.\n\
            ### Phase 1: Object acquisition\n\
            - Pick up the sponge from the sink\n\
            ### Phase 2: Task execution\n\
            1) Wipe the table\n\
            2) Rinse the sponge";
        let plan = parse_plan(text).unwrap();
        assert_eq!(plan.acquisition, vec!["Pick up the sponge from the sink"]);
        assert_eq!(plan.execution, vec!["Wipe the table", "Rinse the sponge"]);
    }

    #[test]
    fn test_missing_execution_phase() {
        let text = "**阶段一：获取所需物品**\n1. 拿取海绵";
        assert_eq!(
            parse_plan(text),
            Err(PlanFormatError::MissingPhase(PlanPhase::Execution))
        );
    }

    #[test]
    fn test_empty_phase() {
        let text = "**阶段一：获取所需物品**\n**阶段二：分步执行规划**\n1. 擦桌子";
        assert_eq!(
            parse_plan(text),
            Err(PlanFormatError::EmptyPhase(PlanPhase::Acquisition))
        );
    }

    #[test]
    fn test_free_text_is_rejected() {
        assert!(parse_plan("I cannot help with that.").is_err());
    }
}

//! 会话内运行记录：保存每个任务的 TaskOutcome，并汇总耗时统计

use std::time::Duration;

use crate::core::TaskOutcome;

/// 汇总统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub tasks: usize,
    pub fallbacks: usize,
    pub grounded_objects: usize,
    pub avg_proposal: Duration,
    pub avg_planning: Duration,
}

/// 会话内的运行历史（只在内存中，退出即丢弃）
#[derive(Debug, Default)]
pub struct RunHistory {
    records: Vec<TaskOutcome>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: TaskOutcome) {
        self.records.push(outcome);
    }

    pub fn records(&self) -> &[TaskOutcome] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn stats(&self) -> RunStats {
        let tasks = self.records.len();
        if tasks == 0 {
            return RunStats::default();
        }
        let n = tasks as u32;
        RunStats {
            tasks,
            fallbacks: self.records.iter().filter(|r| r.used_fallback).count(),
            grounded_objects: self.records.iter().map(|r| r.grounded_count()).sum(),
            avg_proposal: self.records.iter().map(|r| r.proposal_elapsed).sum::<Duration>() / n,
            avg_planning: self.records.iter().map(|r| r.planning_elapsed).sum::<Duration>() / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;
    use uuid::Uuid;

    use super::*;
    use crate::grounding::{GroundedMatch, MatchKind};

    fn outcome(proposal_ms: u64, planning_ms: u64, fallback: bool) -> TaskOutcome {
        TaskOutcome {
            id: Uuid::new_v4(),
            started_at: Local::now(),
            task: "准备简单早餐".to_string(),
            proposals: vec!["bread".to_string()],
            matches: vec![GroundedMatch {
                proposal: "bread".to_string(),
                matched_object: (!fallback).then(|| "bread".to_string()),
                kind: if fallback { MatchKind::None } else { MatchKind::Exact },
            }],
            used_fallback: fallback,
            plan_objects: vec!["bread".to_string()],
            plan_text: String::new(),
            plan: None,
            actions: Vec::new(),
            proposal_elapsed: Duration::from_millis(proposal_ms),
            planning_elapsed: Duration::from_millis(planning_ms),
        }
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(RunHistory::new().stats(), RunStats::default());
    }

    #[test]
    fn test_stats_average() {
        let mut history = RunHistory::new();
        history.push(outcome(100, 300, false));
        history.push(outcome(300, 500, true));

        let stats = history.stats();
        assert_eq!(stats.tasks, 2);
        assert_eq!(stats.fallbacks, 1);
        assert_eq!(stats.grounded_objects, 1);
        assert_eq!(stats.avg_proposal, Duration::from_millis(200));
        assert_eq!(stats.avg_planning, Duration::from_millis(400));

        history.clear();
        assert!(history.is_empty());
    }
}

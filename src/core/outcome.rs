//! 单个任务的运行记录：提议、落地结果、计划文本、可执行操作提示与各阶段耗时

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::grounding::{GroundedMatch, InventoryError, InventorySnapshot};
use crate::planning::Plan;

/// 面向执行端的操作提示（只针对真正落地的物体，不含兜底物体）
#[derive(Debug, Clone, PartialEq)]
pub enum ActionHint {
    /// 导航到物体位置
    Navigate { object: String, position: [f64; 3] },
    /// 在来源图像中抓取物体
    Grasp { object: String, image_file: String },
}

impl ActionHint {
    /// 每个已落地物体依次生成 Navigate + Grasp；名字必须在清单中，否则返回 [`InventoryError::Missing`]
    pub fn for_objects(
        names: &[String],
        inventory: &InventorySnapshot,
    ) -> Result<Vec<ActionHint>, InventoryError> {
        let mut hints = Vec::with_capacity(names.len() * 2);
        for name in names {
            let obj = inventory.require(name)?;
            hints.push(ActionHint::Navigate {
                object: obj.id.clone(),
                position: obj.position,
            });
            hints.push(ActionHint::Grasp {
                object: obj.id.clone(),
                image_file: obj.image_file.clone(),
            });
        }
        Ok(hints)
    }
}

impl fmt::Display for ActionHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionHint::Navigate { object, position } => write!(
                f,
                "导航到 {}: 目标位置 ({:.2}, {:.2}, {:.2})",
                object, position[0], position[1], position[2]
            ),
            ActionHint::Grasp { object, image_file } if image_file.is_empty() => {
                write!(f, "抓取 {}: 无来源图像", object)
            }
            ActionHint::Grasp { object, image_file } => {
                write!(f, "抓取 {}: 在图像 {} 中检测到", object, image_file)
            }
        }
    }
}

/// 一次完整流水线运行的结果
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub id: Uuid,
    pub started_at: DateTime<Local>,
    pub task: String,
    /// 解析出的提议（保序、不去重）
    pub proposals: Vec<String>,
    /// 与 proposals 一一对应
    pub matches: Vec<GroundedMatch>,
    /// 落地集合为空时是否改用清单前 N 个物体
    pub used_fallback: bool,
    /// 实际交给规划器的物体名
    pub plan_objects: Vec<String>,
    /// 规划器原始输出，不做修改
    pub plan_text: String,
    /// 结构校验通过时的两阶段计划
    pub plan: Option<Plan>,
    pub actions: Vec<ActionHint>,
    pub proposal_elapsed: Duration,
    pub planning_elapsed: Duration,
}

impl TaskOutcome {
    pub fn grounded_count(&self) -> usize {
        self.matches.iter().filter(|m| m.is_grounded()).count()
    }

    pub fn total_elapsed(&self) -> Duration {
        self.proposal_elapsed + self.planning_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounding::inventory::tests::snapshot;

    #[test]
    fn test_hints_for_grounded_objects() {
        let inv = snapshot(&["mug", "Coffee Machine"]);
        let hints = ActionHint::for_objects(&["Coffee Machine".to_string()], &inv).unwrap();
        assert_eq!(hints.len(), 2);
        assert_eq!(
            hints[0].to_string(),
            "导航到 Coffee Machine: 目标位置 (0.25, -1.50, 0.75)"
        );
        assert_eq!(
            hints[1].to_string(),
            "抓取 Coffee Machine: 在图像 color_0001.jpg 中检测到"
        );
    }

    #[test]
    fn test_hints_reject_unknown_object() {
        let inv = snapshot(&["mug"]);
        let err = ActionHint::for_objects(&["mug".to_string(), "ghost".to_string()], &inv)
            .unwrap_err();
        assert!(matches!(err, InventoryError::Missing(id) if id == "ghost"));
    }

    #[test]
    fn test_grasp_without_image() {
        let hint = ActionHint::Grasp {
            object: "cup".to_string(),
            image_file: String::new(),
        };
        assert_eq!(hint.to_string(), "抓取 cup: 无来源图像");
    }
}

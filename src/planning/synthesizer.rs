//! 分阶段规划：把任务与可用物体嵌入结构化 prompt，交给后端生成两阶段计划文本
//!
//! 返回后端原始文本，不做结构校验；需要结构化结果时调用 [`crate::planning::parse_plan`]。

use std::sync::Arc;

use crate::llm::{BackendError, GenerativeBackend};

/// 没有任何可用物体时写入 prompt 的占位
pub const NO_OBJECTS_MARKER: &str = "no specific objects";
pub const ACQUISITION_HEADER: &str = "**阶段一：获取所需物品**";
pub const EXECUTION_HEADER: &str = "**阶段二：分步执行规划**";

/// prompt 中任务与物体所在行的前缀
pub const TASK_PREFIX: &str = "Task: ";
pub const OBJECTS_PREFIX: &str = "Available objects: ";

/// 物体列表行：逗号拼接，空列表用 [`NO_OBJECTS_MARKER`]
pub fn objects_line(names: &[String]) -> String {
    if names.is_empty() {
        NO_OBJECTS_MARKER.to_string()
    } else {
        names.join(", ")
    }
}

/// 构建规划 prompt：格式说明 + 示例（示例偏向固定的两阶段格式）
pub fn build_plan_prompt(task: &str, names: &[String]) -> String {
    format!(
        r#"You are a helpful robot assistant. Given a task and available objects, provide a structured plan with two phases: object acquisition and task execution.

{TASK_PREFIX}{task}
{OBJECTS_PREFIX}{objects}

Please provide a structured plan following this format:

{ACQUISITION_HEADER}
1. [具体描述需要获取的第一个物品及其位置]
2. [具体描述需要获取的第二个物品及其位置]
...

{EXECUTION_HEADER}
1. [使用已获取物品的第一个执行步骤]
2. [使用已获取物品的第二个执行步骤]
...

Example format:
{ACQUISITION_HEADER}
1. 前往厨房台面，拿取咖啡机
2. 前往橱柜，取出咖啡杯
3. 前往储物柜，获取咖啡豆
4. 前往水槽，准备清水

{EXECUTION_HEADER}
1. 将咖啡机放置在合适的工作台面上
2. 检查咖啡机电源连接
3. 在咖啡机中加入适量清水
4. 将咖啡豆放入咖啡机的豆仓中
5. 将咖啡杯放在咖啡机出水口下方
6. 启动咖啡机开始制作咖啡
7. 等待咖啡制作完成
8. 取出制作好的咖啡

Now provide the structured plan for the given task:
"#,
        objects = objects_line(names),
    )
}

/// 规划合成器：持有后端句柄（调用方所有，可与提议阶段共享）
pub struct PlanSynthesizer {
    backend: Arc<dyn GenerativeBackend>,
}

impl PlanSynthesizer {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// 生成计划文本；names 为空时仍会调用后端（物体行写入占位）
    pub async fn synthesize(&self, task: &str, names: &[String]) -> Result<String, BackendError> {
        let prompt = build_plan_prompt(task, names);
        tracing::debug!(task, objects = %objects_line(names), "Synthesizing plan");
        self.backend.generate(&prompt).await
    }
}

//! 规划层：两阶段计划 prompt 合成与可选的结构校验

pub mod synthesizer;
pub mod validator;

pub use synthesizer::{
    build_plan_prompt, objects_line, PlanSynthesizer, ACQUISITION_HEADER, EXECUTION_HEADER,
    NO_OBJECTS_MARKER, OBJECTS_PREFIX, TASK_PREFIX,
};
pub use validator::{parse_plan, Plan, PlanFormatError, PlanPhase};

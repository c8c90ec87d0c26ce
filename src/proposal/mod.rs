//! 物体提议：few-shot Prompt 构建与模型回复解析

pub mod parser;
pub mod prompt;

pub use parser::parse_response;
pub use prompt::{lookup_exemplar, task_line, PromptBuilder, DEFAULT_EXEMPLARS, OBJECT_QUERY_SUFFIX};

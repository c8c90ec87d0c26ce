//! 物体提议 Prompt：固定的 few-shot 示例 + 当前任务行
//!
//! 示例语料默认内置（中英文任务各一组）；可用 `config/prompts/exemplars.txt` 或配置项
//! `pipeline.exemplars_path` 覆盖。

use std::path::Path;

/// 内置 few-shot 示例语料，每行一条「任务 → 物体」
pub const DEFAULT_EXEMPLARS: &str = include_str!("exemplars.txt");

/// 任务行的固定句式尾部，模型需要补全冒号后的物体列表
pub const OBJECT_QUERY_SUFFIX: &str = "may involve the following objects:";

/// 格式化任务行：`The task '<task>' may involve the following objects:`
pub fn task_line(task: &str) -> String {
    format!("The task '{task}' {OBJECT_QUERY_SUFFIX}")
}

/// 在示例语料中查找与 task 完全一致的示例，返回冒号后的答案部分（含前导空格）
pub fn lookup_exemplar<'a>(exemplars: &'a str, task: &str) -> Option<&'a str> {
    let prefix = task_line(task);
    exemplars
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
}

/// Prompt 构建器：纯函数式，不持有任何可变状态
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    exemplars: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::with_exemplars(DEFAULT_EXEMPLARS)
    }

    /// 使用自定义示例语料；末尾补齐换行，保证任务行单独成行
    pub fn with_exemplars(exemplars: impl Into<String>) -> Self {
        let mut exemplars = exemplars.into();
        if !exemplars.is_empty() && !exemplars.ends_with('\n') {
            exemplars.push('\n');
        }
        Self { exemplars }
    }

    /// 依次尝试：显式路径 → config/prompts/exemplars.txt → ../config/prompts/exemplars.txt → 内置语料
    pub fn from_file_or_default(path: Option<&Path>) -> Self {
        let explicit = path.and_then(|p| match std::fs::read_to_string(p) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("Exemplar file {} unreadable ({}), falling back", p.display(), e);
                None
            }
        });

        explicit
            .or_else(|| {
                [
                    "config/prompts/exemplars.txt",
                    "../config/prompts/exemplars.txt",
                ]
                .into_iter()
                .find_map(|p| std::fs::read_to_string(p).ok())
            })
            .filter(|s| !s.trim().is_empty())
            .map(Self::with_exemplars)
            .unwrap_or_default()
    }

    pub fn exemplars(&self) -> &str {
        &self.exemplars
    }

    /// 构建提议 prompt。task 非空由调用方保证
    pub fn build(&self, task: &str) -> String {
        format!("{}{}", self.exemplars, task_line(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_ends_with_task_line() {
        let prompt = PromptBuilder::new().build("help me prepare coffee");
        assert!(prompt.starts_with("The task 'hold the snickers'"));
        assert!(prompt.ends_with(
            "\nThe task 'help me prepare coffee' may involve the following objects:"
        ));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new();
        assert_eq!(builder.build("wipe the desk"), builder.build("wipe the desk"));
    }

    #[test]
    fn test_custom_exemplars_get_trailing_newline() {
        let builder = PromptBuilder::with_exemplars(
            "The task 'go to the fridge' may involve the following objects: fridge.",
        );
        assert_eq!(
            builder.build("open the door"),
            "The task 'go to the fridge' may involve the following objects: fridge.\n\
             The task 'open the door' may involve the following objects:"
        );
    }

    #[test]
    fn test_lookup_exemplar() {
        assert_eq!(
            lookup_exemplar(DEFAULT_EXEMPLARS, "wipe the table"),
            Some(" table, napkin, sponge, towel, cloth.")
        );
        assert_eq!(lookup_exemplar(DEFAULT_EXEMPLARS, "fly to the moon"), None);
    }

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let builder = PromptBuilder::from_file_or_default(Some(Path::new("/nonexistent/ex.txt")));
        assert!(builder.exemplars().contains("coffee machine"));
    }
}

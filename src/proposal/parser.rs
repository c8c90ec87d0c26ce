//! 模型回复解析：从任意生成文本中抽取有序的物体名列表
//!
//! 纯函数，不依赖后端，输入相同则输出相同。解析失败不报错，只会得到空列表。
//!
//! 规则：
//! 1. 取第一行为主候选；含 `:` 时取第一个冒号之后的部分，否则取整行
//! 2. 去掉一个句末标点
//! 3. 若结果为空或不足 3 个字符，在随后两行里找第一条含 `:` 且不以 `The task` 开头的行代替
//! 4. 按 `,` 切分；丢弃含示例回显标记（`The task` / `may involve`）或超过 50 字符的片段
//! 5. 去掉一个前导连词/冠词（and / or / the / a / an）
//! 6. 仅保留 2..=30 字符的物体名，保持原顺序，不去重

const SEPARATOR: char = ':';
const ECHO_PREFIX: &str = "The task";
const ECHO_MARKERS: [&str; 2] = ["The task", "may involve"];
const LEADING_FILLERS: [&str; 5] = ["and", "or", "the", "a", "an"];

/// 主候选不足该长度时尝试后续行
const MIN_SEGMENT_CHARS: usize = 3;
/// 主候选之后最多检查的行数
const FALLBACK_LINES: usize = 2;
/// 超过该长度的片段视为示例文本泄漏
const MAX_RAW_TOKEN_CHARS: usize = 50;
const MIN_NAME_CHARS: usize = 2;
const MAX_NAME_CHARS: usize = 30;

/// 解析模型回复，返回物体名列表（可能为空）
pub fn parse_response(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let first = lines.first().copied().unwrap_or("");

    let mut segment = answer_segment(first);
    if segment.chars().count() < MIN_SEGMENT_CHARS {
        let fallback = lines
            .iter()
            .skip(1)
            .take(FALLBACK_LINES)
            .find(|line| {
                !line.is_empty() && !line.starts_with(ECHO_PREFIX) && line.contains(SEPARATOR)
            });
        if let Some(line) = fallback {
            segment = answer_segment(line);
        }
    }

    segment
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| !is_echo(token))
        .map(|token| strip_leading_filler(token).trim())
        .filter(|name| (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&name.chars().count()))
        .map(String::from)
        .collect()
}

/// 冒号后的部分（无冒号则整行），去空白与一个句末标点
fn answer_segment(line: &str) -> &str {
    let segment = line
        .split_once(SEPARATOR)
        .map(|(_, rest)| rest)
        .unwrap_or(line)
        .trim();
    strip_terminator(segment)
}

fn strip_terminator(segment: &str) -> &str {
    segment
        .strip_suffix('.')
        .or_else(|| segment.strip_suffix('。'))
        .unwrap_or(segment)
}

fn is_echo(token: &str) -> bool {
    ECHO_MARKERS.iter().any(|marker| token.contains(marker))
        || token.chars().count() > MAX_RAW_TOKEN_CHARS
}

/// 去掉一个前导连词/冠词（大小写不敏感，后面须跟空白）
fn strip_leading_filler(token: &str) -> &str {
    match token.split_once(char::is_whitespace) {
        Some((head, rest))
            if LEADING_FILLERS
                .iter()
                .any(|filler| head.eq_ignore_ascii_case(filler)) =>
        {
            rest
        }
        _ => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_echoed_task_sentence() {
        let raw = "The task 'X' may involve the following objects: table, napkin, sponge.";
        assert_eq!(parse_response(raw), names(&["table", "napkin", "sponge"]));
    }

    #[test]
    fn test_leading_conjunction_stripped() {
        assert_eq!(
            parse_response("X: mug, kettle, and coffee beans."),
            names(&["mug", "kettle", "coffee beans"])
        );
        assert_eq!(
            parse_response(" The cup, An apple, or spoon"),
            names(&["cup", "apple", "spoon"])
        );
    }

    #[test]
    fn test_single_letter_objects_dropped() {
        // 单字符 token 一律丢弃，连词剥离后的 "c" 也不例外
        assert!(parse_response("X: a, b, and c.").is_empty());
    }

    #[test]
    fn test_only_one_filler_stripped() {
        assert_eq!(parse_response("objects: and the cup"), names(&["the cup"]));
    }

    #[test]
    fn test_filler_needs_following_whitespace() {
        assert_eq!(parse_response("another cup, android"), names(&["another cup", "android"]));
    }

    #[test]
    fn test_empty_first_line_without_separator() {
        assert!(parse_response("\ncup mug kettle\nsome more words").is_empty());
    }

    #[test]
    fn test_empty_first_line_with_fallback() {
        assert_eq!(
            parse_response("\nObjects: fridge, apple.\nignored: x"),
            names(&["fridge", "apple"])
        );
    }

    #[test]
    fn test_fallback_skips_echo_lines() {
        let raw = "ok\nThe task 'x' may involve the following objects: a1, b2\nAnswer: bowl, grape";
        assert_eq!(parse_response(raw), names(&["bowl", "grape"]));
    }

    #[test]
    fn test_fallback_looks_at_two_lines_only() {
        let raw = "\n\n\nAnswer: bowl, grape";
        assert!(parse_response(raw).is_empty());
    }

    #[test]
    fn test_echo_only_output_is_empty() {
        let raw = "The task 'clean the room' may involve the following objects:\n\
                   The task 'wipe the table' may involve the following objects:\n\
                   The task 'go to the fridge' may involve the following objects";
        assert!(parse_response(raw).is_empty());

        let single = "The task 'find a coffee machine' may involve the following objects";
        assert!(parse_response(single).is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_response("").is_empty());
        assert!(parse_response("   \n  ").is_empty());
    }

    #[test]
    fn test_length_limits() {
        let long = "x".repeat(31);
        let exact = "y".repeat(30);
        let raw = format!("objects: a, ok, {long}, {exact}");
        assert_eq!(parse_response(&raw), vec!["ok".to_string(), exact]);
    }

    #[test]
    fn test_overlong_raw_token_discarded() {
        let leak = "w".repeat(51);
        let raw = format!("objects: {leak}, cup");
        assert_eq!(parse_response(&raw), names(&["cup"]));
    }

    #[test]
    fn test_duplicates_preserved() {
        assert_eq!(
            parse_response("objects: cup, Cup, cup"),
            names(&["cup", "Cup", "cup"])
        );
    }

    #[test]
    fn test_single_terminator_stripped() {
        assert_eq!(parse_response("objects: cup, mug.."), names(&["cup", "mug."]));
        assert_eq!(parse_response("物体: 杯子, 咖啡机。"), names(&["杯子", "咖啡机"]));
    }

    #[test]
    fn test_only_first_separator_splits() {
        assert_eq!(parse_response("objects: clock: wall, watch"), names(&["clock: wall", "watch"]));
    }

    #[test]
    fn test_crlf_lines() {
        assert_eq!(
            parse_response("\r\nAnswer: towel, soap\r\n"),
            names(&["towel", "soap"])
        );
    }

    #[test]
    fn test_deterministic() {
        let raw = "objects: pasta, pot, water, stove";
        assert_eq!(parse_response(raw), parse_response(raw));
    }
}

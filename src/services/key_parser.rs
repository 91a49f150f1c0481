//! 文本答案解析 - 业务能力层
//!
//! 支持三种写法，按顺序尝试：
//! 1. 编号格式：`1:A, 2=B, 3-C`
//! 2. 紧凑格式：`ABCDABCD`，每个字符一题，`N` 表示未设答案（可夹杂空格、逗号、分号）
//! 3. 分隔格式：按空白或逗号切分，依次对应第 1、2、3... 题
//!
//! 任何无法识别的记号都按 `NA` 处理，不会返回错误。

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{AnswerMapping, AnswerOutcome, QuestionCount};

static NUMBERED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*[:=\-]\s*(HALF|NA|[A-D])").expect("编号答案正则非法")
});

/// 文本答案的格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Empty,
    Numbered,
    Dense,
    Delimited,
}

/// 将文本答案解析为覆盖全部题目的映射
pub fn parse_answer_key(text: &str, count: QuestionCount) -> AnswerMapping {
    parse_answer_key_with_format(text, count).0
}

/// 解析文本答案，同时返回识别出的格式
pub fn parse_answer_key_with_format(
    text: &str,
    count: QuestionCount,
) -> (AnswerMapping, KeyFormat) {
    let mut key = AnswerMapping::new(count);
    let raw = text.trim();

    if raw.is_empty() {
        return (key, KeyFormat::Empty);
    }

    // 编号格式，后出现的同题号覆盖先出现的
    let pairs = numbered_pairs(raw);
    if !pairs.is_empty() {
        let applied = pairs
            .into_iter()
            .filter(|(question, outcome)| key.set(*question, *outcome))
            .count();
        debug!("答案按编号格式解析，有效条目 {} 个", applied);
        return (key, KeyFormat::Numbered);
    }

    if let Some(tokens) = dense_tokens(raw) {
        if tokens.len() >= count.get() {
            for (idx, outcome) in tokens.into_iter().take(count.get()).enumerate() {
                key.set(idx + 1, outcome);
            }
            debug!("答案按紧凑格式解析");
            return (key, KeyFormat::Dense);
        }
    }

    let tokens = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|tok| !tok.is_empty())
        .take(count.get());
    for (idx, tok) in tokens.enumerate() {
        key.set(idx + 1, AnswerOutcome::from_token(tok));
    }
    debug!("答案按分隔格式解析");
    (key, KeyFormat::Delimited)
}

/// 提取所有 `题号 分隔符 答案` 对
///
/// 答案后紧跟字母的匹配（如 `1:Apple`）不算数。
fn numbered_pairs(text: &str) -> Vec<(usize, AnswerOutcome)> {
    NUMBERED_PAIR
        .captures_iter(text)
        .filter(|caps| {
            let end = caps.get(0).map_or(0, |m| m.end());
            !text[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
        })
        .filter_map(|caps| {
            let question = caps[1].parse::<usize>().ok()?;
            Some((question, AnswerOutcome::from_token(&caps[2])))
        })
        .collect()
}

/// 紧凑格式的记号序列，每个非分隔字符对应一题，`N` 表示 `NA`
///
/// 出现选项字母、`N` 和分隔符以外的字符时返回 `None`。
fn dense_tokens(text: &str) -> Option<Vec<AnswerOutcome>> {
    text.chars()
        .filter(|c| !(c.is_whitespace() || *c == ',' || *c == ';'))
        .map(|c| match AnswerOutcome::from_option_char(c) {
            Some(option) => Some(option),
            None if c.eq_ignore_ascii_case(&'N') => Some(AnswerOutcome::Na),
            None => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnswerOutcome::*;

    fn count(n: usize) -> QuestionCount {
        QuestionCount::new(n).unwrap()
    }

    fn outcomes(mapping: &AnswerMapping) -> Vec<AnswerOutcome> {
        mapping.iter().map(|(_, o)| o).collect()
    }

    #[test]
    fn test_numbered_form() {
        let (key, format) = parse_answer_key_with_format("1:A, 2=C, 3-B", count(3));
        assert_eq!(format, KeyFormat::Numbered);
        assert_eq!(outcomes(&key), vec![A, C, B]);
    }

    #[test]
    fn test_numbered_form_last_wins_and_ignores_out_of_range() {
        let key = parse_answer_key("2:a 1 : d 2 = b 9:C 0:A", count(3));
        assert_eq!(outcomes(&key), vec![D, B, Na]);
    }

    #[test]
    fn test_numbered_form_accepts_na_and_half() {
        let key = parse_answer_key("1:NA\n2:half\n3:C", count(3));
        assert_eq!(outcomes(&key), vec![Na, Half, C]);
    }

    #[test]
    fn test_numbered_form_skips_words() {
        // "1:Apple" 不是编号答案，退回到分隔格式
        let key = parse_answer_key("1:Apple", count(2));
        assert_eq!(outcomes(&key), vec![Na, Na]);
    }

    #[test]
    fn test_dense_form() {
        let (key, format) = parse_answer_key_with_format("ABCD", count(4));
        assert_eq!(format, KeyFormat::Dense);
        assert_eq!(outcomes(&key), vec![A, B, C, D]);
    }

    #[test]
    fn test_dense_form_one_question_per_character() {
        let (key, format) = parse_answer_key_with_format("BNAD", count(4));
        assert_eq!(format, KeyFormat::Dense);
        assert_eq!(outcomes(&key), vec![B, Na, A, D]);

        let key = parse_answer_key("ANA", count(3));
        assert_eq!(outcomes(&key), vec![A, Na, A]);
    }

    #[test]
    fn test_dense_form_with_separators() {
        let key = parse_answer_key("ab, N; dc n", count(6));
        assert_eq!(outcomes(&key), vec![A, B, Na, D, C, Na]);
    }

    #[test]
    fn test_dense_form_extra_characters_ignored() {
        let key = parse_answer_key("ABCDA", count(3));
        assert_eq!(outcomes(&key), vec![A, B, C]);
    }

    #[test]
    fn test_short_dense_falls_back_to_delimited() {
        let (key, format) = parse_answer_key_with_format("AB CD", count(5));
        assert_eq!(format, KeyFormat::Delimited);
        assert_eq!(outcomes(&key), vec![Na, Na, Na, Na, Na]);
    }

    #[test]
    fn test_delimited_form() {
        let (key, format) = parse_answer_key_with_format("A\nB, x\n\nD", count(5));
        assert_eq!(format, KeyFormat::Delimited);
        assert_eq!(outcomes(&key), vec![A, B, Na, D, Na]);
    }

    #[test]
    fn test_delimited_form_ignores_extra_tokens() {
        let key = parse_answer_key("A B C D E F G", count(2));
        assert_eq!(key.len(), 2);
        assert_eq!(outcomes(&key), vec![A, B]);
    }

    #[test]
    fn test_empty_text_is_all_na() {
        let (key, format) = parse_answer_key_with_format("", count(5));
        assert_eq!(format, KeyFormat::Empty);
        assert_eq!(key.count_of(Na), 5);

        let key = parse_answer_key("   \n\t", count(2));
        assert_eq!(outcomes(&key), vec![Na, Na]);
    }

    #[test]
    fn test_mapping_is_total_for_every_count() {
        for n in [1, 7, 40, 300] {
            let key = parse_answer_key("1:A 5:B garbage", count(n));
            assert_eq!(key.len(), n);
        }
    }
}

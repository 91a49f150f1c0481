//! 模型响应规范化 - 业务能力层
//!
//! 把模型返回的原始文本转换为覆盖全部题目的 [`AnswerMapping`]。
//!
//! ## 处理步骤
//! 1. 提取 JSON 对象：整体解析 → 代码块解析 → 花括号扫描，全部失败才报错
//! 2. 定位答案：`answers` 对象 / `answers` 数组 / 顶层题号对象
//! 3. 逐题规范化：先转换为 [`RawEntry`]，再统一映射到 `A-D / NA / HALF`
//!
//! 数据形状异常（缺题、多选、非法选项、类型不对）一律得到 `NA`，不会报错。

use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::ExtractionError;
use crate::models::{AnswerMapping, AnswerOutcome, QuestionCount, QuestionRange};
use crate::utils::logging::truncate_text;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("代码块正则非法"));

/// 表示"该选项被涂了一半"的对象字段
const HALF_FLAG_KEYS: [&str; 4] = ["half", "half_filled", "halfFilled", "partial"];

/// 对象形式条目中存放选项的字段，按顺序取第一个
const MARK_KEYS: [&str; 6] = ["marks", "options", "answer", "answers", "selected", "value"];

/// 单题原始条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEntry {
    /// 没有该题，或值为 null
    Absent,
    /// 单个字符串，如 `"A"`、`"half-B"`、`"A,C"`
    Single(String),
    /// 字符串数组，如 `["A"]`、`["B","D"]`、`[]`
    List(Vec<String>),
    /// 带半涂标记的对象，如 `{"half": true, "marks": ["A"]}`
    Flagged { half: bool, marks: Vec<String> },
    /// 数字、布尔值或无法理解的对象
    Malformed,
}

impl RawEntry {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => Self::Single(s.clone()),
            Some(Value::Array(items)) => Self::List(strings_of(items)),
            Some(Value::Object(obj)) => {
                let half = HALF_FLAG_KEYS
                    .iter()
                    .any(|k| matches!(obj.get(*k), Some(Value::Bool(true))));
                let marks = MARK_KEYS.iter().find_map(|k| match obj.get(*k) {
                    Some(Value::String(s)) => Some(vec![s.clone()]),
                    Some(Value::Array(items)) => Some(strings_of(items)),
                    _ => None,
                });
                match (half, marks) {
                    (false, None) => Self::Malformed,
                    (half, marks) => Self::Flagged {
                        half,
                        marks: marks.unwrap_or_default(),
                    },
                }
            }
            Some(Value::Bool(_)) | Some(Value::Number(_)) => Self::Malformed,
        }
    }

    /// 规范化为单题结果
    pub fn resolve(&self) -> AnswerOutcome {
        match self {
            Self::Absent | Self::Malformed => AnswerOutcome::Na,
            Self::Single(text) => {
                let parts: Vec<String> = text.split([',', '|']).map(str::to_string).collect();
                resolve_marks(&parts)
            }
            Self::List(items) => resolve_marks(items),
            Self::Flagged { half: true, .. } => AnswerOutcome::Half,
            Self::Flagged { half: false, marks } => resolve_marks(marks),
        }
    }
}

/// 单个涂卡记号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Filled(AnswerOutcome),
    Half,
    Blank,
    Invalid,
}

fn classify_mark(text: &str) -> Mark {
    let upper = text.trim().to_ascii_uppercase();
    match upper.as_str() {
        "" | "NA" | "N/A" | "NONE" | "-" => Mark::Blank,
        "HALF" => Mark::Half,
        _ => {
            if let Some(rest) = upper.strip_prefix("HALF") {
                let rest = rest.trim_start_matches(['-', '_', ' ', ':']);
                return match single_option(rest) {
                    Some(_) => Mark::Half,
                    None => Mark::Invalid,
                };
            }
            single_option(&upper).map_or(Mark::Invalid, Mark::Filled)
        }
    }
}

fn single_option(text: &str) -> Option<AnswerOutcome> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => AnswerOutcome::from_option_char(c),
        _ => None,
    }
}

/// 记号组合规则：
/// - 恰好一个不同的选项且没有半涂 → 该选项
/// - 没有选项但有半涂 → `HALF`
/// - 其余（空、多选、选项与半涂混合、全部非法）→ `NA`
fn resolve_marks(items: &[String]) -> AnswerOutcome {
    let mut filled = BTreeSet::new();
    let mut halves = 0usize;

    for item in items {
        match classify_mark(item) {
            Mark::Filled(option) => {
                filled.insert(option.as_str());
            }
            Mark::Half => halves += 1,
            Mark::Blank | Mark::Invalid => {}
        }
    }

    match (filled.len(), halves) {
        (1, 0) => filled
            .first()
            .map_or(AnswerOutcome::Na, |s| AnswerOutcome::from_token(s)),
        (0, h) if h > 0 => AnswerOutcome::Half,
        _ => AnswerOutcome::Na,
    }
}

fn strings_of(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

// ========== JSON 提取 ==========

/// 从模型响应中提取第一个 JSON 对象
pub fn extract_json_object(
    raw: &str,
    range: QuestionRange,
) -> Result<Map<String, Value>, ExtractionError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractionError::EmptyResponse {
            range: range.to_string(),
        });
    }

    if let Some(obj) = parse_object(text) {
        return Ok(obj);
    }

    for caps in FENCED_BLOCK.captures_iter(text) {
        if let Some(obj) = parse_object(caps[1].trim()) {
            debug!("从代码块中提取到 JSON (题目 {})", range);
            return Ok(obj);
        }
    }

    for (start, _) in text.match_indices('{') {
        let candidate = &text[start..];
        if let Some(end) = matching_brace(candidate) {
            if let Some(obj) = parse_object(&candidate[..=end]) {
                debug!("通过花括号扫描提取到 JSON (题目 {})", range);
                return Ok(obj);
            }
        }
    }

    Err(ExtractionError::NoJsonObject {
        range: range.to_string(),
        preview: truncate_text(text, 80),
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(obj)) => Some(obj),
        _ => None,
    }
}

/// 返回与开头 `{` 配对的 `}` 的字节位置，忽略字符串内的括号
fn matching_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

// ========== 答案定位 ==========

enum AnswersPayload<'a> {
    Keyed(&'a Map<String, Value>),
    Positional(&'a [Value]),
    Missing,
}

fn locate_answers(root: &Map<String, Value>) -> AnswersPayload<'_> {
    let answers = root
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("answers"))
        .map(|(_, v)| v);

    match answers {
        Some(Value::Object(map)) => AnswersPayload::Keyed(map),
        Some(Value::Array(items)) => AnswersPayload::Positional(items),
        Some(_) => AnswersPayload::Missing,
        None if root.keys().any(|k| parse_question_key(k).is_some()) => AnswersPayload::Keyed(root),
        None => AnswersPayload::Missing,
    }
}

/// 解析 `"1"`、`"01"`、`"Q1"` 这类题号
fn parse_question_key(key: &str) -> Option<usize> {
    key.trim()
        .trim_start_matches(['Q', 'q'])
        .trim()
        .parse()
        .ok()
}

/// 把题号对象整理为 `题号 → 值`，只保留区间内的题号
///
/// 同一题号有多种写法时，标准写法（如 `"1"`）优先。
fn keyed_entries(map: &Map<String, Value>, range: QuestionRange) -> HashMap<usize, &Value> {
    let mut entries = HashMap::new();
    let mut canonical = Vec::new();

    for (key, value) in map {
        let Some(question) = parse_question_key(key).filter(|q| range.contains(*q)) else {
            continue;
        };
        if *key == question.to_string() {
            canonical.push((question, value));
        } else {
            entries.entry(question).or_insert(value);
        }
    }
    entries.extend(canonical);

    entries
}

// ========== 批次规范化 ==========

/// 一个批次的规范化结果，`outcomes[i]` 对应题号 `range.start + i`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAnswers {
    pub range: QuestionRange,
    pub outcomes: Vec<AnswerOutcome>,
}

/// 规范化一个批次的模型响应
///
/// 找不到 JSON 对象时返回错误；其余异常都落为 `NA`。
pub fn normalize_batch(raw: &str, range: QuestionRange) -> Result<BatchAnswers, ExtractionError> {
    let root = extract_json_object(raw, range)?;

    let outcomes: Vec<AnswerOutcome> = match locate_answers(&root) {
        AnswersPayload::Keyed(map) => {
            let entries = keyed_entries(map, range);
            range
                .iter()
                .map(|q| RawEntry::from_value(entries.get(&q).copied()).resolve())
                .collect()
        }
        AnswersPayload::Positional(items) => (0..range.len())
            .map(|i| RawEntry::from_value(items.get(i)).resolve())
            .collect(),
        AnswersPayload::Missing => {
            warn!("模型响应中没有 answers 字段 (题目 {})，全部按 NA 处理", range);
            vec![AnswerOutcome::Na; range.len()]
        }
    };

    debug!(
        "批次 {} 规范化完成: 有效 {} | NA {} | 半涂 {}",
        range,
        outcomes.iter().filter(|o| o.is_option()).count(),
        outcomes.iter().filter(|o| **o == AnswerOutcome::Na).count(),
        outcomes.iter().filter(|o| **o == AnswerOutcome::Half).count(),
    );

    Ok(BatchAnswers { range, outcomes })
}

/// 按题号合并各批次结果，未覆盖的题号为 `NA`
///
/// 合并顺序只取决于区间起点，与批次完成顺序无关。
pub fn merge_batches(mut batches: Vec<BatchAnswers>, count: QuestionCount) -> AnswerMapping {
    batches.sort_by_key(|b| b.range);

    let mut mapping = AnswerMapping::new(count);
    for batch in &batches {
        for (offset, outcome) in batch.outcomes.iter().enumerate() {
            mapping.set(batch.range.start + offset, *outcome);
        }
    }
    mapping
}

/// 把整卷的单次响应规范化为完整映射
pub fn normalize(raw: &str, count: QuestionCount) -> Result<AnswerMapping, ExtractionError> {
    let batch = normalize_batch(raw, count.full_range())?;
    Ok(merge_batches(vec![batch], count))
}

/// 规范化多个批次的响应并合并，任何一个批次失败则整体失败
pub fn normalize_batches(
    responses: &[(QuestionRange, String)],
    count: QuestionCount,
) -> Result<AnswerMapping, ExtractionError> {
    let batches = responses
        .iter()
        .map(|(range, raw)| normalize_batch(raw, *range))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(merge_batches(batches, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use AnswerOutcome::*;

    fn count(n: usize) -> QuestionCount {
        QuestionCount::new(n).unwrap()
    }

    fn resolve(value: Value) -> AnswerOutcome {
        RawEntry::from_value(Some(&value)).resolve()
    }

    fn outcomes(mapping: &AnswerMapping) -> Vec<AnswerOutcome> {
        mapping.iter().map(|(_, o)| o).collect()
    }

    #[test]
    fn test_ambiguity_collapse() {
        assert_eq!(resolve(json!(["A", "C"])), Na);
        assert_eq!(resolve(json!([])), Na);
        assert_eq!(resolve(json!(["A"])), A);
        assert_eq!(resolve(json!("B")), B);
        assert_eq!(resolve(json!("A,C")), Na);
        assert_eq!(resolve(json!(["b", "B"])), B);
    }

    #[test]
    fn test_half_fill_marks() {
        assert_eq!(resolve(json!(["half-A"])), Half);
        assert_eq!(resolve(json!("HALF")), Half);
        assert_eq!(resolve(json!(["HALF_C", "half-D"])), Half);
        assert_eq!(resolve(json!(["A", "half-B"])), Na);
        assert_eq!(resolve(json!({"half": true, "marks": ["C"]})), Half);
        assert_eq!(resolve(json!({"half": false, "marks": ["C"]})), C);
        assert_eq!(resolve(json!(["halfway"])), Na);
    }

    #[test]
    fn test_invalid_shapes_fold_to_na() {
        assert_eq!(RawEntry::from_value(None).resolve(), Na);
        assert_eq!(resolve(Value::Null), Na);
        assert_eq!(resolve(json!(3)), Na);
        assert_eq!(resolve(json!(true)), Na);
        assert_eq!(resolve(json!({"foo": "A"})), Na);
        assert_eq!(resolve(json!("E")), Na);
        assert_eq!(resolve(json!(["E", "A"])), A);
        assert_eq!(resolve(json!([1, "D"])), D);
        assert_eq!(resolve(json!("NA")), Na);
        assert_eq!(resolve(json!("N/A")), Na);
    }

    #[test]
    fn test_normalize_plain_json() {
        let raw = r#"{"answers": {"1": ["A"], "2": ["B","D"], "3": [], "4": ["half-A"], "5": "C"}}"#;
        let mapping = normalize(raw, count(6)).unwrap();
        assert_eq!(outcomes(&mapping), vec![A, Na, Na, Half, C, Na]);
    }

    #[test]
    fn test_normalize_fenced_json_with_commentary() {
        let raw = "Here are the answers:\n```json\n{\"answers\": {\"1\": \"D\", \"2\": [\"C\"]}}\n```\nLet me know!";
        let mapping = normalize(raw, count(2)).unwrap();
        assert_eq!(outcomes(&mapping), vec![D, C]);
    }

    #[test]
    fn test_normalize_brace_scan() {
        let raw = r#"Sure {not json} result: {"answers": {"1": "B", "2": "{weird}"}} done"#;
        let mapping = normalize(raw, count(2)).unwrap();
        assert_eq!(outcomes(&mapping), vec![B, Na]);
    }

    #[test]
    fn test_normalize_without_json_fails() {
        let err = normalize("I cannot read this image.", count(3)).unwrap_err();
        assert!(matches!(err, ExtractionError::NoJsonObject { .. }));

        let err = normalize("   ", count(3)).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyResponse { .. }));
    }

    #[test]
    fn test_normalize_alternative_payload_shapes() {
        let top_level = normalize(r#"{"1": "A", "Q2": ["B"], "03": "C"}"#, count(3)).unwrap();
        assert_eq!(outcomes(&top_level), vec![A, B, C]);

        let positional = normalize(r#"{"answers": ["A", [], "half-D"]}"#, count(4)).unwrap();
        assert_eq!(outcomes(&positional), vec![A, Na, Half, Na]);

        let missing = normalize(r#"{"result": "ok"}"#, count(2)).unwrap();
        assert_eq!(outcomes(&missing), vec![Na, Na]);
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        let mapping = normalize(r#"{"answers": {"01": "A", "1": "B"}}"#, count(1)).unwrap();
        assert_eq!(outcomes(&mapping), vec![B]);
    }

    #[test]
    fn test_out_of_range_entries_ignored() {
        let raw = r#"{"answers": {"0": "A", "2": "B", "9": "C"}}"#;
        let batch = normalize_batch(raw, QuestionRange::new(1, 4)).unwrap();
        assert_eq!(batch.outcomes, vec![Na, B, Na]);
    }

    #[test]
    fn test_renormalizing_canonical_mapping_is_identity() {
        let mut mapping = AnswerMapping::new(count(6));
        for (q, o) in [(1, A), (2, B), (3, C), (4, D), (5, Half)] {
            mapping.set(q, o);
        }
        let raw = mapping.to_answers_json().to_string();
        assert_eq!(normalize(&raw, count(6)).unwrap(), mapping);
    }

    #[test]
    fn test_batch_merge_matches_single_batch() {
        let options = ["A", "B", "C", "D"];
        let full: Map<String, Value> = (1..=80)
            .map(|q| (q.to_string(), json!([options[q % 4]])))
            .collect();
        let first: Map<String, Value> = full
            .iter()
            .filter(|(k, _)| k.parse::<usize>().unwrap() <= 40)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let second: Map<String, Value> = full
            .iter()
            .filter(|(k, _)| k.parse::<usize>().unwrap() > 40)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let single = normalize(&json!({ "answers": full }).to_string(), count(80)).unwrap();
        let merged = normalize_batches(
            &[
                (QuestionRange::new(41, 81), json!({ "answers": second }).to_string()),
                (QuestionRange::new(1, 41), json!({ "answers": first }).to_string()),
            ],
            count(80),
        )
        .unwrap();

        assert_eq!(merged, single);
        assert_eq!(merged.get(4), A);
        assert_eq!(merged.get(80), A);
    }

    #[test]
    fn test_merge_fills_gaps_with_na() {
        let batch = BatchAnswers {
            range: QuestionRange::new(1, 3),
            outcomes: vec![A, B],
        };
        let mapping = merge_batches(vec![batch], count(5));
        assert_eq!(outcomes(&mapping), vec![A, B, Na, Na, Na]);
    }

    #[test]
    fn test_failed_batch_fails_whole_normalization() {
        let result = normalize_batches(
            &[
                (QuestionRange::new(1, 2), r#"{"answers": {"1": "A"}}"#.to_string()),
                (QuestionRange::new(2, 3), "model refused".to_string()),
            ],
            count(2),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_normalizer_is_total() {
        for n in [1, 39, 40, 41, 300] {
            let mapping = normalize(r#"{"answers": {"1": "A", "500": "B"}}"#, count(n)).unwrap();
            assert_eq!(mapping.len(), n);
        }
    }
}

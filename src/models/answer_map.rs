//! 题号 → 作答结果的完整映射

use super::outcome::AnswerOutcome;
use super::question::QuestionCount;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 覆盖 `[1, n]` 每一道题的作答映射
///
/// 构造时所有题目都预置为 `NA`，之后只能修改范围内的题号，
/// 因此任何时刻都不会缺题或多题。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerMapping {
    outcomes: Vec<AnswerOutcome>,
}

impl AnswerMapping {
    /// 创建全部为 `NA` 的映射
    pub fn new(count: QuestionCount) -> Self {
        Self {
            outcomes: vec![AnswerOutcome::Na; count.get()],
        }
    }

    /// 题目数量
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// 读取某题的结果，超出范围时返回 `NA`
    pub fn get(&self, question: usize) -> AnswerOutcome {
        question
            .checked_sub(1)
            .and_then(|idx| self.outcomes.get(idx))
            .copied()
            .unwrap_or_default()
    }

    /// 设置某题的结果
    ///
    /// 题号超出范围时不做修改并返回 `false`。
    pub fn set(&mut self, question: usize, outcome: AnswerOutcome) -> bool {
        match question.checked_sub(1).and_then(|idx| self.outcomes.get_mut(idx)) {
            Some(slot) => {
                *slot = outcome;
                true
            }
            None => false,
        }
    }

    /// 按题号升序遍历 `(题号, 结果)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, AnswerOutcome)> + '_ {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(idx, outcome)| (idx + 1, *outcome))
    }

    /// 某个结果出现的次数
    pub fn count_of(&self, outcome: AnswerOutcome) -> usize {
        self.outcomes.iter().filter(|o| **o == outcome).count()
    }

    /// 以模型响应的格式输出：`{"answers": {"1": "A", ...}}`
    pub fn to_answers_json(&self) -> serde_json::Value {
        serde_json::json!({ "answers": self })
    }
}

impl Serialize for AnswerMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.outcomes.len()))?;
        for (question, outcome) in self.iter() {
            map.serialize_entry(&question.to_string(), &outcome)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mapping_is_all_na() {
        let mapping = AnswerMapping::new(QuestionCount::new(5).unwrap());
        assert_eq!(mapping.len(), 5);
        assert_eq!(mapping.count_of(AnswerOutcome::Na), 5);
        assert_eq!(
            mapping.iter().map(|(q, _)| q).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut mapping = AnswerMapping::new(QuestionCount::new(3).unwrap());
        assert!(mapping.set(3, AnswerOutcome::C));
        assert!(!mapping.set(0, AnswerOutcome::A));
        assert!(!mapping.set(4, AnswerOutcome::A));
        assert_eq!(mapping.get(3), AnswerOutcome::C);
        assert_eq!(mapping.get(4), AnswerOutcome::Na);
        assert_eq!(mapping.len(), 3);
    }

    #[test]
    fn test_answers_json_shape() {
        let mut mapping = AnswerMapping::new(QuestionCount::new(2).unwrap());
        mapping.set(1, AnswerOutcome::B);
        mapping.set(2, AnswerOutcome::Half);
        assert_eq!(
            mapping.to_answers_json(),
            serde_json::json!({ "answers": { "1": "B", "2": "HALF" } })
        );
    }
}

//! 成绩汇总与逐题明细

use super::outcome::AnswerOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单题判分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultLabel {
    Correct,
    Incorrect,
    #[serde(rename = "NA")]
    Na,
    #[serde(rename = "Incorrect (Half-filled)")]
    IncorrectHalfFilled,
}

impl ResultLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Incorrect => "Incorrect",
            Self::Na => "NA",
            Self::IncorrectHalfFilled => "Incorrect (Half-filled)",
        }
    }
}

impl fmt::Display for ResultLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 逐题明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub question: usize,
    pub key_value: AnswerOutcome,
    pub student_value: AnswerOutcome,
    pub result: ResultLabel,
}

/// 成绩汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub na: usize,
    /// 正确率百分比，保留两位小数
    pub score_percent: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "正确 {}/{} | 错误 {} | 未作答 {} | 得分 {:.2}%",
            self.correct, self.total, self.incorrect, self.na, self.score_percent
        )
    }
}

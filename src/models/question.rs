//! 题号、题目数量与批次区间

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 允许的最大题目数量
pub const MAX_QUESTIONS: usize = 300;

/// 经过校验的题目数量，取值范围 `[1, MAX_QUESTIONS]`
///
/// 为 0 的题目数量无法构造，计分时不会出现除零。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct QuestionCount(usize);

impl QuestionCount {
    pub fn new(value: usize) -> Result<Self, ConfigError> {
        if (1..=MAX_QUESTIONS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigError::InvalidQuestionCount {
                value,
                max: MAX_QUESTIONS,
            })
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// 覆盖全部题目的区间 `[1, n]`
    pub fn full_range(self) -> QuestionRange {
        QuestionRange::new(1, self.0 + 1)
    }
}

impl TryFrom<usize> for QuestionCount {
    type Error = ConfigError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionCount> for usize {
    fn from(count: QuestionCount) -> Self {
        count.0
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 左闭右开的题号区间 `[start, end)`，题号从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionRange {
    pub start: usize,
    pub end: usize,
}

impl QuestionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 区间内的最后一个题号
    pub fn last(&self) -> usize {
        self.end.saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, question: usize) -> bool {
        (self.start..self.end).contains(&question)
    }

    pub fn iter(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for QuestionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.last())
    }
}

/// 将 `[1, count]` 按 `batch_size` 切分为依次相邻、互不重叠的批次
///
/// `batch_size` 为 0 时按 1 处理。
pub fn plan_batches(count: QuestionCount, batch_size: usize) -> Vec<QuestionRange> {
    let batch_size = batch_size.max(1);
    let end = count.get() + 1;
    (1..end)
        .step_by(batch_size)
        .map(|start| QuestionRange::new(start, (start + batch_size).min(end)))
        .collect()
}

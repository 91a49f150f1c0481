//! 单题作答结果
//!
//! 半涂规则固定为：半涂在规范化后保留为 [`AnswerOutcome::Half`]，计分时记为
//! "Incorrect (Half-filled)"。学生答题卡和答案卡图片走同一条规范化路径。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单题的规范化作答结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerOutcome {
    A,
    B,
    C,
    D,
    /// 未作答，或多选、无法识别等无效作答
    #[default]
    #[serde(rename = "NA")]
    Na,
    /// 半涂
    #[serde(rename = "HALF")]
    Half,
}

impl AnswerOutcome {
    /// 四个选项
    pub const OPTIONS: [AnswerOutcome; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// 将一个文本记号转换为作答结果，无法识别时返回 `Na`
    ///
    /// 忽略首尾空白和大小写。
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            "HALF" => Self::Half,
            _ => Self::Na,
        }
    }

    /// 解析单个选项字母
    pub fn from_option_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// 是否为 A-D 中的某个选项
    pub fn is_option(self) -> bool {
        matches!(self, Self::A | Self::B | Self::C | Self::D)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::Na => "NA",
            Self::Half => "HALF",
        }
    }
}

impl fmt::Display for AnswerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_token() {
        assert_eq!(AnswerOutcome::from_token("a"), AnswerOutcome::A);
        assert_eq!(AnswerOutcome::from_token(" D "), AnswerOutcome::D);
        assert_eq!(AnswerOutcome::from_token("na"), AnswerOutcome::Na);
        assert_eq!(AnswerOutcome::from_token("Half"), AnswerOutcome::Half);
        assert_eq!(AnswerOutcome::from_token("E"), AnswerOutcome::Na);
        assert_eq!(AnswerOutcome::from_token(""), AnswerOutcome::Na);
    }

    #[test]
    fn test_serde_uses_canonical_symbols() {
        let json =
            serde_json::to_string(&[AnswerOutcome::A, AnswerOutcome::Na, AnswerOutcome::Half])
                .unwrap();
        assert_eq!(json, r#"["A","NA","HALF"]"#);
    }
}

//! 计分 - 业务能力层
//!
//! 纯函数：(学生作答, 标准答案) → (汇总, 逐题明细)

use crate::models::{
    AnswerMapping, AnswerOutcome, BreakdownEntry, QuestionCount, ResultLabel, Summary,
};

/// 判定单题结果
///
/// 学生作答为 `NA` 时记为未作答；为 `HALF` 时记为错误（半涂）；
/// 与答案相同且为 A-D 之一时记为正确；其余记为错误。
pub fn judge(student: AnswerOutcome, key: AnswerOutcome) -> ResultLabel {
    match student {
        AnswerOutcome::Na => ResultLabel::Na,
        AnswerOutcome::Half => ResultLabel::IncorrectHalfFilled,
        option if option == key => ResultLabel::Correct,
        _ => ResultLabel::Incorrect,
    }
}

/// 对比学生作答与标准答案，生成汇总和按题号升序的明细
pub fn compute_score(
    student: &AnswerMapping,
    key: &AnswerMapping,
    count: QuestionCount,
) -> (Summary, Vec<BreakdownEntry>) {
    let total = count.get();
    let mut correct = 0;
    let mut incorrect = 0;
    let mut na = 0;

    let breakdown: Vec<BreakdownEntry> = (1..=total)
        .map(|question| {
            let student_value = student.get(question);
            let key_value = key.get(question);
            let result = judge(student_value, key_value);
            match result {
                ResultLabel::Correct => correct += 1,
                ResultLabel::Incorrect | ResultLabel::IncorrectHalfFilled => incorrect += 1,
                ResultLabel::Na => na += 1,
            }
            BreakdownEntry {
                question,
                key_value,
                student_value,
                result,
            }
        })
        .collect();

    let summary = Summary {
        total,
        correct,
        incorrect,
        na,
        score_percent: round2(correct as f64 / total as f64 * 100.0),
    };

    (summary, breakdown)
}

fn round2(value: f64) -> f64 {
    // 与十进制两位舍入一致，恰好一半时取偶
    (value * 100.0).round_ties_even() / 100.0
}

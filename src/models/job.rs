//! 阅卷任务与成绩报告

use super::answer_map::AnswerMapping;
use super::question::QuestionCount;
use super::score::{BreakdownEntry, Summary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 一份阅卷任务：一个答案来源 + 若干学生答题卡
///
/// ```toml
/// name = "高一期中数学"
/// num_questions = 50
/// answer_key = "1:A, 2:C, 3:B"
/// # answer_key_image = "key.jpg"
///
/// [[students]]
/// name = "张三"
/// image = "sheets/zhangsan.jpg"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingJob {
    pub name: String,
    pub num_questions: QuestionCount,
    /// 文本形式的答案
    #[serde(default)]
    pub answer_key: Option<String>,
    /// 答案卡图片（路径或 URL），没有文本答案时使用
    #[serde(default)]
    pub answer_key_image: Option<String>,
    #[serde(default)]
    pub students: Vec<StudentSheet>,
    /// TOML 文件路径
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// 学生答题卡
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSheet {
    pub name: String,
    /// 图片路径或 URL
    pub image: String,
}

impl GradingJob {
    /// 将相对图片路径解析为相对 TOML 文件所在目录的路径
    ///
    /// URL 与绝对路径原样返回。
    pub fn resolve_image(&self, location: &str) -> String {
        if is_remote(location) || Path::new(location).is_absolute() {
            return location.to_string();
        }
        match self
            .file_path
            .as_deref()
            .and_then(|p| Path::new(p).parent())
        {
            Some(dir) => dir.join(location).to_string_lossy().to_string(),
            None => PathBuf::from(location).to_string_lossy().to_string(),
        }
    }
}

/// 是否为可直接交给模型的图片地址
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

/// 单个学生的成绩报告
#[derive(Debug, Clone, Serialize)]
pub struct GradeReport {
    pub job: String,
    pub student: String,
    pub generated_at: String,
    pub summary: Summary,
    pub breakdown: Vec<BreakdownEntry>,
    pub student_answers: AnswerMapping,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_at(path: &str) -> GradingJob {
        GradingJob {
            name: "测试".to_string(),
            num_questions: QuestionCount::new(5).unwrap(),
            answer_key: None,
            answer_key_image: None,
            students: Vec::new(),
            file_path: Some(path.to_string()),
        }
    }

    #[test]
    fn test_resolve_image_relative_to_job_file() {
        let job = job_at("jobs/math.toml");
        assert_eq!(
            job.resolve_image("sheets/a.jpg"),
            Path::new("jobs").join("sheets/a.jpg").to_string_lossy()
        );
    }

    #[test]
    fn test_resolve_image_keeps_urls() {
        let job = job_at("jobs/math.toml");
        assert_eq!(
            job.resolve_image("https://example.com/a.png"),
            "https://example.com/a.png"
        );
        assert_eq!(job.resolve_image("data:image/png;base64,AAAA"), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_job_rejects_zero_questions() {
        let text = "name = \"x\"\nnum_questions = 0\n";
        assert!(toml::from_str::<GradingJob>(text).is_err());
    }
}

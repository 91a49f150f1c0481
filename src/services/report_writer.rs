//! 成绩报告写入服务 - 业务能力层
//!
//! 只负责"把一份成绩报告写成 JSON 文件"能力，不关心流程

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::GradeReport;

/// 成绩报告写入服务
///
/// 报告路径为 `<输出目录>/<任务名>/<学生名>.json`
pub struct ReportWriter {
    output_folder: PathBuf,
}

impl ReportWriter {
    /// 使用指定输出目录创建
    pub fn new(output_folder: impl Into<PathBuf>) -> Self {
        Self {
            output_folder: output_folder.into(),
        }
    }

    /// 报告文件路径
    pub fn report_path(&self, job: &str, student: &str) -> PathBuf {
        self.output_folder
            .join(sanitize_file_name(job))
            .join(format!("{}.json", sanitize_file_name(student)))
    }

    /// 写入报告，返回文件路径
    pub async fn write(&self, report: &GradeReport) -> AppResult<PathBuf> {
        let path = self.report_path(&report.job, &report.student);
        let path_display = path.display().to_string();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| AppError::file_write_failed(dir.display().to_string(), e))?;
        }

        let json = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::file_write_failed(&path_display, std::io::Error::other(e)))?;

        fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(&path_display, e))?;

        debug!("成绩报告已写入: {}", path_display);
        Ok(path)
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }
}

/// 替换文件名中不允许出现的字符
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

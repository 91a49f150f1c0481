use crate::error::{AppError, AppResult, FileError};
use crate::models::job::GradingJob;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载阅卷任务
pub async fn load_grading_job(toml_file_path: &Path) -> AppResult<GradingJob> {
    let path_display = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| AppError::file_read_failed(&path_display, e))?;

    let mut job: GradingJob = toml::from_str(&content).map_err(|e| FileError::TomlParseFailed {
        path: path_display,
        source: e,
    })?;

    // 设置文件路径
    job.file_path = Some(toml_file_path.to_string_lossy().to_string());

    Ok(job)
}

/// 从文件夹中加载所有阅卷任务，按文件名排序
///
/// 无法解析的文件会被跳过并记录警告。
pub async fn load_all_jobs(folder_path: &str) -> AppResult<Vec<GradingJob>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut jobs = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_grading_job(&path).await {
            Ok(job) => {
                tracing::info!("成功加载任务 {}，共 {} 份答题卡", job.name, job.students.len());
                jobs.push(job);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(jobs)
}

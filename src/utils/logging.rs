/// 日志工具模块
///
/// 提供日志初始化、日志文件和统计输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::Summary;

/// 初始化 tracing
///
/// 优先使用 `RUST_LOG`，否则详细模式为 `debug`、普通模式为 `info`。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> std::io::Result<()> {
    let log_header = format!(
        "{}\n阅卷日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
}

/// 向日志文件追加一行
pub fn append_log_line(log_file_path: &str, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;
    writeln!(file, "{}", line)
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 答题卡批量阅卷模式");
    info!("🤖 模型: {}", config.llm_model_name);
    info!(
        "📊 每批题目数: {} | 批次并发: {}",
        config.batch_size,
        if config.concurrent_batches { "开启" } else { "关闭" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录任务加载信息
///
/// # 参数
/// - `jobs`: 任务数量
/// - `sheets`: 答题卡总数
pub fn log_jobs_loaded(jobs: usize, sheets: usize) {
    info!("✓ 找到 {} 个阅卷任务，共 {} 份答题卡", jobs, sheets);
}

/// 记录任务开始信息
///
/// # 参数
/// - `job_index`: 任务编号
/// - `total_jobs`: 任务总数
/// - `name`: 任务名称
/// - `num_questions`: 题目数量
pub fn log_job_start(job_index: usize, total_jobs: usize, name: &str, num_questions: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 个任务: {}", job_index, total_jobs, name);
    info!("📄 题目数量: {}", num_questions);
    info!("{}", "=".repeat(60));
}

/// 记录任务完成信息
pub fn log_job_complete(job_index: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 个任务完成: 成功 {}/{}", job_index, success, total);
    info!("{}", "─".repeat(60));
}

/// 单个学生成绩的日志文本
pub fn format_result_line(job: &str, student: &str, summary: &Summary) -> String {
    format!("[{}] {} | {}", job, student, summary)
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("答题卡识别结果", 3), "答题卡...");
    }

    #[test]
    fn test_log_file_header_and_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        let path = path.to_str().unwrap();

        init_log_file(path).unwrap();
        append_log_line(path, "第一行").unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("阅卷日志"));
        assert!(content.ends_with("第一行\n"));
    }

    #[test]
    fn test_format_result_line() {
        let summary = Summary {
            total: 3,
            correct: 1,
            incorrect: 1,
            na: 1,
            score_percent: 33.33,
        };
        assert_eq!(
            format_result_line("期中", "张三", &summary),
            "[期中] 张三 | 正确 1/3 | 错误 1 | 未作答 1 | 得分 33.33%"
        );
    }
}

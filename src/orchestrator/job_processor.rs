//! 单个阅卷任务处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理一个阅卷任务的所有答题卡，是任务级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **获取答案**：文本答案或答案卡图片，每个任务只获取一次
//! 2. **遍历答题卡**：逐份识别、计分
//! 3. **写出报告**：每个学生一份 JSON 报告
//! 4. **统计输出**：记录成功/失败数量

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::infrastructure::SheetImage;
use crate::models::{AnswerMapping, GradeReport, GradingJob, StudentSheet};
use crate::services::{ReportWriter, VisionModel};
use crate::utils::logging::{append_log_line, format_result_line};
use crate::workflow::{GradingFlow, SheetCtx};

/// 答题卡处理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SheetStats {
    pub graded: usize,
    pub failed: usize,
}

/// 处理单个阅卷任务
///
/// # 参数
/// - `flow`: 阅卷流程
/// - `writer`: 报告写入服务
/// - `job`: 任务数据
/// - `job_index`: 任务索引（用于日志）
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 答案获取失败时返回错误；单个学生失败只计入统计
pub async fn process_job<M: VisionModel>(
    flow: &GradingFlow<M>,
    writer: &ReportWriter,
    job: &GradingJob,
    job_index: usize,
    log_file_path: &str,
) -> Result<SheetStats> {
    let key_ctx = SheetCtx::new(&job.name, job_index, "答案");
    let key = flow
        .resolve_key(job, &key_ctx)
        .await
        .with_context(|| format!("任务 {} 获取答案失败", job.name))?;

    let mut stats = SheetStats::default();

    for student in &job.students {
        let ctx = key_ctx.for_sheet(&student.name);

        match grade_student(flow, writer, job, student, &key, &ctx).await {
            Ok(report) => {
                stats.graded += 1;
                let line = format_result_line(&job.name, &student.name, &report.summary);
                if let Err(e) = append_log_line(log_file_path, &line) {
                    error!("{} 写入日志文件失败: {}", ctx, e);
                }
            }
            Err(e) => {
                error!("{} ❌ 阅卷失败: {:#}", ctx, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

/// 处理一份学生答题卡，返回已写入的报告
async fn grade_student<M: VisionModel>(
    flow: &GradingFlow<M>,
    writer: &ReportWriter,
    job: &GradingJob,
    student: &StudentSheet,
    key: &AnswerMapping,
    ctx: &SheetCtx,
) -> Result<GradeReport> {
    let image = SheetImage::load(&job.resolve_image(&student.image))
        .await
        .context("加载答题卡图片失败")?;

    let grade = flow
        .grade_sheet(key, &image, job.num_questions, ctx)
        .await?;

    let report = GradeReport {
        job: job.name.clone(),
        student: student.name.clone(),
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        summary: grade.summary,
        breakdown: grade.breakdown,
        student_answers: grade.student_answers,
    };

    let path = writer.write(&report).await.context("写入成绩报告失败")?;
    info!("{} 📄 报告已保存: {}", ctx, path.display());

    Ok(report)
}

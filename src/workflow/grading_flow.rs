//! 阅卷流程 - 流程层
//!
//! 核心职责：定义"一张答题卡"的完整处理流程
//!
//! 流程顺序：
//! 1. 按批大小切分题号区间
//! 2. 每个批次调用一次 Vision 模型
//! 3. 逐批规范化并按题号合并
//! 4. 与标准答案对比计分

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::SheetImage;
use crate::models::{
    plan_batches, AnswerMapping, AnswerOutcome, BreakdownEntry, GradingJob, QuestionCount,
    QuestionRange, Summary,
};
use crate::services::{compute_score, normalize_batches, parse_answer_key, VisionModel};
use crate::workflow::sheet_ctx::SheetCtx;

/// 一张答题卡的阅卷结果
#[derive(Debug, Clone)]
pub struct SheetGrade {
    pub student_answers: AnswerMapping,
    pub summary: Summary,
    pub breakdown: Vec<BreakdownEntry>,
}

/// 阅卷流程
///
/// - 编排 识别 → 规范化 → 计分
/// - 决定批次如何划分、是否并发
/// - 只依赖业务能力（services）
pub struct GradingFlow<M> {
    model: M,
    batch_size: usize,
    concurrent_batches: bool,
}

impl<M: VisionModel> GradingFlow<M> {
    /// 使用配置创建阅卷流程
    pub fn new(model: M, config: &Config) -> Self {
        Self::with_options(model, config.batch_size, config.concurrent_batches)
    }

    pub fn with_options(model: M, batch_size: usize, concurrent_batches: bool) -> Self {
        Self {
            model,
            batch_size,
            concurrent_batches,
        }
    }

    /// 识别一张答题卡，返回覆盖全部题目的作答映射
    ///
    /// 任意一个批次调用失败或无法解析，整张答题卡失败。
    pub async fn extract_answers(
        &self,
        image: &SheetImage,
        count: QuestionCount,
        ctx: &SheetCtx,
    ) -> AppResult<AnswerMapping> {
        let batches = plan_batches(count, self.batch_size);
        info!(
            "{} 🔍 识别 {} 道题，共 {} 批",
            ctx,
            count,
            batches.len()
        );

        let responses = if self.concurrent_batches && batches.len() > 1 {
            try_join_all(batches.iter().map(|range| self.read_batch(image, *range, ctx))).await?
        } else {
            let mut responses = Vec::with_capacity(batches.len());
            for range in &batches {
                responses.push(self.read_batch(image, *range, ctx).await?);
            }
            responses
        };

        let mapping = normalize_batches(&responses, count)?;
        debug!(
            "{} 识别完成: NA {} | 半涂 {}",
            ctx,
            mapping.count_of(AnswerOutcome::Na),
            mapping.count_of(AnswerOutcome::Half)
        );
        Ok(mapping)
    }

    async fn read_batch(
        &self,
        image: &SheetImage,
        range: QuestionRange,
        ctx: &SheetCtx,
    ) -> AppResult<(QuestionRange, String)> {
        debug!("{} 📤 请求第 {} 题", ctx, range);
        let raw = self.model.read_answers(image, range).await?;
        Ok((range, raw))
    }

    /// 获取任务的标准答案
    ///
    /// 文本答案优先；没有文本时识别答案卡图片；两者都没有时全部为 `NA`。
    pub async fn resolve_key(&self, job: &GradingJob, ctx: &SheetCtx) -> AppResult<AnswerMapping> {
        let key_text = job.answer_key.as_deref().filter(|t| !t.trim().is_empty());

        match (key_text, job.answer_key_image.as_deref()) {
            (Some(text), image) => {
                if image.is_some() {
                    warn!("{} 同时提供了文本答案和答案卡图片，使用文本答案", ctx);
                }
                info!("{} 📝 解析文本答案", ctx);
                Ok(parse_answer_key(text, job.num_questions))
            }
            (None, Some(location)) => {
                info!("{} 🖼️ 识别答案卡图片", ctx);
                let image = SheetImage::load(&job.resolve_image(location)).await?;
                self.extract_answers(&image, job.num_questions, ctx).await
            }
            (None, None) => {
                warn!("{} ⚠️ 没有提供答案，所有题目按 NA 处理", ctx);
                Ok(parse_answer_key("", job.num_questions))
            }
        }
    }

    /// 识别学生答题卡并计分
    pub async fn grade_sheet(
        &self,
        key: &AnswerMapping,
        image: &SheetImage,
        count: QuestionCount,
        ctx: &SheetCtx,
    ) -> AppResult<SheetGrade> {
        let student_answers = self.extract_answers(image, count, ctx).await?;
        let (summary, breakdown) = compute_score(&student_answers, key, count);

        info!("{} ✓ {}", ctx, summary);

        Ok(SheetGrade {
            student_answers,
            summary,
            breakdown,
        })
    }
}

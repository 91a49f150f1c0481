//! 答题卡处理上下文
//!
//! 封装"我正在处理哪个任务的哪张答题卡"这一信息

use std::fmt::Display;

/// 答题卡处理上下文
#[derive(Debug, Clone)]
pub struct SheetCtx {
    /// 任务名称
    pub job_name: String,

    /// 任务索引（仅用于日志显示，从1开始）
    pub job_index: usize,

    /// 答题卡名称（学生名，或"答案卡"）
    pub sheet_name: String,
}

impl SheetCtx {
    /// 创建新的答题卡上下文
    pub fn new(
        job_name: impl Into<String>,
        job_index: usize,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            job_index,
            sheet_name: sheet_name.into(),
        }
    }

    /// 同一任务下另一张答题卡的上下文
    pub fn for_sheet(&self, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..self.clone()
        }
    }
}

impl Display for SheetCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[任务 #{} {} | {}]",
            self.job_index, self.job_name, self.sheet_name
        )
    }
}

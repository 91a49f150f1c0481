//! # OMR Grader
//!
//! 一个用于答题卡（OMR）批量阅卷的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 图片加载，只暴露能力
//! - `SheetImage` - 远程 URL 或本地文件（转为 base64 data URL）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，都是纯函数或单次调用
//! - `key_parser` - 解析文本答案
//! - `LlmService` - Vision 模型识别能力（`VisionModel`）
//! - `normalizer` - 把模型输出规范化为每题一个结果
//! - `scorer` - 对比答案并计分
//! - `ReportWriter` - 写成绩报告能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张答题卡"的完整处理流程
//! - `SheetCtx` - 上下文封装（任务 + 答题卡）
//! - `GradingFlow` - 流程编排（分批 → 识别 → 规范化 → 计分）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量任务处理器，管理资源
//! - `orchestrator/job_processor` - 单个任务处理器，遍历学生答题卡
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::SheetImage;
pub use models::{AnswerMapping, AnswerOutcome, GradeReport, GradingJob, QuestionCount};
pub use orchestrator::App;
pub use services::{compute_score, normalize, parse_answer_key, LlmService, VisionModel};
pub use workflow::{GradingFlow, SheetCtx};

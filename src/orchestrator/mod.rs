//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量阅卷处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载阅卷任务（Vec<GradingJob>）
//! - 持有 LLM 客户端和报告写入服务
//! - 输出全局统计信息
//!
//! ### `job_processor` - 单个任务处理器
//! - 获取一次标准答案
//! - 遍历任务中的所有学生答题卡
//! - 写出成绩报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<GradingJob>)
//!     ↓
//! job_processor (处理 Vec<StudentSheet>)
//!     ↓
//! workflow::GradingFlow (处理单张答题卡)
//!     ↓
//! services (能力层：llm / normalizer / key_parser / scorer / report)
//!     ↓
//! infrastructure (基础设施：SheetImage)
//! ```

pub mod batch_processor;
pub mod job_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use job_processor::{process_job, SheetStats};

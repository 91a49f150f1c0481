pub mod grading_flow;
pub mod sheet_ctx;

pub use grading_flow::{GradingFlow, SheetGrade};
pub use sheet_ctx::SheetCtx;

pub mod answer_map;
pub mod job;
pub mod loaders;
pub mod outcome;
pub mod question;
pub mod score;

pub use answer_map::AnswerMapping;
pub use job::{GradeReport, GradingJob, StudentSheet};
pub use loaders::{load_all_jobs, load_grading_job};
pub use outcome::AnswerOutcome;
pub use question::{plan_batches, QuestionCount, QuestionRange, MAX_QUESTIONS};
pub use score::{BreakdownEntry, ResultLabel, Summary};

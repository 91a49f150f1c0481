pub mod key_parser;
pub mod llm_service;
pub mod normalizer;
pub mod report_writer;
pub mod scorer;

pub use key_parser::{parse_answer_key, parse_answer_key_with_format, KeyFormat};
pub use llm_service::{build_omr_prompt, LlmService, VisionModel};
pub use normalizer::{
    extract_json_object, merge_batches, normalize, normalize_batch, normalize_batches,
    BatchAnswers, RawEntry,
};
pub use report_writer::ReportWriter;
pub use scorer::{compute_score, judge};

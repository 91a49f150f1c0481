pub mod toml_loader;

pub use toml_loader::{load_all_jobs, load_grading_job};

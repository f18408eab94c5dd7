pub mod assemble;
pub mod orchestrator;
pub mod trace;

pub use orchestrator::{AnalysisEngine, AnalyzeOptions, PipelineError};

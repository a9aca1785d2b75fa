//! Derives a question/answer evaluation set from the movie index.
//!
//! A sample of indexed documents is read back, a chat model writes questions with long answers
//! about each of them, and the pairs are exported as json lines for evaluation tooling.
pub mod export;
pub mod qa_generator;
pub mod sample;

mod pipeline;

pub use export::export_jsonl;
pub use pipeline::{QaEvaluationPipeline, QaEvaluationPipelineBuilder};
pub use qa_generator::QaGenerator;
pub use sample::fetch_sample_documents;

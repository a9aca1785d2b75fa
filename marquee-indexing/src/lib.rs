//! Builds the semantic movie index: generate or load a dataset, embed it, define the index and
//! upload the documents.
//!
//! Every step is usable on its own; [`MovieIndexPipeline`] runs them in order.
pub mod dataset;
pub mod embed;
pub mod ingest;
pub mod persist;
pub mod schema;

mod pipeline;

pub use dataset::{DatasetGenerator, DatasetSource};
pub use embed::embed_movies;
pub use ingest::ingest_documents;
pub use pipeline::{MovieIndexPipeline, MovieIndexPipelineBuilder};
pub use schema::movie_index_schema;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use derive_builder::Builder;
use marquee_core::ingestion::IngestReport;
use marquee_core::schema::IndexSchema;
use marquee_core::{EmbeddingModel, SearchIndex};
use tracing::Instrument as _;

use crate::dataset::DatasetSource;
use crate::embed::{DEFAULT_CONCURRENCY, embed_movies};
use crate::ingest::{DEFAULT_BATCH_SIZE, ingest_documents};

/// Builds the movie index from start to end.
///
/// A run creates or updates the index, obtains the dataset, embeds every movie and uploads the
/// documents in batches. The index is created first so a schema conflict is found before any
/// model is called.
///
/// # Example
///
/// ```no_run
/// # use marquee_indexing::{MovieIndexPipeline, DatasetSource};
/// # use marquee_core::{EmbeddingModel, SearchIndex, schema::IndexSchema};
/// # async fn run(embedder: impl EmbeddingModel + 'static, index: impl SearchIndex + 'static, schema: IndexSchema) -> anyhow::Result<()> {
/// let report = MovieIndexPipeline::builder()
///     .embedding_model(embedder)
///     .search_index(index)
///     .schema(schema)
///     .dataset(DatasetSource::File("data/movies_EN-US.json".into()))
///     .build()?
///     .run()
///     .await?;
///
/// println!("Uploaded {} documents", report.uploaded());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into), build_fn(error = "anyhow::Error"))]
pub struct MovieIndexPipeline {
    #[builder(setter(custom))]
    embedding_model: Arc<dyn EmbeddingModel>,
    #[builder(setter(custom))]
    search_index: Arc<dyn SearchIndex>,
    schema: IndexSchema,
    dataset: DatasetSource,
    /// Movies embedded at the same time
    #[builder(default = "DEFAULT_CONCURRENCY")]
    concurrency: usize,
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    batch_size: usize,
}

impl MovieIndexPipeline {
    pub fn builder() -> MovieIndexPipelineBuilder {
        MovieIndexPipelineBuilder::default()
    }

    /// Runs every step once and returns the upload report.
    ///
    /// # Errors
    ///
    /// Errors if the index cannot be created, the dataset cannot be obtained, an embedding
    /// fails, or any batch failed to upload. All batches are attempted before the last case is
    /// reported.
    pub async fn run(&self) -> Result<IngestReport> {
        let span = tracing::info_span!(
            "pipeline.movie_index.run",
            index = %self.schema.name,
            concurrency = self.concurrency,
            batch_size = self.batch_size
        );

        self.run_steps().instrument(span).await
    }

    async fn run_steps(&self) -> Result<IngestReport> {
        let descriptor = self
            .search_index
            .create_or_update_index(&self.schema)
            .await
            .with_context(|| format!("Failed to create index {}", self.schema.name))?;
        tracing::info!(index = %descriptor.name, "Index created or updated");

        let movies = self
            .dataset
            .obtain()
            .await
            .context("Failed to obtain dataset")?;

        let documents = embed_movies(self.embedding_model.as_ref(), movies, self.concurrency)
            .await
            .context("Failed to embed movies")?;

        let report = ingest_documents(self.search_index.as_ref(), documents, self.batch_size).await;

        let failed = report.failed().map(|batch| batch.batch).collect::<Vec<_>>();
        if !failed.is_empty() {
            for batch in report.failed() {
                if let Err(error) = &batch.outcome {
                    tracing::error!(batch = batch.batch, %error, "Batch was not uploaded");
                }
            }
            anyhow::bail!(
                "{} of {} batches failed to upload (batches {failed:?}); {} documents uploaded",
                failed.len(),
                report.batches().len(),
                report.uploaded()
            );
        }

        tracing::info!(
            documents = report.uploaded(),
            batches = report.batches().len(),
            "Movie index built"
        );
        Ok(report)
    }
}

impl MovieIndexPipelineBuilder {
    #[must_use]
    pub fn embedding_model(mut self, model: impl EmbeddingModel + 'static) -> Self {
        self.embedding_model = Some(Arc::new(model));
        self
    }

    #[must_use]
    pub fn search_index(mut self, index: impl SearchIndex + 'static) -> Self {
        self.search_index = Some(Arc::new(index));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetGenerator, load_dataset};
    use crate::persist::MemoryIndex;
    use crate::schema::movie_index_schema;
    use marquee_core::MockSimplePrompt;
    use marquee_core::config::OpenAIServiceConfig;
    use marquee_core::ingestion::SearchRequest;
    use marquee_core::test_utils::{MockEmbedder, movies};
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use serde_json::json;
    use temp_dir::TempDir;

    fn schema() -> IndexSchema {
        movie_index_schema(
            "movies",
            &OpenAIServiceConfig {
                endpoint: "https://openai.example.com".into(),
                api_key: SecretString::from("openai-key"),
                embedding_deployment: "ada".into(),
                completion_deployment: "gpt".into(),
            },
        )
    }

    /// 32 generated movies where the last two repeat earlier titles
    fn generated_with_duplicates() -> String {
        let mut generated = movies(30);
        generated.push(movies(4)[1].clone());
        generated.push(movies(20)[17].clone());
        json!({ "movies": generated }).to_string()
    }

    #[test_log::test(tokio::test)]
    async fn test_generated_dataset_is_cleaned_embedded_and_uploaded() {
        let dir = TempDir::new().unwrap();
        let persisted = dir.child("data").join("movies_EN-US.json");

        let mut client = MockSimplePrompt::new();
        client
            .expect_prompt()
            .times(1)
            .returning(|_| Ok(generated_with_duplicates()));

        let embedder = MockEmbedder::new();
        let index = MemoryIndex::new();

        let report = MovieIndexPipeline::builder()
            .embedding_model(embedder.clone())
            .search_index(index.clone())
            .schema(schema())
            .dataset(DatasetSource::Generate {
                generator: DatasetGenerator::new(client),
                persist_to: persisted.clone(),
            })
            .build()
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.uploaded(), 30);
        assert_eq!(load_dataset(&persisted).await.unwrap(), movies(30));
        assert_eq!(embedder.calls(), 60);
        assert_eq!(index.len().await, 30);

        let response = index
            .search(SearchRequest::match_all(50).with_select(&["id"]))
            .await
            .unwrap();
        let ids = response
            .documents
            .iter()
            .map(|d| d["id"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        let expected = (0..30).map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(ids, expected);

        let document = index.get("29").await.unwrap();
        assert_eq!(document.title, "Movie 29");
        assert!(!document.synopsis_vector.is_empty());
        assert!(!document.genre_vector.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_rerun_from_file_keeps_index_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("movies.json");
        crate::dataset::persist_dataset(&path, &movies(12)).await.unwrap();

        let index = MemoryIndex::new();
        let pipeline = MovieIndexPipeline::builder()
            .embedding_model(MockEmbedder::new())
            .search_index(index.clone())
            .schema(schema())
            .dataset(DatasetSource::File(path))
            .batch_size(5_usize)
            .build()
            .unwrap();

        pipeline.run().await.unwrap();
        let definition = index.definition().await;
        let descriptor = index.descriptor().await;
        pipeline.run().await.unwrap();

        assert_eq!(index.definition().await, definition);
        assert_eq!(index.descriptor().await, descriptor);
        assert_eq!(index.len().await, 12);
        assert_eq!(index.uploads().await, [5, 5, 2, 5, 5, 2]);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_batch_fails_the_run_after_all_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("movies.json");
        crate::dataset::persist_dataset(&path, &movies(6)).await.unwrap();

        let index = MemoryIndex::new().rejecting(&["3"]);
        let err = MovieIndexPipeline::builder()
            .embedding_model(MockEmbedder::new())
            .search_index(index.clone())
            .schema(schema())
            .dataset(DatasetSource::File(path))
            .batch_size(2_usize)
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "1 of 3 batches failed to upload (batches [1]); 5 documents uploaded"
        );
        assert_eq!(index.uploads().await, [2, 2, 2]);
        assert_eq!(index.len().await, 5);
    }

    #[test_log::test(tokio::test)]
    async fn test_embedding_failure_uploads_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("movies.json");
        let input = movies(3);
        crate::dataset::persist_dataset(&path, &input).await.unwrap();

        let index = MemoryIndex::new();
        let err = MovieIndexPipeline::builder()
            .embedding_model(MockEmbedder::new().failing_on(input[2].genre.clone()))
            .search_index(index.clone())
            .schema(schema())
            .dataset(DatasetSource::File(path))
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to embed movies");
        assert!(index.descriptor().await.is_some());
        assert!(index.is_empty().await);
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_dataset_fails_after_creating_index() {
        let dir = TempDir::new().unwrap();
        let index = MemoryIndex::new();

        let err = MovieIndexPipeline::builder()
            .embedding_model(MockEmbedder::new())
            .search_index(index.clone())
            .schema(schema())
            .dataset(DatasetSource::File(dir.child("missing.json")))
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to obtain dataset");
        assert!(index.descriptor().await.is_some());
    }

    #[test]
    fn test_builder_requires_services() {
        let err = MovieIndexPipeline::builder()
            .schema(schema())
            .dataset(DatasetSource::File("movies.json".into()))
            .build()
            .unwrap_err();

        assert!(err.to_string().contains("embedding_model"));
    }
}

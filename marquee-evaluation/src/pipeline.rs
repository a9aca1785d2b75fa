use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use derive_builder::Builder;
use marquee_core::SearchIndex;
use marquee_core::evaluation::{DocumentOutcome, QaGenerationReport};
use tracing::Instrument as _;

use crate::export::{DEFAULT_EXPORT_PATH, export_jsonl};
use crate::qa_generator::{DEFAULT_NUM_QUESTIONS, QaGenerator};
use crate::sample::{DEFAULT_SAMPLE_SIZE, fetch_sample_documents};

/// Samples the index, generates question/answer pairs from the sampled documents and exports
/// them as json lines.
///
/// Documents that fail are logged and left out of the export. The run only fails when not a
/// single pair was generated.
#[derive(Debug, Clone, Builder)]
#[builder(pattern = "owned", setter(into), build_fn(error = "anyhow::Error"))]
pub struct QaEvaluationPipeline {
    #[builder(setter(custom))]
    search_index: Arc<dyn SearchIndex>,
    generator: QaGenerator,
    /// The document field questions are generated from
    #[builder(default = "\"synopsis\".to_string()")]
    field_name: String,
    #[builder(default = "DEFAULT_SAMPLE_SIZE")]
    sample_size: usize,
    #[builder(default = "DEFAULT_NUM_QUESTIONS")]
    num_questions: usize,
    #[builder(default = "DEFAULT_EXPORT_PATH.into()")]
    export_to: PathBuf,
}

impl QaEvaluationPipeline {
    pub fn builder() -> QaEvaluationPipelineBuilder {
        QaEvaluationPipelineBuilder::default()
    }

    /// # Errors
    ///
    /// Errors if the index cannot be queried, no pairs were generated, or the export fails
    pub async fn run(&self) -> Result<QaGenerationReport> {
        let span = tracing::info_span!(
            "pipeline.qa_eval.run",
            sample_size = self.sample_size,
            num_questions = self.num_questions,
            export_to = %self.export_to.display()
        );

        self.run_steps().instrument(span).await
    }

    async fn run_steps(&self) -> Result<QaGenerationReport> {
        let documents = fetch_sample_documents(self.search_index.as_ref(), self.sample_size)
            .await
            .context("Failed to fetch sample documents")?;

        let report = self
            .generator
            .generate_qa_evaluation_dataset(&documents, &self.field_name, self.num_questions)
            .await;

        for outcome in report.failures() {
            if let DocumentOutcome::Failed { document, error } = outcome {
                tracing::error!(document, %error, "Skipped document");
            }
        }

        if report.dataset.is_empty() {
            anyhow::bail!(
                "No question/answer pairs generated from {} documents",
                documents.len()
            );
        }

        export_jsonl(&self.export_to, &report.dataset).await?;

        Ok(report)
    }
}

impl QaEvaluationPipelineBuilder {
    #[must_use]
    pub fn search_index(mut self, index: impl SearchIndex + 'static) -> Self {
        self.search_index = Some(Arc::new(index));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::MockSearchIndex;
    use marquee_core::errors::{LanguageModelError, SearchIndexError};
    use marquee_core::ingestion::SearchResponse;
    use marquee_core::test_utils::MockPrompt;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use temp_dir::TempDir;

    fn index_with(count: usize) -> MockSearchIndex {
        let mut index = MockSearchIndex::new();
        index
            .expect_search()
            .withf(|request| request.top == 10 && request.search == "*")
            .times(1)
            .returning(move |_| {
                Ok(SearchResponse {
                    count: Some(count as u64),
                    documents: (0..count)
                        .map(|n| {
                            json!({"id": n.to_string(), "title": format!("Movie {n}"), "synopsis": format!("Synopsis {n}")})
                                .as_object()
                                .unwrap()
                                .clone()
                        })
                        .collect(),
                })
            });
        index
    }

    fn answer(count: usize) -> String {
        let pairs = (0..count)
            .map(|n| json!({"question": format!("Q{n}?"), "answer": format!("A{n}.")}))
            .collect::<Vec<_>>();
        json!({ "question_answers": pairs }).to_string()
    }

    #[test_log::test(tokio::test)]
    async fn test_exports_pairs_of_every_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("data").join("qa.jsonl");

        let client = MockPrompt::new();
        for _ in 0..10 {
            client.expect_prompt(Ok(answer(3)));
        }

        let report = QaEvaluationPipeline::builder()
            .search_index(index_with(10))
            .generator(QaGenerator::new(client))
            .export_to(path.clone())
            .build()
            .unwrap()
            .run()
            .await
            .unwrap();

        assert!(report.is_complete());
        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 30);
        assert_eq!(
            content.lines().next().unwrap(),
            r#"{"question":"Q0?","ground_truth":"A0."}"#
        );
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_documents_are_left_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("qa.jsonl");

        let client = MockPrompt::new();
        client
            .expect_prompt(Ok(answer(3)))
            .expect_prompt(Err(LanguageModelError::permanent("content filtered")))
            .expect_prompt(Ok(answer(3)));

        let report = QaEvaluationPipeline::builder()
            .search_index(index_with(3))
            .generator(QaGenerator::new(client))
            .export_to(path.clone())
            .build()
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.failures().count(), 1);
        assert_eq!(fs_err::read_to_string(&path).unwrap().lines().count(), 6);
    }

    #[test_log::test(tokio::test)]
    async fn test_no_pairs_fails_without_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("qa.jsonl");

        let client = MockPrompt::new();
        client
            .expect_prompt(Ok("no".into()))
            .expect_prompt(Ok("still no".into()));

        let err = QaEvaluationPipeline::builder()
            .search_index(index_with(2))
            .generator(QaGenerator::new(client))
            .export_to(path.clone())
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "No question/answer pairs generated from 2 documents"
        );
        assert!(!path.exists());
    }

    #[test_log::test(tokio::test)]
    async fn test_query_failure_fails_the_run() {
        let mut index = MockSearchIndex::new();
        index.expect_search().returning(|_| {
            Err(SearchIndexError::Response {
                status: 403,
                message: "Forbidden".into(),
            })
        });

        let err = QaEvaluationPipeline::builder()
            .search_index(index)
            .generator(QaGenerator::new(MockPrompt::new()))
            .build()
            .unwrap()
            .run()
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch sample documents");
    }
}

//! Wires the configured Azure services into the two pipelines, the way the scripts run them.
use std::path::Path;

use anyhow::Result;
use marquee_core::config::{Config, EvaluationConfig};
use marquee_core::{BackoffConfiguration, LanguageModelWithBackOff};
use marquee_evaluation::{QaEvaluationPipeline, QaGenerator};
use marquee_indexing::dataset::{DatasetGenerator, DatasetSource};
use marquee_indexing::{MovieIndexPipeline, movie_index_schema};
use marquee_integrations::azure_openai::{AzureOpenAI, Options, QA_MAX_TOKENS};
use marquee_integrations::azure_search::AzureSearch;
use tracing_subscriber::EnvFilter;

/// Logs to stderr, filtered by `RUST_LOG` with `info` as the default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// The movie index pipeline against the configured services.
///
/// With `generate_new_data` the dataset is generated and persisted to `dataset_path`,
/// otherwise it is loaded from there. Model calls are retried with the default backoff.
///
/// # Errors
///
/// Errors if the pipeline cannot be built
pub fn movie_index_pipeline(
    config: &Config,
    generate_new_data: bool,
    dataset_path: impl AsRef<Path>,
) -> Result<MovieIndexPipeline> {
    let backoff = BackoffConfiguration::default();
    let dataset_path = dataset_path.as_ref().to_path_buf();

    let dataset = if generate_new_data {
        DatasetSource::Generate {
            generator: DatasetGenerator::new(LanguageModelWithBackOff::new(
                AzureOpenAI::completions_from_config(&config.openai),
                backoff,
            )),
            persist_to: dataset_path,
        }
    } else {
        DatasetSource::File(dataset_path)
    };

    MovieIndexPipeline::builder()
        .embedding_model(LanguageModelWithBackOff::new(
            AzureOpenAI::embeddings_from_config(&config.openai),
            backoff,
        ))
        .search_index(AzureSearch::from_config(&config.search))
        .schema(movie_index_schema(
            config.search.index_name.clone(),
            &config.openai,
        ))
        .dataset(dataset)
        .build()
}

/// The evaluation set pipeline against the configured services.
///
/// Questions are generated with the `model_name` deployment of the configured Azure `OpenAI`
/// resource.
///
/// # Errors
///
/// Errors if the pipeline cannot be built
pub fn qa_evaluation_pipeline(
    config: &Config,
    evaluation: &EvaluationConfig,
    export_to: impl AsRef<Path>,
) -> Result<QaEvaluationPipeline> {
    let model = AzureOpenAI::from_config(
        &config.openai,
        &evaluation.model_name,
        Options::with_max_tokens(QA_MAX_TOKENS),
    );

    QaEvaluationPipeline::builder()
        .search_index(AzureSearch::from_config(&config.search))
        .generator(QaGenerator::new(LanguageModelWithBackOff::new(
            model,
            BackoffConfiguration::default(),
        )))
        .export_to(export_to.as_ref().to_path_buf())
        .build()
}

//! Obtaining the movie dataset: generating it with a chat model, or loading a persisted one.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use derive_builder::Builder;
use marquee_core::SimplePrompt;
use marquee_core::errors::UpstreamError;
use marquee_core::movies::{Movie, clean_generated_dataset};
use marquee_core::prompt::Prompt;
use marquee_core::template::Template;
use marquee_core::util::debug_long_utf8;

/// Where the dataset of the default script run is persisted
pub const DEFAULT_DATASET_PATH: &str = "data/movies_EN-US.json";

/// Generates a synthetic movie dataset with a chat model.
///
/// The answer is expected to be a json object with a `movies` array. Generated titles are not
/// guaranteed to be unique; [`DatasetGenerator::generate_movies`] removes duplicates.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DatasetGenerator {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_system_prompt()")]
    system_prompt: Template,
    #[builder(default = "default_user_prompt()")]
    user_prompt: Template,
}

impl DatasetGenerator {
    pub fn builder() -> DatasetGeneratorBuilder {
        DatasetGeneratorBuilder::default()
    }

    pub fn new(client: impl SimplePrompt + 'static) -> Self {
        Self {
            client: Arc::new(client),
            system_prompt: default_system_prompt(),
            user_prompt: default_user_prompt(),
        }
    }

    /// Sends one completion request and returns the raw answer.
    ///
    /// # Errors
    ///
    /// Errors if the request fails or the answer is empty
    #[tracing::instrument(name = "dataset.generate", skip_all, err)]
    pub async fn generate_dataset(
        &self,
        system_prompt: impl Into<Template>,
        user_prompt: impl Into<Template>,
    ) -> Result<String, UpstreamError> {
        let prompt = Prompt::from(user_prompt.into()).with_system(system_prompt);

        let completion = self.client.prompt(prompt).await?;

        tracing::debug!(
            completion = debug_long_utf8(&completion, 200),
            "Dataset generated"
        );

        if completion.trim().is_empty() {
            return Err(UpstreamError::malformed("the completion is empty"));
        }

        Ok(completion)
    }

    /// Generates a dataset with the configured prompts, parses it and drops duplicate titles.
    ///
    /// # Errors
    ///
    /// Errors if generation fails or the answer is not a dataset
    pub async fn generate_movies(&self) -> Result<Vec<Movie>, UpstreamError> {
        let completion = self
            .generate_dataset(self.system_prompt.clone(), self.user_prompt.clone())
            .await?;

        clean_generated_dataset(&completion)
    }
}

impl DatasetGeneratorBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

fn default_system_prompt() -> Template {
    include_str!("prompts/dataset_system.prompt.md").into()
}

fn default_user_prompt() -> Template {
    include_str!("prompts/dataset_user.prompt.md").into()
}

/// How a pipeline run obtains its movies.
#[derive(Debug, Clone)]
pub enum DatasetSource {
    /// Generate a fresh dataset and persist the cleaned result to `persist_to`
    Generate {
        generator: DatasetGenerator,
        persist_to: PathBuf,
    },
    /// Load a dataset persisted by an earlier run
    File(PathBuf),
}

impl DatasetSource {
    /// # Errors
    ///
    /// Errors if the dataset cannot be generated, read or written
    pub async fn obtain(&self) -> Result<Vec<Movie>> {
        match self {
            Self::Generate {
                generator,
                persist_to,
            } => {
                let movies = generator
                    .generate_movies()
                    .await
                    .context("Failed to generate dataset")?;
                persist_dataset(persist_to, &movies).await?;
                Ok(movies)
            }
            Self::File(path) => load_dataset(path).await,
        }
    }
}

/// Reads a json array of movies.
///
/// # Errors
///
/// Errors if the file cannot be read or is not a list of movies
pub async fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<Movie>> {
    let path = path.as_ref();
    let content = fs_err::tokio::read_to_string(path).await?;

    let movies: Vec<Movie> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a movie dataset", path.display()))?;

    tracing::info!(path = %path.display(), movies = movies.len(), "Loaded dataset");
    Ok(movies)
}

/// Writes the movies as a json array, creating parent directories as needed.
///
/// # Errors
///
/// Errors if the file cannot be written
pub async fn persist_dataset(path: impl AsRef<Path>, movies: &[Movie]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::tokio::create_dir_all(parent).await?;
    }

    fs_err::tokio::write(path, serde_json::to_string(movies)?).await?;

    tracing::info!(path = %path.display(), movies = movies.len(), "Persisted dataset");
    Ok(())
}

//! Environment configuration.
//!
//! Every value is required; there are no defaults. A `.env` file in the working directory (or
//! any parent) is loaded first when present, without overriding variables that are already set.
//!
//! The configuration is a plain value handed to the constructors of the clients, there is no
//! process-wide client state.
use secrecy::SecretString;

use crate::errors::ConfigError;

/// Api version used for chat completions and embeddings on Azure OpenAI
pub const OPENAI_API_VERSION: &str = "2024-02-15-preview";
/// Api version used for the Azure AI Search REST api
pub const SEARCH_API_VERSION: &str = "2024-07-01";

/// Azure OpenAI resource used for embeddings and dataset generation.
#[derive(Debug)]
pub struct OpenAIServiceConfig {
    /// `AZURE_OPENAI_ENDPOINT`
    pub endpoint: String,
    /// `AZURE_OPENAI_KEY`
    pub api_key: SecretString,
    /// `ADA_EMBEDDING_NAME`
    pub embedding_deployment: String,
    /// `AZURE_OPENAI_MOVIES_MODEL`
    pub completion_deployment: String,
}

/// Azure AI Search service and the index everything is written to.
#[derive(Debug)]
pub struct SearchServiceConfig {
    /// `AZURE_AI_SEARCH_ENDPOINT`
    pub endpoint: String,
    /// `AZURE_AI_SEARCH_KEY`
    pub api_key: SecretString,
    /// `AZURE_AI_SEARCH_INDEX_NAME`
    pub index_name: String,
}

/// Settings only the evaluation set generation needs.
#[derive(Debug)]
pub struct EvaluationConfig {
    /// `MODEL_NAME`, the chat deployment that writes question/answer pairs
    pub model_name: String,
    /// `SUBSCRIPTION_ID`
    pub subscription_id: String,
    /// `RESOURCE_GROUP`
    pub resource_group: String,
    /// `PROJECT_NAME`
    pub project_name: String,
}

#[derive(Debug)]
pub struct Config {
    pub openai: OpenAIServiceConfig,
    pub search: SearchServiceConfig,
}

impl Config {
    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Errors if any required variable is missing or empty
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    /// Builds the configuration from any key/value source.
    ///
    /// # Errors
    ///
    /// Errors if any required variable is missing or empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let openai = OpenAIServiceConfig {
            endpoint: required(&lookup, "AZURE_OPENAI_ENDPOINT")?,
            api_key: required(&lookup, "AZURE_OPENAI_KEY")?.into(),
            embedding_deployment: required(&lookup, "ADA_EMBEDDING_NAME")?,
            completion_deployment: required(&lookup, "AZURE_OPENAI_MOVIES_MODEL")?,
        };

        let search = SearchServiceConfig {
            endpoint: required(&lookup, "AZURE_AI_SEARCH_ENDPOINT")?,
            api_key: required(&lookup, "AZURE_AI_SEARCH_KEY")?.into(),
            index_name: required(&lookup, "AZURE_AI_SEARCH_INDEX_NAME")?,
        };

        Ok(Self { openai, search })
    }
}

impl EvaluationConfig {
    /// Loads the evaluation settings from the environment.
    ///
    /// # Errors
    ///
    /// Errors if any required variable is missing or empty
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(env_lookup)
    }

    /// # Errors
    ///
    /// Errors if any required variable is missing or empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            model_name: required(&lookup, "MODEL_NAME")?,
            subscription_id: required(&lookup, "SUBSCRIPTION_ID")?,
            resource_group: required(&lookup, "RESOURCE_GROUP")?,
            project_name: required(&lookup, "PROJECT_NAME")?,
        })
    }
}

fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded environment from file");
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing { name })
}

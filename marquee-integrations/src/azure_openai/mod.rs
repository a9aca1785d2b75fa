//! Azure `OpenAI` chat completions and embeddings, through `async-openai` configured for Azure.
//!
//! Azure addresses a model by its deployment, so each [`AzureOpenAI`] instance talks to exactly
//! one deployment. Use one instance for embeddings and another one for completions.
use std::sync::Arc;
use std::time::Duration;

use async_openai::error::{ApiError, OpenAIError};
use derive_builder::Builder;
use marquee_core::config::{OPENAI_API_VERSION, OpenAIServiceConfig};
use marquee_core::errors::LanguageModelError;
use secrecy::ExposeSecret as _;

mod embed;
mod simple_prompt;

pub use async_openai::config::AzureConfig;

/// Token budget when generating the movie dataset
pub const DATASET_MAX_TOKENS: u32 = 16_000;
/// Token budget when generating question/answer pairs for one document
pub const QA_MAX_TOKENS: u32 = 2_000;

/// Client for a single Azure `OpenAI` deployment.
///
/// # Example
///
/// ```no_run
/// # use marquee_integrations::azure_openai::{AzureConfig, AzureOpenAI, Options};
/// let config = AzureConfig::new()
///     .with_api_base("https://my-resource.openai.azure.com")
///     .with_api_key("my-api-key")
///     .with_deployment_id("gpt-35-turbo-16k")
///     .with_api_version("2024-02-15-preview");
///
/// let azure = AzureOpenAI::builder()
///     .client(async_openai::Client::with_config(config))
///     .deployment("gpt-35-turbo-16k")
///     .options(Options::builder().max_tokens(2000_u32).build().unwrap())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Builder, Clone)]
#[builder(setter(into, strip_option))]
pub struct AzureOpenAI {
    #[builder(setter(custom))]
    client: Arc<async_openai::Client<AzureConfig>>,

    /// Name of the deployment, sent as the model of every request
    deployment: String,

    /// Decoding parameters for completions
    #[builder(default)]
    pub(crate) options: Options,
}

/// Decoding parameters sent with every chat completion.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into, strip_option))]
pub struct Options {
    #[builder(default = "0.0")]
    pub temperature: f32,
    #[builder(default = "0.95")]
    pub top_p: f32,
    #[builder(default = "0.0")]
    pub frequency_penalty: f32,
    #[builder(default = "0.0")]
    pub presence_penalty: f32,
    /// Upper bound of generated tokens, left to the service when unset
    #[builder(default)]
    pub max_tokens: Option<u32>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            max_tokens: None,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// The fixed decoding parameters with a token budget
    pub fn with_max_tokens(max_tokens: u32) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            ..Self::default()
        }
    }
}

impl AzureOpenAI {
    pub fn builder() -> AzureOpenAIBuilder {
        AzureOpenAIBuilder::default()
    }

    /// A client for `deployment` on the configured resource.
    pub fn from_config(
        config: &OpenAIServiceConfig,
        deployment: impl Into<String>,
        options: Options,
    ) -> Self {
        let deployment = deployment.into();
        let azure_config = AzureConfig::new()
            .with_api_base(&config.endpoint)
            .with_api_key(config.api_key.expose_secret())
            .with_deployment_id(&deployment)
            .with_api_version(OPENAI_API_VERSION);

        Self {
            client: Arc::new(client_with_config(azure_config)),
            deployment,
            options,
        }
    }

    /// The embedding deployment (`ADA_EMBEDDING_NAME`)
    pub fn embeddings_from_config(config: &OpenAIServiceConfig) -> Self {
        Self::from_config(config, &config.embedding_deployment, Options::default())
    }

    /// The dataset generation deployment (`AZURE_OPENAI_MOVIES_MODEL`)
    pub fn completions_from_config(config: &OpenAIServiceConfig) -> Self {
        Self::from_config(
            config,
            &config.completion_deployment,
            Options::with_max_tokens(DATASET_MAX_TOKENS),
        )
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }
}

impl AzureOpenAIBuilder {
    /// Sets the `async-openai` client. Its own rate limit retries are turned off, retries are
    /// left to [`marquee_core::LanguageModelWithBackOff`].
    pub fn client(&mut self, client: async_openai::Client<AzureConfig>) -> &mut Self {
        self.client = Some(Arc::new(client.with_backoff(no_backoff())));
        self
    }
}

fn client_with_config(config: AzureConfig) -> async_openai::Client<AzureConfig> {
    async_openai::Client::with_config(config).with_backoff(no_backoff())
}

fn no_backoff() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Classifies an `async-openai` failure.
///
/// With its own retries turned off, `async-openai` hands back the service's failures as api
/// errors. A server error carries the raw body as message and neither a type nor a code. A
/// throttled request carries the parsed error body, with code `429` on Azure and
/// `rate_limit_exceeded` on `OpenAI`; when the quota is used up, retrying does not help.
///
/// An oversized prompt is reported with the `context_length_exceeded` code and never succeeds
/// on retry. Server errors, throttling, transport failures and undecodable bodies are
/// transient; everything else the service rejected is permanent.
pub fn azure_openai_error_to_language_model_error(e: OpenAIError) -> LanguageModelError {
    match e {
        OpenAIError::ApiError(api_error) => {
            if api_error.code.as_deref() == Some("context_length_exceeded") {
                LanguageModelError::ContextLengthExceeded(OpenAIError::ApiError(api_error).into())
            } else if api_error.r#type.is_none() && api_error.code.is_none() {
                tracing::warn!(message = %api_error.message, "Azure OpenAI server error");
                LanguageModelError::TransientError(OpenAIError::ApiError(api_error).into())
            } else if is_rate_limited(&api_error) {
                tracing::warn!(message = %api_error.message, "Azure OpenAI rate limited");
                LanguageModelError::TransientError(OpenAIError::ApiError(api_error).into())
            } else {
                tracing::error!(?api_error, "Azure OpenAI api error");
                LanguageModelError::PermanentError(OpenAIError::ApiError(api_error).into())
            }
        }
        OpenAIError::Reqwest(e) => {
            tracing::warn!(error = ?e, "Azure OpenAI request failed");
            LanguageModelError::TransientError(e.into())
        }
        OpenAIError::JSONDeserialize(e) => {
            tracing::error!(error = ?e, "Azure OpenAI response could not be deserialized");
            LanguageModelError::TransientError(e.into())
        }
        other => {
            tracing::error!(error = ?other, "Azure OpenAI error");
            LanguageModelError::PermanentError(other.into())
        }
    }
}

fn is_rate_limited(api_error: &ApiError) -> bool {
    let code = api_error.code.as_deref();
    let kind = api_error.r#type.as_deref();

    let throttled = matches!(code, Some("429" | "rate_limit_exceeded"))
        || matches!(kind, Some("requests" | "tokens" | "rate_limit_exceeded"));
    let out_of_quota = [code, kind]
        .into_iter()
        .flatten()
        .chain(std::iter::once(api_error.message.as_str()))
        .any(|text| text.contains("quota"));

    throttled && !out_of_quota
}

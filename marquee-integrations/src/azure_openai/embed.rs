use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;

use marquee_core::{EmbeddingModel, Embeddings, errors::LanguageModelError};

use super::{AzureOpenAI, azure_openai_error_to_language_model_error};

#[async_trait]
impl EmbeddingModel for AzureOpenAI {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError> {
        let num_inputs = input.len();
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.deployment)
            .input(input)
            .build()
            .map_err(LanguageModelError::permanent)?;

        tracing::debug!(
            num_inputs,
            deployment = &self.deployment,
            "[Embed] Request to azure openai"
        );
        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(azure_openai_error_to_language_model_error)?;

        tracing::debug!(
            num_embeddings = response.data.len(),
            prompt_tokens = response.usage.prompt_tokens,
            "[Embed] Response azure openai"
        );

        if response.data.len() != num_inputs {
            return Err(LanguageModelError::permanent(anyhow::anyhow!(
                "expected {num_inputs} embeddings, got {}",
                response.data.len()
            )));
        }

        let mut data = response.data;
        data.sort_by_key(|embedding| embedding.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

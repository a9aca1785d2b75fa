//! `SimplePrompt` over the chat completions endpoint of a deployment.
//!
//! A prompt becomes an optional system message followed by one user message; the first choice
//! of the answer is returned.
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use marquee_core::{
    SimplePrompt, errors::LanguageModelError, prompt::Prompt, util::debug_long_utf8,
};

use super::{AzureOpenAI, azure_openai_error_to_language_model_error};

#[async_trait]
impl SimplePrompt for AzureOpenAI {
    #[tracing::instrument(skip_all, err, fields(deployment = %self.deployment))]
    async fn prompt(&self, prompt: Prompt) -> Result<String, LanguageModelError> {
        let request = self.chat_request(&prompt)?;

        tracing::debug!(
            messages = debug_long_utf8(
                serde_json::to_string(&request.messages).map_err(LanguageModelError::permanent)?,
                200
            ),
            "[SimplePrompt] Request to azure openai"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(azure_openai_error_to_language_model_error)?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Tokens used"
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LanguageModelError::permanent("Expected content in response"))
    }
}

impl AzureOpenAI {
    #[allow(deprecated)]
    fn chat_request(
        &self,
        prompt: &Prompt,
    ) -> Result<CreateChatCompletionRequest, LanguageModelError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);

        if let Some(system) = prompt.render_system()? {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(LanguageModelError::permanent)?
                    .into(),
            );
        }

        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.render()?)
                .build()
                .map_err(LanguageModelError::permanent)?
                .into(),
        );

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.deployment)
            .messages(messages)
            .temperature(self.options.temperature)
            .top_p(self.options.top_p)
            .frequency_penalty(self.options.frequency_penalty)
            .presence_penalty(self.options.presence_penalty);

        // The preview api version predates `max_completion_tokens`
        if let Some(max_tokens) = self.options.max_tokens {
            args.max_tokens(max_tokens);
        }

        args.build().map_err(LanguageModelError::permanent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure_openai::{AzureConfig, Options};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    fn client(server: &MockServer, options: Options) -> AzureOpenAI {
        let config = AzureConfig::new()
            .with_api_base(server.uri())
            .with_api_key("test-key")
            .with_deployment_id("gpt-35-turbo-16k")
            .with_api_version("2024-02-15-preview");

        AzureOpenAI::builder()
            .client(async_openai::Client::with_config(config))
            .deployment("gpt-35-turbo-16k")
            .options(options)
            .build()
            .unwrap()
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-35-turbo-16k",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_prompt_sends_system_and_user_messages() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-35-turbo-16k/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    {"role": "system", "content": "You create datasets."},
                    {"role": "user", "content": "Generate movies"}
                ],
                "temperature": 0.0,
                "top_p": 0.95,
                "frequency_penalty": 0.0,
                "presence_penalty": 0.0,
                "max_tokens": 16000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"movies\": []}")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let answer = client(&mock_server, Options::with_max_tokens(16_000))
            .prompt(Prompt::from("Generate movies").with_system("You create datasets."))
            .await
            .unwrap();

        assert_eq!(answer, "{\"movies\": []}");
    }

    #[test]
    fn test_request_without_system_or_budget() {
        let config = AzureConfig::new().with_deployment_id("qa");
        let azure = AzureOpenAI::builder()
            .client(async_openai::Client::with_config(config))
            .deployment("qa")
            .build()
            .unwrap();

        let request = azure
            .chat_request(&Prompt::from("What happens in Heat?"))
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_context_length_exceeded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-35-turbo-16k/chat/completions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {
                    "message": "This model's maximum context length is 16384 tokens.",
                    "type": "invalid_request_error",
                    "param": "messages",
                    "code": "context_length_exceeded"
                }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, Options::default())
            .prompt(Prompt::from("A very long prompt"))
            .await
            .unwrap_err();

        assert!(matches!(err, LanguageModelError::ContextLengthExceeded(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_missing_content_is_an_error() {
        let mock_server = MockServer::start().await;
        let mut body = completion("");
        body["choices"][0]["message"]["content"] = serde_json::Value::Null;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server, Options::default())
            .prompt(Prompt::from("Anything"))
            .await
            .unwrap_err();

        assert!(matches!(err, LanguageModelError::PermanentError(_)));
    }
}

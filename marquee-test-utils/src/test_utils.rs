#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]
//! Clients pointed at a `wiremock` server, and mocks of the Azure endpoints they call.

use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use marquee_core::config::{OPENAI_API_VERSION, OpenAIServiceConfig, SearchServiceConfig};
use marquee_integrations::azure_openai::{AzureOpenAI, Options};
use marquee_integrations::azure_search::AzureSearch;

pub const EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
pub const COMPLETION_DEPLOYMENT: &str = "gpt-35-turbo-16k";
pub const OPENAI_KEY: &str = "openai-key";
pub const SEARCH_KEY: &str = "search-key";

pub fn openai_config(mock_server_uri: &str) -> OpenAIServiceConfig {
    OpenAIServiceConfig {
        endpoint: mock_server_uri.to_string(),
        api_key: SecretString::from(OPENAI_KEY),
        embedding_deployment: EMBEDDING_DEPLOYMENT.to_string(),
        completion_deployment: COMPLETION_DEPLOYMENT.to_string(),
    }
}

pub fn search_config(mock_server_uri: &str, index_name: &str) -> SearchServiceConfig {
    SearchServiceConfig {
        endpoint: mock_server_uri.to_string(),
        api_key: SecretString::from(SEARCH_KEY),
        index_name: index_name.to_string(),
    }
}

pub fn azure_openai_client(mock_server_uri: &str, deployment: &str) -> AzureOpenAI {
    AzureOpenAI::from_config(
        &openai_config(mock_server_uri),
        deployment,
        Options::default(),
    )
}

pub fn azure_search_client(mock_server_uri: &str, index_name: &str) -> AzureSearch {
    AzureSearch::from_config(&search_config(mock_server_uri, index_name))
}

fn deployment_path(deployment: &str, endpoint: &str) -> String {
    format!("/openai/deployments/{deployment}/{endpoint}")
}

/// Embeds every input as `[len, len, len]`, in request order.
struct EmbeddingResponder;

impl Respond for EmbeddingResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let inputs = match &body["input"] {
            Value::String(input) => vec![input.clone()],
            Value::Array(inputs) => inputs
                .iter()
                .map(|input| input.as_str().unwrap_or_default().to_string())
                .collect(),
            _ => vec![],
        };

        let data = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let len = input.len();
                json!({"object": "embedding", "embedding": [len, len, len], "index": index})
            })
            .collect::<Vec<_>>();

        ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": data,
            "model": EMBEDDING_DEPLOYMENT,
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }))
    }
}

/// Mocks the embeddings endpoint of `deployment`.
pub async fn mock_embeddings(mock_server: &MockServer, deployment: &str) {
    Mock::given(method("POST"))
        .and(path(deployment_path(deployment, "embeddings")))
        .and(query_param("api-version", OPENAI_API_VERSION))
        .and(header("api-key", OPENAI_KEY))
        .respond_with(EmbeddingResponder)
        .mount(mock_server)
        .await;
}

pub fn chat_completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1_677_652_288,
        "model": COMPLETION_DEPLOYMENT,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "logprobs": null,
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
    })
}

/// Mocks the chat completions endpoint of `deployment`, answering every request with `content`.
pub async fn mock_chat_completions(mock_server: &MockServer, deployment: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path(deployment_path(deployment, "chat/completions")))
        .and(header("api-key", OPENAI_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(content)))
        .mount(mock_server)
        .await;
}

/// Accepts every document and remembers it, so searches can return what was uploaded.
#[derive(Clone, Default)]
pub struct UploadedDocuments(Arc<Mutex<Vec<Value>>>);

impl UploadedDocuments {
    pub fn documents(&self) -> Vec<Value> {
        self.0.lock().unwrap().clone()
    }
}

impl Respond for UploadedDocuments {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
        let documents = body["value"].as_array().cloned().unwrap_or_default();

        let results = documents
            .iter()
            .map(|document| {
                json!({
                    "key": document["id"],
                    "status": true,
                    "errorMessage": null,
                    "statusCode": 201
                })
            })
            .collect::<Vec<_>>();

        self.0.lock().unwrap().extend(documents);
        ResponseTemplate::new(200).set_body_json(json!({ "value": results }))
    }
}

/// Mocks index creation and document upload for `index_name`.
///
/// Returns the documents received by the upload endpoint.
pub async fn mock_search_index(mock_server: &MockServer, index_name: &str) -> UploadedDocuments {
    Mock::given(method("PUT"))
        .and(path(format!("/indexes/{index_name}")))
        .and(header("api-key", SEARCH_KEY))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "name": index_name,
            "@odata.etag": "\"0x1\""
        })))
        .mount(mock_server)
        .await;

    let uploaded = UploadedDocuments::default();
    Mock::given(method("POST"))
        .and(path(format!("/indexes/{index_name}/docs/index")))
        .and(header("api-key", SEARCH_KEY))
        .respond_with(uploaded.clone())
        .mount(mock_server)
        .await;

    uploaded
}

/// Mocks the search endpoint of `index_name`, returning `documents`.
pub async fn mock_search(mock_server: &MockServer, index_name: &str, documents: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path(format!("/indexes/{index_name}/docs/search")))
        .and(header("api-key", SEARCH_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.count": documents.len(),
            "value": documents
        })))
        .mount(mock_server)
        .await;
}

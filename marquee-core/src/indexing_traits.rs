//! Traits at the seams between the pipelines and the hosted services
//!
//! The embedding endpoint, the chat completion endpoint and the search service are each hidden
//! behind a trait, so pipelines can be run against test doubles or different providers.
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::Embeddings;
use crate::errors::{LanguageModelError, SearchIndexError};
use crate::prompt::Prompt;
use crate::schema::{IndexDescriptor, IndexSchema};
use crate::{
    ingestion::{IndexingResult, SearchRequest, SearchResponse},
    movies::MovieDocument,
};

/// All traits are easily mockable under tests
#[cfg(feature = "test-utils")]
#[doc(hidden)]
use mockall::automock;

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Embeds a list of strings and returns its embeddings, in input order.
/// Assumes the strings will be moved.
pub trait EmbeddingModel: Send + Sync + Debug {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError>;
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// Given a prompt, queries an LLM and returns the raw text of the answer
pub trait SimplePrompt: Send + Sync + Debug {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LanguageModelError>;
}

#[cfg_attr(feature = "test-utils", automock)]
#[async_trait]
/// A remote search index that documents can be uploaded to and queried from
pub trait SearchIndex: Send + Sync + Debug {
    /// Creates the index, or updates it in place if it already exists.
    ///
    /// Running it again with an unchanged schema must not change the index.
    async fn create_or_update_index(
        &self,
        schema: &IndexSchema,
    ) -> Result<IndexDescriptor, SearchIndexError>;

    /// Uploads (upserts) a single batch of documents
    async fn upload_documents(
        &self,
        documents: Vec<MovieDocument>,
    ) -> Result<Vec<IndexingResult>, SearchIndexError>;

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchIndexError>;
}

#[async_trait]
impl<T: EmbeddingModel + ?Sized> EmbeddingModel for Arc<T> {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError> {
        (**self).embed(input).await
    }
}

#[async_trait]
impl<T: SimplePrompt + ?Sized> SimplePrompt for Arc<T> {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LanguageModelError> {
        (**self).prompt(prompt).await
    }
}

#[async_trait]
impl<T: SearchIndex + ?Sized> SearchIndex for Arc<T> {
    async fn create_or_update_index(
        &self,
        schema: &IndexSchema,
    ) -> Result<IndexDescriptor, SearchIndexError> {
        (**self).create_or_update_index(schema).await
    }

    async fn upload_documents(
        &self,
        documents: Vec<MovieDocument>,
    ) -> Result<Vec<IndexingResult>, SearchIndexError> {
        (**self).upload_documents(documents).await
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        (**self).search(request).await
    }
}

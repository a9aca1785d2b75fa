use async_trait::async_trait;
use reqwest::Method;

use marquee_core::SearchIndex;
use marquee_core::errors::SearchIndexError;
use marquee_core::ingestion::{IndexingResult, SearchRequest, SearchResponse};
use marquee_core::movies::MovieDocument;
use marquee_core::schema::{IndexDescriptor, IndexSchema};

use super::{AzureSearch, unexpected_response};

#[async_trait]
impl SearchIndex for AzureSearch {
    #[tracing::instrument(name = "search.create_index", skip_all, err, fields(index = %schema.name))]
    async fn create_or_update_index(
        &self,
        schema: &IndexSchema,
    ) -> Result<IndexDescriptor, SearchIndexError> {
        self.put_index(schema).await
    }

    #[tracing::instrument(
        name = "search.upload_batch",
        skip_all,
        err,
        fields(index = %self.index_name, documents = documents.len())
    )]
    async fn upload_documents(
        &self,
        documents: Vec<MovieDocument>,
    ) -> Result<Vec<IndexingResult>, SearchIndexError> {
        self.index_documents(&documents).await
    }

    #[tracing::instrument(name = "search.query", skip_all, err, fields(index = %self.index_name))]
    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        tracing::debug!(?request, "Querying index");

        let response = self
            .request(Method::POST, "/docs/search")
            .json(&request)
            .send()
            .await
            .map_err(SearchIndexError::request)?;

        if !response.status().is_success() {
            return Err(unexpected_response(response).await);
        }

        let response = response
            .json::<SearchResponse>()
            .await
            .map_err(SearchIndexError::request)?;

        tracing::debug!(
            returned = response.documents.len(),
            count = response.count,
            "Query answered"
        );

        Ok(response)
    }
}

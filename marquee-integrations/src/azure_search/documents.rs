use reqwest::{Method, StatusCode};
use serde::Serialize;

use marquee_core::errors::SearchIndexError;
use marquee_core::ingestion::{IndexingResponse, IndexingResult};
use marquee_core::movies::MovieDocument;

use super::{AzureSearch, unexpected_response};

#[derive(Serialize)]
struct IndexAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    document: &'a MovieDocument,
}

#[derive(Serialize)]
struct IndexBatch<'a> {
    value: Vec<IndexAction<'a>>,
}

impl AzureSearch {
    /// `POST /indexes/{name}/docs/index` with an `upload` action per document.
    ///
    /// A 207 means some documents were rejected; the per document results tell which.
    pub(crate) async fn index_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<Vec<IndexingResult>, SearchIndexError> {
        let batch = IndexBatch {
            value: documents
                .iter()
                .map(|document| IndexAction {
                    action: "upload",
                    document,
                })
                .collect(),
        };

        let response = self
            .request(Method::POST, "/docs/index")
            .json(&batch)
            .send()
            .await
            .map_err(SearchIndexError::request)?;

        match response.status() {
            StatusCode::OK | StatusCode::MULTI_STATUS => {
                let response = response
                    .json::<IndexingResponse>()
                    .await
                    .map_err(SearchIndexError::request)?;
                Ok(response.value)
            }
            _ => Err(unexpected_response(response).await),
        }
    }
}

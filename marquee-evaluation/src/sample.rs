//! Reads a sample of indexed documents to generate questions from.
use marquee_core::errors::SearchIndexError;
use marquee_core::ingestion::SearchRequest;
use marquee_core::{SearchDocument, SearchIndex};

/// Documents sampled by default
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// The request used to sample the index: every document, searched on the synopsis, with the
/// id, title and synopsis selected.
pub fn sample_request(top: usize) -> SearchRequest {
    SearchRequest::match_all(top)
        .with_search_fields(&["synopsis"])
        .with_select(&["id", "title", "synopsis"])
}

/// Fetches up to `top` documents from the index.
///
/// # Errors
///
/// Errors if the query fails
#[tracing::instrument(name = "evaluation.sample", skip(index), err)]
pub async fn fetch_sample_documents<I: SearchIndex + ?Sized>(
    index: &I,
    top: usize,
) -> Result<Vec<SearchDocument>, SearchIndexError> {
    let response = index.search(sample_request(top)).await?;

    tracing::info!(
        sampled = response.documents.len(),
        total = response.count,
        "Fetched sample documents"
    );

    Ok(response.documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_core::MockSearchIndex;
    use marquee_core::ingestion::SearchResponse;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test_log::test(tokio::test)]
    async fn test_sample_request_shape() {
        let mut index = MockSearchIndex::new();
        index
            .expect_search()
            .withf(|request| {
                serde_json::to_value(request).unwrap()
                    == json!({
                        "count": true,
                        "search": "*",
                        "searchFields": "synopsis",
                        "select": "id, title, synopsis",
                        "top": 10
                    })
            })
            .times(1)
            .returning(|_| {
                Ok(SearchResponse {
                    count: Some(30),
                    documents: vec![
                        json!({"id": "0", "title": "Heat", "synopsis": "Cops and robbers"})
                            .as_object()
                            .unwrap()
                            .clone(),
                    ],
                })
            });

        let documents = fetch_sample_documents(&index, DEFAULT_SAMPLE_SIZE)
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0]["title"], "Heat");
    }

    #[test_log::test(tokio::test)]
    async fn test_query_failure_is_returned() {
        let mut index = MockSearchIndex::new();
        index.expect_search().returning(|_| {
            Err(SearchIndexError::Response {
                status: 404,
                message: "No index with the name 'movies' was found".into(),
            })
        });

        let err = fetch_sample_documents(&index, 10).await.unwrap_err();

        assert!(matches!(err, SearchIndexError::Response { status: 404, .. }));
    }
}

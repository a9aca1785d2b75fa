//! Requests and responses of the document and query endpoints
use serde::{Deserialize, Serialize};

use crate::SearchDocument;

/// A keyword query against the index.
///
/// Serializes to the body of a `docs/search` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub search: String,
    /// Comma separated list of fields the query text is matched against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<String>,
    /// Comma separated list of fields to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
    pub top: usize,
    pub count: bool,
}

impl SearchRequest {
    /// Matches every document, returning at most `top` of them
    pub fn match_all(top: usize) -> Self {
        Self {
            search: "*".to_string(),
            search_fields: None,
            select: None,
            top,
            count: true,
        }
    }

    #[must_use]
    pub fn with_search_fields(mut self, fields: &[&str]) -> Self {
        self.search_fields = Some(fields.join(", "));
        self
    }

    #[must_use]
    pub fn with_select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.join(", "));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    /// Total number of matches, if the request asked for it
    #[serde(rename = "@odata.count", default)]
    pub count: Option<u64>,
    #[serde(rename = "value", default)]
    pub documents: Vec<SearchDocument>,
}

/// Outcome of a single document within an upload batch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingResult {
    pub key: String,
    pub status: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    pub status_code: u16,
}

impl IndexingResult {
    pub fn succeeded(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: true,
            error_message: None,
            status_code: 201,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IndexingResponse {
    pub value: Vec<IndexingResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sample_query_body() {
        let request = SearchRequest::match_all(10)
            .with_search_fields(&["synopsis"])
            .with_select(&["id", "title", "synopsis"]);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "count": true,
                "search": "*",
                "searchFields": "synopsis",
                "select": "id, title, synopsis",
                "top": 10
            })
        );
    }

    #[test]
    fn test_search_response_reads_odata_fields() {
        let response: SearchResponse = serde_json::from_value(json!({
            "@odata.context": "https://search.example.com/indexes('movies')/$metadata#docs",
            "@odata.count": 30,
            "value": [
                {"@search.score": 1.0, "id": "0", "title": "Heat", "synopsis": "s"}
            ]
        }))
        .unwrap();

        assert_eq!(response.count, Some(30));
        assert_eq!(response.documents.len(), 1);
        assert_eq!(response.documents[0]["title"], "Heat");
    }

    #[test]
    fn test_indexing_result_with_error() {
        let response: IndexingResponse = serde_json::from_value(json!({
            "value": [
                {"key": "0", "status": true, "errorMessage": null, "statusCode": 201},
                {"key": "1", "status": false, "errorMessage": "Document is too large", "statusCode": 400}
            ]
        }))
        .unwrap();

        assert_eq!(response.value[0], IndexingResult::succeeded("0"));
        assert!(!response.value[1].status);
        assert_eq!(
            response.value[1].error_message.as_deref(),
            Some("Document is too large")
        );
    }
}

use reqwest::{Method, StatusCode};

use marquee_core::errors::SearchIndexError;
use marquee_core::schema::{IndexDescriptor, IndexSchema};

use super::{AzureSearch, error_message};

impl AzureSearch {
    /// `PUT /indexes/{name}`, creating the index or updating it in place.
    pub(crate) async fn put_index(
        &self,
        schema: &IndexSchema,
    ) -> Result<IndexDescriptor, SearchIndexError> {
        tracing::debug!(
            index = schema.name,
            fields = schema.fields.len(),
            "Creating or updating index"
        );

        let response = self
            .request_to(Method::PUT, &schema.name, "")
            .header("Prefer", "return=representation")
            .json(schema)
            .send()
            .await
            .map_err(SearchIndexError::request)?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let body = response.text().await.map_err(SearchIndexError::request)?;
                Ok(serde_json::from_str::<IndexDescriptor>(&body).unwrap_or_else(|_| {
                    IndexDescriptor {
                        name: schema.name.clone(),
                        etag: None,
                    }
                }))
            }
            StatusCode::NO_CONTENT => Ok(IndexDescriptor {
                name: schema.name.clone(),
                etag: None,
            }),
            _ => {
                let (status, message) = error_message(response).await;
                if is_schema_conflict(status, &message) {
                    tracing::error!(index = schema.name, status, message, "Schema change rejected");
                    Err(SearchIndexError::SchemaConflict {
                        index: schema.name.clone(),
                        status,
                        message,
                    })
                } else {
                    tracing::error!(status, message, "Unexpected response from search service");
                    Err(SearchIndexError::Response { status, message })
                }
            }
        }
    }
}

/// The service answers an incompatible change to an existing index with a 400 that names the
/// field, or with a 409 when the index is locked by another change.
fn is_schema_conflict(status: u16, message: &str) -> bool {
    let message = message.to_lowercase();

    status == 409
        || (status == 400
            && (message.contains("cannot be changed") || message.contains("existing field")))
}

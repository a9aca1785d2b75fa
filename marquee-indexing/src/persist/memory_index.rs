use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use marquee_core::errors::SearchIndexError;
use marquee_core::ingestion::{IndexingResult, SearchRequest, SearchResponse};
use marquee_core::movies::MovieDocument;
use marquee_core::schema::{IndexDescriptor, IndexSchema, SearchField};
use marquee_core::{SearchDocument, SearchIndex};

#[derive(Debug, Clone)]
struct StoredIndex {
    name: String,
    fields: Vec<SearchField>,
    definition: serde_json::Value,
    version: u64,
}

impl StoredIndex {
    fn descriptor(&self) -> IndexDescriptor {
        IndexDescriptor {
            name: self.name.clone(),
            etag: Some(format!("\"{}\"", self.version)),
        }
    }
}

/// An in-memory search index that behaves like the hosted one where it matters for tests.
///
/// - Updating the index with an unchanged definition changes nothing, not even the etag
/// - Changing the type or key flag of an existing field, or dropping a field, is a schema conflict
/// - Uploads are upserts by document id
/// - A match all query returns documents in upload order
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    index: Arc<RwLock<Option<StoredIndex>>>,
    documents: Arc<RwLock<Vec<MovieDocument>>>,
    uploads: Arc<RwLock<Vec<usize>>>,
    rejected_keys: HashSet<String>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects uploads of the documents with these ids, like the service does with invalid
    /// documents
    #[must_use]
    pub fn rejecting(mut self, keys: &[&str]) -> Self {
        self.rejected_keys = keys.iter().map(ToString::to_string).collect();
        self
    }

    /// The current definition, as it would be sent over the wire
    pub async fn definition(&self) -> Option<serde_json::Value> {
        self.index
            .read()
            .await
            .as_ref()
            .map(|index| index.definition.clone())
    }

    pub async fn descriptor(&self) -> Option<IndexDescriptor> {
        self.index.read().await.as_ref().map(StoredIndex::descriptor)
    }

    pub async fn get(&self, id: &str) -> Option<MovieDocument> {
        self.documents
            .read()
            .await
            .iter()
            .find(|document| document.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Sizes of every upload request received, in order
    pub async fn uploads(&self) -> Vec<usize> {
        self.uploads.read().await.clone()
    }
}

fn conflict(index: &str, message: String) -> SearchIndexError {
    SearchIndexError::SchemaConflict {
        index: index.to_string(),
        status: 400,
        message,
    }
}

fn check_compatible(current: &StoredIndex, schema: &IndexSchema) -> Result<(), SearchIndexError> {
    for existing in &current.fields {
        let Some(field) = schema.field(&existing.name) else {
            return Err(conflict(
                &schema.name,
                format!("Existing field '{}' cannot be removed.", existing.name),
            ));
        };

        if field.data_type != existing.data_type || field.key != existing.key {
            return Err(conflict(
                &schema.name,
                format!("Existing field '{}' cannot be changed.", existing.name),
            ));
        }
    }

    Ok(())
}

fn select(document: &MovieDocument, select: Option<&str>) -> SearchDocument {
    let serde_json::Value::Object(mut fields) = serde_json::to_value(document).unwrap_or_default()
    else {
        return SearchDocument::new();
    };

    if let Some(select) = select {
        let selected = select.split(',').map(str::trim).collect::<HashSet<_>>();
        fields.retain(|name, _| selected.contains(name.as_str()));
    }

    fields
}

fn matches(document: &MovieDocument, request: &SearchRequest) -> bool {
    let needle = request.search.trim().to_lowercase();
    if needle.is_empty() || needle == "*" {
        return true;
    }

    let haystacks = match request.search_fields.as_deref() {
        Some(fields) => fields
            .split(',')
            .map(str::trim)
            .filter_map(|field| match field {
                "title" => Some(&document.title),
                "synopsis" => Some(&document.synopsis),
                "genre" => Some(&document.genre),
                "director" => Some(&document.director),
                _ => None,
            })
            .collect::<Vec<_>>(),
        None => vec![
            &document.title,
            &document.synopsis,
            &document.genre,
            &document.director,
        ],
    };

    haystacks
        .into_iter()
        .any(|text| text.to_lowercase().contains(&needle))
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn create_or_update_index(
        &self,
        schema: &IndexSchema,
    ) -> Result<IndexDescriptor, SearchIndexError> {
        let definition = serde_json::to_value(schema).map_err(SearchIndexError::request)?;
        let mut lock = self.index.write().await;

        let stored = match lock.take() {
            None => StoredIndex {
                name: schema.name.clone(),
                fields: schema.fields.clone(),
                definition,
                version: 1,
            },
            Some(current) if current.definition == definition => current,
            Some(current) => {
                if let Err(error) = check_compatible(&current, schema) {
                    *lock = Some(current);
                    return Err(error);
                }
                StoredIndex {
                    name: schema.name.clone(),
                    fields: schema.fields.clone(),
                    definition,
                    version: current.version + 1,
                }
            }
        };

        let descriptor = stored.descriptor();
        *lock = Some(stored);
        Ok(descriptor)
    }

    async fn upload_documents(
        &self,
        documents: Vec<MovieDocument>,
    ) -> Result<Vec<IndexingResult>, SearchIndexError> {
        self.uploads.write().await.push(documents.len());

        let mut stored = self.documents.write().await;
        let mut results = Vec::with_capacity(documents.len());

        for document in documents {
            if self.rejected_keys.contains(&document.id) {
                results.push(IndexingResult {
                    key: document.id,
                    status: false,
                    error_message: Some("Document rejected".to_string()),
                    status_code: 400,
                });
                continue;
            }

            let key = document.id.clone();
            match stored.iter_mut().find(|existing| existing.id == document.id) {
                Some(existing) => {
                    *existing = document;
                    results.push(IndexingResult {
                        status_code: 200,
                        ..IndexingResult::succeeded(key)
                    });
                }
                None => {
                    stored.push(document);
                    results.push(IndexingResult::succeeded(key));
                }
            }
        }

        Ok(results)
    }

    async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchIndexError> {
        if self.index.read().await.is_none() {
            return Err(SearchIndexError::Response {
                status: 404,
                message: "The index was not found.".to_string(),
            });
        }

        let stored = self.documents.read().await;
        let matching = stored
            .iter()
            .filter(|document| matches(document, &request))
            .collect::<Vec<_>>();

        Ok(SearchResponse {
            count: request.count.then_some(matching.len() as u64),
            documents: matching
                .into_iter()
                .take(request.top)
                .map(|document| select(document, request.select.as_deref()))
                .collect(),
        })
    }
}

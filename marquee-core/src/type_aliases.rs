pub type Embedding = Vec<f32>;
pub type Embeddings = Vec<Embedding>;

/// A document as returned by the search service; only the selected fields are present.
pub type SearchDocument = serde_json::Map<String, serde_json::Value>;

//! Declarative search index definition
//!
//! Serializes to the index definition of the Azure AI Search REST api: an ordered list of
//! fields, the vector search configuration (algorithms, profiles and vectorizers) and the
//! semantic configuration.
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub name: String,
    pub fields: Vec<SearchField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<VectorSearch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<SemanticSearch>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SearchField>) -> Self {
        Self {
            name: name.into(),
            fields,
            vector_search: None,
            semantic: None,
        }
    }

    #[must_use]
    pub fn with_vector_search(mut self, vector_search: VectorSearch) -> Self {
        self.vector_search = Some(vector_search);
        self
    }

    /// Adds a semantic configuration and makes it the default one
    #[must_use]
    pub fn with_semantic_configuration(mut self, configuration: SemanticConfiguration) -> Self {
        let semantic = self.semantic.get_or_insert_with(SemanticSearch::default);
        semantic.default_configuration = Some(configuration.name.clone());
        semantic.configurations.push(configuration);
        self
    }

    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn key_field(&self) -> Option<&SearchField> {
        self.fields.iter().find(|field| field.key)
    }
}

/// What the service answers after an index was created or updated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    #[serde(rename = "@odata.etag", default)]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchFieldDataType {
    #[serde(rename = "Edm.String")]
    String,
    #[serde(rename = "Edm.Int32")]
    Int32,
    #[serde(rename = "Edm.Int64")]
    Int64,
    #[serde(rename = "Edm.Double")]
    Double,
    #[serde(rename = "Edm.Boolean")]
    Boolean,
    /// A vector of 32 bit floats
    #[serde(rename = "Collection(Edm.Single)")]
    SingleCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: SearchFieldDataType,
    pub key: bool,
    pub searchable: bool,
    pub filterable: bool,
    pub sortable: bool,
    pub facetable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl SearchField {
    /// A field that is not full text searchable
    pub fn simple(name: impl Into<String>, data_type: SearchFieldDataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            analyzer: None,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    /// A full text searchable string field
    pub fn searchable(name: impl Into<String>) -> Self {
        Self {
            searchable: true,
            ..Self::simple(name, SearchFieldDataType::String)
        }
    }

    /// A vector field searched with the algorithm behind `profile`
    pub fn vector(name: impl Into<String>, dimensions: u32, profile: impl Into<String>) -> Self {
        Self {
            searchable: true,
            dimensions: Some(dimensions),
            vector_search_profile: Some(profile.into()),
            ..Self::simple(name, SearchFieldDataType::SingleCollection)
        }
    }

    #[must_use]
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    #[must_use]
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub fn facetable(mut self) -> Self {
        self.facetable = true;
        self
    }

    #[must_use]
    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }
}

#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearch {
    pub algorithms: Vec<VectorSearchAlgorithm>,
    pub profiles: Vec<VectorSearchProfile>,
    pub vectorizers: Vec<Vectorizer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VectorSearchMetric {
    Cosine,
    Euclidean,
    DotProduct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VectorSearchAlgorithm {
    /// Approximate nearest neighbours on a navigable small world graph
    Hnsw {
        name: String,
        #[serde(rename = "hnswParameters")]
        parameters: HnswParameters,
    },
    /// Brute force, exact nearest neighbours
    ExhaustiveKnn {
        name: String,
        #[serde(rename = "exhaustiveKnnParameters")]
        parameters: ExhaustiveKnnParameters,
    },
}

impl VectorSearchAlgorithm {
    pub fn name(&self) -> &str {
        match self {
            Self::Hnsw { name, .. } | Self::ExhaustiveKnn { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HnswParameters {
    /// Bi-directional links per node
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub metric: VectorSearchMetric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExhaustiveKnnParameters {
    pub metric: VectorSearchMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorSearchProfile {
    pub name: String,
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectorizer: Option<String>,
}

/// Tells the index which deployment turns query text into vectors at query time.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum Vectorizer {
    #[serde(rename = "azureOpenAI")]
    AzureOpenAI {
        name: String,
        #[serde(rename = "azureOpenAIParameters")]
        parameters: AzureOpenAIParameters,
    },
}

impl Vectorizer {
    pub fn name(&self) -> &str {
        match self {
            Self::AzureOpenAI { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureOpenAIParameters {
    pub resource_uri: String,
    pub deployment_id: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_api_key"
    )]
    pub api_key: Option<SecretString>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

#[allow(clippy::ref_option)]
fn serialize_api_key<S: Serializer>(
    api_key: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match api_key {
        Some(api_key) => serializer.serialize_some(api_key.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<String>,
    pub configurations: Vec<SemanticConfiguration>,
}

/// Fields the semantic ranker prioritizes when re-ranking results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConfiguration {
    pub name: String,
    pub prioritized_fields: PrioritizedFields,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_field: Option<SemanticField>,
    pub prioritized_content_fields: Vec<SemanticField>,
    pub prioritized_keywords_fields: Vec<SemanticField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticField {
    pub field_name: String,
}

impl SemanticField {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_flags_serialize() {
        let key = SearchField::simple("id", SearchFieldDataType::String)
            .key()
            .sortable()
            .filterable()
            .facetable();
        let vector = SearchField::vector("genreVector", 1536, "myHnswProfile");

        assert_eq!(
            serde_json::to_value(&key).unwrap(),
            json!({
                "name": "id",
                "type": "Edm.String",
                "key": true,
                "searchable": false,
                "filterable": true,
                "sortable": true,
                "facetable": true
            })
        );
        assert_eq!(
            serde_json::to_value(&vector).unwrap(),
            json!({
                "name": "genreVector",
                "type": "Collection(Edm.Single)",
                "key": false,
                "searchable": true,
                "filterable": false,
                "sortable": false,
                "facetable": false,
                "dimensions": 1536,
                "vectorSearchProfile": "myHnswProfile"
            })
        );
    }

    #[test]
    fn test_algorithms_are_tagged_by_kind() {
        let algorithms = vec![
            VectorSearchAlgorithm::Hnsw {
                name: "myHnsw".into(),
                parameters: HnswParameters {
                    m: 4,
                    ef_construction: 400,
                    ef_search: 500,
                    metric: VectorSearchMetric::Cosine,
                },
            },
            VectorSearchAlgorithm::ExhaustiveKnn {
                name: "myExhaustiveKnn".into(),
                parameters: ExhaustiveKnnParameters {
                    metric: VectorSearchMetric::DotProduct,
                },
            },
        ];

        assert_eq!(
            serde_json::to_value(&algorithms).unwrap(),
            json!([
                {
                    "kind": "hnsw",
                    "name": "myHnsw",
                    "hnswParameters": {"m": 4, "efConstruction": 400, "efSearch": 500, "metric": "cosine"}
                },
                {
                    "kind": "exhaustiveKnn",
                    "name": "myExhaustiveKnn",
                    "exhaustiveKnnParameters": {"metric": "dotProduct"}
                }
            ])
        );
    }

    #[test]
    fn test_vectorizer_exposes_key_only_on_the_wire() {
        let vectorizer = Vectorizer::AzureOpenAI {
            name: "myOpenAI".into(),
            parameters: AzureOpenAIParameters {
                resource_uri: "https://openai.example.com".into(),
                deployment_id: "ada".into(),
                api_key: Some(SecretString::from("secret")),
                model_name: None,
            },
        };

        assert!(!format!("{vectorizer:?}").contains("secret"));
        assert_eq!(
            serde_json::to_value(&vectorizer).unwrap(),
            json!({
                "kind": "azureOpenAI",
                "name": "myOpenAI",
                "azureOpenAIParameters": {
                    "resourceUri": "https://openai.example.com",
                    "deploymentId": "ada",
                    "apiKey": "secret"
                }
            })
        );
    }

    #[test]
    fn test_semantic_configuration_becomes_default() {
        let schema = IndexSchema::new(
            "movies",
            vec![SearchField::simple("id", SearchFieldDataType::String).key()],
        )
        .with_semantic_configuration(SemanticConfiguration {
            name: "my-semantic-config".into(),
            prioritized_fields: PrioritizedFields {
                title_field: Some(SemanticField::new("title")),
                ..PrioritizedFields::default()
            },
        });

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["semantic"]["defaultConfiguration"], "my-semantic-config");
        assert_eq!(
            json["semantic"]["configurations"][0]["prioritizedFields"]["titleField"]["fieldName"],
            "title"
        );
        assert!(json.get("vectorSearch").is_none());
        assert_eq!(schema.key_field().unwrap().name, "id");
    }
}

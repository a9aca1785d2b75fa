//! The definition of the movie index.
use marquee_core::config::OpenAIServiceConfig;
use marquee_core::schema::{
    AzureOpenAIParameters, ExhaustiveKnnParameters, HnswParameters, IndexSchema,
    PrioritizedFields, SearchField, SearchFieldDataType, SemanticConfiguration, SemanticField,
    VectorSearch, VectorSearchAlgorithm, VectorSearchMetric, VectorSearchProfile, Vectorizer,
};

/// Dimensions of an `text-embedding-ada-002` vector
pub const EMBEDDING_DIMENSIONS: u32 = 1536;

pub const HNSW_ALGORITHM: &str = "myHnsw";
pub const EXHAUSTIVE_KNN_ALGORITHM: &str = "myExhaustiveKnn";
pub const HNSW_PROFILE: &str = "myHnswProfile";
pub const EXHAUSTIVE_KNN_PROFILE: &str = "myExhaustiveKnnProfile";
pub const VECTORIZER: &str = "myOpenAI";
pub const SEMANTIC_CONFIGURATION: &str = "my-semantic-config";

const ANALYZER: &str = "en.microsoft";
const EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// The movie index: text fields searchable with the english analyzer, the synopsis and genre
/// vectors searched with HNSW, and a semantic configuration ranking on title, genre and synopsis.
///
/// The vectorizer points at the embedding deployment of `openai`, so queries can be vectorized
/// by the service itself.
pub fn movie_index_schema(name: impl Into<String>, openai: &OpenAIServiceConfig) -> IndexSchema {
    let fields = vec![
        SearchField::simple("id", SearchFieldDataType::String)
            .key()
            .sortable()
            .filterable()
            .facetable(),
        text_field("title"),
        text_field("synopsis"),
        text_field("genre"),
        text_field("director"),
        SearchField::simple("release_year", SearchFieldDataType::Int32),
        SearchField::vector("synopsisVector", EMBEDDING_DIMENSIONS, HNSW_PROFILE),
        SearchField::vector("genreVector", EMBEDDING_DIMENSIONS, HNSW_PROFILE),
    ];

    IndexSchema::new(name, fields)
        .with_vector_search(vector_search(openai))
        .with_semantic_configuration(SemanticConfiguration {
            name: SEMANTIC_CONFIGURATION.to_string(),
            prioritized_fields: PrioritizedFields {
                title_field: Some(SemanticField::new("title")),
                prioritized_content_fields: vec![SemanticField::new("synopsis")],
                prioritized_keywords_fields: vec![SemanticField::new("genre")],
            },
        })
}

fn text_field(name: &str) -> SearchField {
    SearchField::searchable(name)
        .analyzer(ANALYZER)
        .sortable()
        .filterable()
}

fn vector_search(openai: &OpenAIServiceConfig) -> VectorSearch {
    VectorSearch {
        algorithms: vec![
            VectorSearchAlgorithm::Hnsw {
                name: HNSW_ALGORITHM.to_string(),
                parameters: HnswParameters {
                    m: 4,
                    ef_construction: 400,
                    ef_search: 500,
                    metric: VectorSearchMetric::Cosine,
                },
            },
            VectorSearchAlgorithm::ExhaustiveKnn {
                name: EXHAUSTIVE_KNN_ALGORITHM.to_string(),
                parameters: ExhaustiveKnnParameters {
                    metric: VectorSearchMetric::Cosine,
                },
            },
        ],
        profiles: vec![
            VectorSearchProfile {
                name: HNSW_PROFILE.to_string(),
                algorithm: HNSW_ALGORITHM.to_string(),
                vectorizer: Some(VECTORIZER.to_string()),
            },
            VectorSearchProfile {
                name: EXHAUSTIVE_KNN_PROFILE.to_string(),
                algorithm: EXHAUSTIVE_KNN_ALGORITHM.to_string(),
                vectorizer: Some(VECTORIZER.to_string()),
            },
        ],
        vectorizers: vec![Vectorizer::AzureOpenAI {
            name: VECTORIZER.to_string(),
            parameters: AzureOpenAIParameters {
                resource_uri: openai.endpoint.clone(),
                deployment_id: openai.embedding_deployment.clone(),
                api_key: Some(openai.api_key.clone()),
                model_name: Some(EMBEDDING_MODEL.to_string()),
            },
        }],
    }
}

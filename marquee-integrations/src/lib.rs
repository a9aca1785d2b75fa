//! Clients for the hosted services behind the `marquee-core` traits.
//!
//! - [`azure_openai::AzureOpenAI`] implements `EmbeddingModel` and `SimplePrompt`
//! - [`azure_search::AzureSearch`] implements `SearchIndex`

pub mod azure_openai;
pub mod azure_search;

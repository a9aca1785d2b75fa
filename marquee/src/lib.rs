//! # Marquee
//!
//! Marquee builds a semantic movie search index on Azure AI Search and derives a question/answer
//! evaluation set from it.
//!
//! A run of `build-movie-index` generates (or loads) a synthetic movie dataset with Azure
//! `OpenAI`, embeds the synopsis and genre of every movie, defines the index with vector and
//! semantic search, and uploads the documents. `build-qa-eval-set` then samples the index and
//! writes question/answer pairs as json lines.
//!
//! ## Example
//!
//! ```no_run
//! # use anyhow::Result;
//! # use marquee::{config::Config, setup};
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let config = Config::from_env()?;
//!
//! let report = setup::movie_index_pipeline(&config, false, "data/movies_EN-US.json")?
//!     .run()
//!     .await?;
//!
//! println!("Uploaded {} documents", report.uploaded());
//! # Ok(())
//! # }
//! ```
//!
//! Every step is usable on its own; see [`indexing`] and [`evaluation`].

#[doc(inline)]
pub use marquee_core::{config, errors, prompt, template};
#[doc(inline)]
pub use marquee_core::type_aliases::*;

/// Common traits for the hosted services
pub mod traits {
    #[doc(inline)]
    pub use marquee_core::indexing_traits::*;
}

/// Azure `OpenAI` and Azure AI Search clients
pub mod integrations {
    #[doc(inline)]
    pub use marquee_integrations::*;
}

/// Dataset generation, embedding, the index definition and document upload
pub mod indexing {
    #[doc(inline)]
    pub use marquee_core::movies::*;
    #[doc(inline)]
    pub use marquee_core::schema::*;
    #[doc(inline)]
    pub use marquee_core::ingestion::*;
    #[doc(inline)]
    pub use marquee_indexing::*;
}

/// Sampling the index and generating question/answer pairs
pub mod evaluation {
    #[doc(inline)]
    pub use marquee_core::evaluation::*;
    #[doc(inline)]
    pub use marquee_evaluation::*;
}

pub mod setup;

#[doc(hidden)]
#[cfg(feature = "test-utils")]
pub mod test_utils {
    pub use marquee_core::test_utils::*;
}

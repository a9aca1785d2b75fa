#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Core types and traits for building a semantic movie index and deriving evaluation sets from
//! it.
//!
//! Every hosted service is reached through one of the traits in [`indexing_traits`], so the
//! pipelines in `marquee-indexing` and `marquee-evaluation` never depend on a concrete client.

pub mod config;
pub mod errors;
pub mod indexing_decorators;
pub mod indexing_traits;
pub mod prompt;
pub mod template;
pub mod type_aliases;
pub mod util;

mod index_schema;
mod movie;
mod qa;
mod report;
mod search;

pub use type_aliases::*;

/// All traits are available from the root
pub use crate::indexing_traits::*;

pub use crate::indexing_decorators::{BackoffConfiguration, LanguageModelWithBackOff};

pub mod movies {
    pub use crate::movie::*;
}

pub mod schema {
    pub use crate::index_schema::*;
}

pub mod evaluation {
    pub use crate::qa::*;
}

pub mod ingestion {
    pub use crate::report::*;
    pub use crate::search::*;
}

#[cfg(feature = "test-utils")]
pub mod test_utils;

//! Movie records, as generated and as indexed
use itertools::Itertools as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::Embedding;
use crate::errors::UpstreamError;
use crate::util::{debug_long_utf8, strip_code_fences};

/// A movie as it appears in the generated dataset and in the persisted dataset file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub synopsis: String,
    pub genre: String,
    pub director: String,
    #[serde(
        alias = "release year",
        alias = "releaseYear",
        deserialize_with = "deserialize_year"
    )]
    pub release_year: i32,
}

/// A movie with its id and embeddings, shaped exactly like the index schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDocument {
    pub id: String,
    pub title: String,
    pub synopsis: String,
    pub genre: String,
    pub director: String,
    pub release_year: i32,
    #[serde(rename = "synopsisVector")]
    pub synopsis_vector: Embedding,
    #[serde(rename = "genreVector")]
    pub genre_vector: Embedding,
}

impl MovieDocument {
    /// Builds the document for the movie at `position` in the dataset; the id is the position.
    pub fn from_movie(
        position: usize,
        movie: Movie,
        synopsis_vector: Embedding,
        genre_vector: Embedding,
    ) -> Self {
        let Movie {
            title,
            synopsis,
            genre,
            director,
            release_year,
        } = movie;

        Self {
            id: position.to_string(),
            title,
            synopsis,
            genre,
            director,
            release_year,
            synopsis_vector,
            genre_vector,
        }
    }
}

#[derive(Deserialize)]
struct GeneratedDataset {
    movies: Vec<Movie>,
}

/// Parses the raw completion of a dataset generation request.
///
/// The completion must be a json object with a `movies` array; a surrounding markdown code
/// fence is ignored.
///
/// # Errors
///
/// Errors with [`UpstreamError::Malformed`] if the text is not such a document
pub fn parse_generated_movies(completion: &str) -> Result<Vec<Movie>, UpstreamError> {
    let json = strip_code_fences(completion);

    serde_json::from_str::<GeneratedDataset>(json)
        .map(|dataset| dataset.movies)
        .map_err(|e| {
            tracing::error!(
                completion = debug_long_utf8(completion, 200),
                "Generated dataset is not valid"
            );
            UpstreamError::malformed(format!("expected a json object with `movies`: {e}"))
        })
}

/// Removes movies with a title that was already seen. The first occurrence wins and the order
/// is preserved.
pub fn dedupe_by_title(movies: Vec<Movie>) -> Vec<Movie> {
    movies
        .into_iter()
        .unique_by(|movie| movie.title.clone())
        .collect()
}

/// Parses a generated dataset and removes duplicate titles.
///
/// # Errors
///
/// See [`parse_generated_movies`]
pub fn clean_generated_dataset(completion: &str) -> Result<Vec<Movie>, UpstreamError> {
    let movies = parse_generated_movies(completion)?;
    let generated = movies.len();
    let movies = dedupe_by_title(movies);

    if movies.len() < generated {
        tracing::info!(
            generated,
            unique = movies.len(),
            "Removed duplicate titles from generated dataset"
        );
    }

    Ok(movies)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(i32),
    Text(String),
}

fn deserialize_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    match YearRepr::deserialize(deserializer)? {
        YearRepr::Number(year) => Ok(year),
        YearRepr::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

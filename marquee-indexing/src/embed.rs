//! Turns movies into index documents by embedding their synopsis and genre.
use futures_util::{StreamExt as _, stream};
use marquee_core::errors::{EmbeddingError, LanguageModelError};
use marquee_core::movies::{Movie, MovieDocument};
use marquee_core::{Embedding, EmbeddingModel};

/// Records embedded at the same time by default
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Embeds the synopsis and the genre of every movie, with at most `concurrency` movies in
/// flight.
///
/// The document built from the movie at position `n` gets the id `n`, and the output is in
/// input order no matter in which order the embeddings complete.
///
/// # Errors
///
/// Errors with the first embedding that failed; remaining work is dropped
#[tracing::instrument(name = "embed.movies", skip_all, err, fields(records = movies.len(), concurrency = concurrency))]
pub async fn embed_movies<M: EmbeddingModel + ?Sized>(
    model: &M,
    movies: Vec<Movie>,
    concurrency: usize,
) -> Result<Vec<MovieDocument>, EmbeddingError> {
    let total = movies.len();
    let mut slots: Vec<Option<MovieDocument>> =
        std::iter::repeat_with(|| None).take(total).collect();

    let mut embedded = stream::iter(movies.into_iter().enumerate())
        .map(|(position, movie)| async move {
            let synopsis_vector = embed_one(model, &movie.synopsis, "synopsis", position).await?;
            let genre_vector = embed_one(model, &movie.genre, "genre", position).await?;

            Ok::<_, EmbeddingError>((
                position,
                MovieDocument::from_movie(position, movie, synopsis_vector, genre_vector),
            ))
        })
        .buffer_unordered(concurrency.max(1));

    while let Some(result) = embedded.next().await {
        let (position, document) = result?;
        tracing::debug!(record = position, "Embedded movie");
        slots[position] = Some(document);
    }

    tracing::info!(records = total, "Embedded movies");
    Ok(slots.into_iter().flatten().collect())
}

async fn embed_one<M: EmbeddingModel + ?Sized>(
    model: &M,
    text: &str,
    field: &'static str,
    record: usize,
) -> Result<Embedding, EmbeddingError> {
    let to_error = |source: LanguageModelError| EmbeddingError {
        field,
        record,
        source,
    };

    model
        .embed(vec![text.to_string()])
        .await
        .map_err(to_error)?
        .into_iter()
        .next()
        .ok_or_else(|| to_error(LanguageModelError::permanent("no embedding returned")))
}

#![allow(clippy::missing_panics_doc)]
//! Fixtures and hand written test doubles shared by the workspace tests.
//!
//! The traits themselves are also mockable with `mockall` under this feature; the doubles here
//! cover the cases where a mock would need too much ceremony, like tracking concurrency.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::LanguageModelError;
use crate::movies::{Movie, MovieDocument};
use crate::prompt::Prompt;
use crate::{EmbeddingModel, Embeddings, SimplePrompt};

pub fn movie(position: usize) -> Movie {
    Movie {
        title: format!("Movie {position}"),
        synopsis: format!("Synopsis of movie {position}"),
        genre: ["Drama", "Comedy", "Thriller"][position % 3].to_string(),
        director: format!("Director {position}"),
        release_year: 1980 + i32::try_from(position % 40).unwrap_or_default(),
    }
}

pub fn movies(count: usize) -> Vec<Movie> {
    (0..count).map(movie).collect()
}

pub fn movie_documents(count: usize) -> Vec<MovieDocument> {
    movies(count)
        .into_iter()
        .enumerate()
        .map(|(position, movie)| {
            MovieDocument::from_movie(position, movie, vec![0.1; 3], vec![0.2; 3])
        })
        .collect()
}

type Responses = Arc<Mutex<VecDeque<Result<String, LanguageModelError>>>>;

/// Answers prompts with queued responses, in order, and records every rendered prompt.
#[derive(Debug, Clone, Default)]
pub struct MockPrompt {
    responses: Responses,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_prompt(&self, response: Result<String, LanguageModelError>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Rendered user messages, in the order they were received
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimplePrompt for MockPrompt {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LanguageModelError> {
        self.received.lock().unwrap().push(prompt.render()?);

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("Unexpected prompt: {:?}", prompt.render()))
    }
}

/// Embeds every text as `[text.len(), text.len()]` after a delay.
///
/// The delay is derived from the bytes of the text, so texts that only differ in a digit complete
/// out of submission order. Tracks the highest number of calls that were in flight at the same
/// time and the order in which texts completed.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedder {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
    completed: Arc<Mutex<Vec<String>>>,
    fail_on: Option<String>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails, permanently, for any input equal to `text`
    #[must_use]
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.fail_on = Some(text.into());
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embedded texts, in the order their calls completed
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        #[allow(clippy::cast_precision_loss)]
        let len = text.len() as f32;
        vec![len, len]
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbedder {
    async fn embed(&self, input: Vec<String>) -> Result<Embeddings, LanguageModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let jitter = input
            .iter()
            .flat_map(|text| text.bytes())
            .map(u64::from)
            .sum::<u64>()
            % 7;
        tokio::time::sleep(Duration::from_millis(5 + jitter * 5)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().extend(input.iter().cloned());

        if let Some(fail_on) = &self.fail_on {
            if input.iter().any(|text| text == fail_on) {
                return Err(LanguageModelError::permanent(anyhow::anyhow!(
                    "refusing to embed {fail_on}"
                )));
            }
        }

        Ok(input.iter().map(|text| Self::vector_for(text)).collect())
    }
}

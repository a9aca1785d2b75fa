//! Uploads documents to the search index in fixed size batches.
use itertools::Itertools as _;
use marquee_core::SearchIndex;
use marquee_core::errors::SearchIndexError;
use marquee_core::ingestion::{BatchResult, IndexingResult, IngestReport};
use marquee_core::movies::MovieDocument;

/// Documents per upload request by default
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Uploads `documents` in batches of `batch_size`, one batch after the other.
///
/// Every batch is attempted. A failed batch does not undo the ones before it and does not stop
/// the ones after it; the report has one entry per batch.
#[tracing::instrument(skip_all, fields(documents = documents.len(), batch_size = batch_size))]
pub async fn ingest_documents<I: SearchIndex + ?Sized>(
    index: &I,
    documents: Vec<MovieDocument>,
    batch_size: usize,
) -> IngestReport {
    let batches: Vec<Vec<MovieDocument>> = documents
        .into_iter()
        .chunks(batch_size.max(1))
        .into_iter()
        .map(Iterator::collect)
        .collect();

    let mut report = IngestReport::default();

    for (batch, documents) in batches.into_iter().enumerate() {
        let size = documents.len();
        let (accepted, outcome) = match index.upload_documents(documents).await {
            Ok(results) => check_results(batch, size, &results),
            Err(error) => (0, Err(error)),
        };

        match &outcome {
            Ok(()) => tracing::info!(batch, "Uploaded {size} documents"),
            Err(error) => tracing::error!(batch, accepted, %error, "Batch upload failed"),
        }

        report.push(BatchResult {
            batch,
            documents: size,
            accepted,
            outcome,
        });
    }

    report
}

/// Documents the service accepted, and an `Upload` error if it rejected any
fn check_results(
    batch: usize,
    size: usize,
    results: &[IndexingResult],
) -> (usize, Result<(), SearchIndexError>) {
    let (accepted, rejected): (Vec<_>, Vec<_>) =
        results.iter().partition(|result| result.status);

    if rejected.is_empty() {
        return (accepted.len(), Ok(()));
    }

    let reason = rejected
        .iter()
        .map(|result| {
            format!(
                "{} ({}): {}",
                result.key,
                result.status_code,
                result.error_message.as_deref().unwrap_or("rejected")
            )
        })
        .join("; ");

    (
        accepted.len(),
        Err(SearchIndexError::Upload {
            batch,
            reason: format!("{} of {size} documents rejected: {reason}", rejected.len()),
        }),
    )
}

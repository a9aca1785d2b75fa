//! Per batch outcome of an ingestion run
use crate::errors::SearchIndexError;

/// Outcome of uploading one batch.
#[derive(Debug)]
pub struct BatchResult {
    /// Zero based position of the batch
    pub batch: usize,
    /// Number of documents that were sent in this batch
    pub documents: usize,
    /// Number of documents the service accepted, also when it rejected others in the batch
    pub accepted: usize,
    /// Why the batch failed, if it did
    pub outcome: Result<(), SearchIndexError>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Every batch of an ingestion run, in upload order. A failed batch does not stop the ones
/// after it.
#[derive(Debug, Default)]
pub struct IngestReport {
    batches: Vec<BatchResult>,
}

impl IngestReport {
    pub fn push(&mut self, result: BatchResult) {
        self.batches.push(result);
    }

    pub fn batches(&self) -> &[BatchResult] {
        &self.batches
    }

    /// Documents accepted over all batches
    pub fn uploaded(&self) -> usize {
        self.batches
            .iter()
            .map(|batch| batch.accepted)
            .sum()
    }

    pub fn succeeded(&self) -> usize {
        self.batches.iter().filter(|batch| batch.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchResult> {
        self.batches.iter().filter(|batch| !batch.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.batches.iter().all(BatchResult::is_success)
    }

    /// The final batch uploaded
    pub fn last(&self) -> Option<&BatchResult> {
        self.batches.last()
    }
}

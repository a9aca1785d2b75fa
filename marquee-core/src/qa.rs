//! Question/answer pairs derived from indexed documents
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamError;

/// A generated question with the answer that is taken as ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub ground_truth: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, ground_truth: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ground_truth: ground_truth.into(),
        }
    }
}

/// Column oriented collection of question/answer pairs.
///
/// `question[i]` and `ground_truth[i]` always belong to the same pair, in the order they were
/// pushed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QaDataSet {
    question: Vec<String>,
    ground_truth: Vec<String>,
}

impl QaDataSet {
    pub fn push(&mut self, pair: QaPair) {
        self.question.push(pair.question);
        self.ground_truth.push(pair.ground_truth);
    }

    pub fn len(&self) -> usize {
        self.question.len()
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_empty()
    }

    pub fn questions(&self) -> &[String] {
        &self.question
    }

    pub fn ground_truths(&self) -> &[String] {
        &self.ground_truth
    }

    /// Iterates the rows as `(question, ground_truth)`
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.question
            .iter()
            .zip(&self.ground_truth)
            .map(|(q, a)| (q.as_str(), a.as_str()))
    }

    /// One `{"question": .., "ground_truth": ..}` object per line, each line terminated by a
    /// newline.
    ///
    /// # Errors
    ///
    /// Errors if a row cannot be serialized
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        #[derive(Serialize)]
        struct Row<'a> {
            question: &'a str,
            ground_truth: &'a str,
        }

        let mut out = String::new();
        for (question, ground_truth) in self.pairs() {
            out.push_str(&serde_json::to_string(&Row {
                question,
                ground_truth,
            })?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Extend<QaPair> for QaDataSet {
    fn extend<T: IntoIterator<Item = QaPair>>(&mut self, iter: T) {
        for pair in iter {
            self.push(pair);
        }
    }
}

impl FromIterator<QaPair> for QaDataSet {
    fn from_iter<T: IntoIterator<Item = QaPair>>(iter: T) -> Self {
        let mut dataset = Self::default();
        dataset.extend(iter);
        dataset
    }
}

/// What happened to a single source document during generation
#[derive(Debug)]
pub enum DocumentOutcome {
    Generated { document: usize, pairs: usize },
    Failed { document: usize, error: UpstreamError },
}

impl DocumentOutcome {
    pub fn document(&self) -> usize {
        match self {
            Self::Generated { document, .. } | Self::Failed { document, .. } => *document,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Pairs of every document that succeeded, plus one outcome per input document.
#[derive(Debug, Default)]
pub struct QaGenerationReport {
    pub dataset: QaDataSet,
    pub outcomes: Vec<DocumentOutcome>,
}

impl QaGenerationReport {
    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.is_failed())
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

//! Generates question/answer pairs from the text of indexed documents.
use std::sync::Arc;

use derive_builder::Builder;
use marquee_core::errors::UpstreamError;
use marquee_core::evaluation::{DocumentOutcome, QaGenerationReport, QaPair};
use marquee_core::prompt::Prompt;
use marquee_core::template::Template;
use marquee_core::util::{debug_long_utf8, strip_code_fences};
use marquee_core::{SearchDocument, SimplePrompt};
use serde::Deserialize;

/// Questions generated per document by default
pub const DEFAULT_NUM_QUESTIONS: usize = 3;

/// Generates long answer question/answer pairs with a chat model.
///
/// The prompt gets `text` and `num_questions` in its context and must ask for a json object
/// with a `question_answers` array of `{"question", "answer"}` objects. A bare array is accepted
/// as well.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct QaGenerator {
    #[builder(setter(custom))]
    client: Arc<dyn SimplePrompt>,
    #[builder(default = "default_prompt()")]
    prompt_template: Template,
    #[builder(default = "default_system_prompt()")]
    system_prompt: Template,
}

impl QaGenerator {
    pub fn builder() -> QaGeneratorBuilder {
        QaGeneratorBuilder::default()
    }

    pub fn new(client: impl SimplePrompt + 'static) -> Self {
        Self {
            client: Arc::new(client),
            prompt_template: default_prompt(),
            system_prompt: default_system_prompt(),
        }
    }

    /// Generates `num_questions` pairs from the `field_name` text of every document.
    ///
    /// Documents are processed in order and their pairs are appended in that order. A document
    /// without the field, a failed request or an answer that cannot be parsed is recorded as a
    /// failed outcome; the remaining documents are still processed.
    #[tracing::instrument(
        name = "evaluation.generate_qa",
        skip_all,
        fields(documents = documents.len(), field_name = field_name, num_questions = num_questions)
    )]
    pub async fn generate_qa_evaluation_dataset(
        &self,
        documents: &[SearchDocument],
        field_name: &str,
        num_questions: usize,
    ) -> QaGenerationReport {
        let mut report = QaGenerationReport::default();

        for (position, document) in documents.iter().enumerate() {
            match self.generate_for(document, field_name, num_questions).await {
                Ok(pairs) => {
                    for pair in &pairs {
                        tracing::debug!(
                            document = position,
                            question = %pair.question,
                            answer = %debug_long_utf8(&pair.ground_truth, 200),
                            "Generated question"
                        );
                    }
                    report.outcomes.push(DocumentOutcome::Generated {
                        document: position,
                        pairs: pairs.len(),
                    });
                    report.dataset.extend(pairs);
                }
                Err(error) => {
                    tracing::warn!(
                        document = position,
                        id = document.get("id").and_then(|id| id.as_str()),
                        %error,
                        "No questions generated for document"
                    );
                    report.outcomes.push(DocumentOutcome::Failed {
                        document: position,
                        error,
                    });
                }
            }
        }

        tracing::info!(
            pairs = report.dataset.len(),
            failed = report.failures().count(),
            "Generated question/answer pairs"
        );

        report
    }

    async fn generate_for(
        &self,
        document: &SearchDocument,
        field_name: &str,
        num_questions: usize,
    ) -> Result<Vec<QaPair>, UpstreamError> {
        let text = document
            .get(field_name)
            .and_then(|value| value.as_str())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                UpstreamError::malformed(format!("document has no text in `{field_name}`"))
            })?;

        let prompt = Prompt::from(self.prompt_template.clone())
            .with_system(self.system_prompt.clone())
            .with_context_value("text", text)
            .with_context_value("num_questions", num_questions);

        let completion = self.client.prompt(prompt).await?;

        parse_question_answers(&completion, num_questions)
    }
}

impl QaGeneratorBuilder {
    pub fn client(&mut self, client: impl SimplePrompt + 'static) -> &mut Self {
        self.client = Some(Arc::new(client));
        self
    }
}

#[derive(Deserialize)]
struct GeneratedPair {
    question: String,
    #[serde(alias = "ground_truth")]
    answer: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratedPairs {
    Object { question_answers: Vec<GeneratedPair> },
    List(Vec<GeneratedPair>),
}

/// Parses a completion into at most `num_questions` pairs.
///
/// # Errors
///
/// Errors with [`UpstreamError::Malformed`] if the completion is not json in one of the
/// accepted shapes, or holds no pairs
pub fn parse_question_answers(
    completion: &str,
    num_questions: usize,
) -> Result<Vec<QaPair>, UpstreamError> {
    let generated = serde_json::from_str::<GeneratedPairs>(strip_code_fences(completion))
        .map_err(|e| {
            UpstreamError::malformed(format!(
                "expected a json object with `question_answers`: {e}"
            ))
        })?;

    let pairs = match generated {
        GeneratedPairs::Object { question_answers } => question_answers,
        GeneratedPairs::List(pairs) => pairs,
    };

    if pairs.is_empty() {
        return Err(UpstreamError::malformed("no question/answer pairs generated"));
    }

    if pairs.len() < num_questions {
        tracing::warn!(
            generated = pairs.len(),
            num_questions,
            "Fewer questions generated than requested"
        );
    }

    Ok(pairs
        .into_iter()
        .take(num_questions)
        .map(|pair| QaPair::new(pair.question, pair.answer))
        .collect())
}

fn default_system_prompt() -> Template {
    "You are an AI assistant that writes evaluation datasets for question answering systems. \
     Every answer must be taken from the text you are given."
        .into()
}

fn default_prompt() -> Template {
    indoc::indoc! {r#"
    Write {{ num_questions }} questions about the text below, each with a long answer.

    ## Constraints
    * Every question must be answerable from the text alone.
    * Answers are complete sentences and may span several sentences.
    * Do not number the questions.
    * Answer with a json object with a single key `question_answers`, holding an array of
      objects with the keys `question` and `answer`.

    ## Text

    ---
    {{ text }}
    ---
    "#}
    .into()
}

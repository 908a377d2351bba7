use async_trait::async_trait;
use rand::rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;

use quiz_core::model::{QUIZ_SIZE, Question};

use crate::error::QuizFetchError;

/// Public trivia API the quiz batches come from.
pub const DEFAULT_BASE_URL: &str = "https://opentdb.com";

/// Difficulty requested for every batch. Fixed at build time, like the batch
/// size.
pub const QUIZ_DIFFICULTY: &str = "easy";

/// Source of quiz batches, one fetch per attempt.
///
/// Implementations convert every failure into a `QuizFetchError`; failures
/// are never retried here, the caller decides whether the user retries.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch one batch of unanswered questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizFetchError` on a non-zero remote response code or any
    /// transport/parsing fault.
    async fn fetch_quiz(&self) -> Result<Vec<Question>, QuizFetchError>;
}

/// `QuizSource` backed by the Open Trivia DB REST endpoint.
#[derive(Clone)]
pub struct OpenTdbClient {
    client: Client,
    base_url: String,
}

impl Default for OpenTdbClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenTdbClient {
    #[must_use]
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl QuizSource for OpenTdbClient {
    async fn fetch_quiz(&self) -> Result<Vec<Question>, QuizFetchError> {
        let url = format!(
            "{}/api.php?amount={}&difficulty={}",
            self.base_url.trim_end_matches('/'),
            QUIZ_SIZE,
            QUIZ_DIFFICULTY,
        );

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body: QuizResponseDto = response.json().await?;

        if body.response_code != 0 {
            return Err(QuizFetchError::Api(body.response_code));
        }

        let mut rng = rng();
        body.results
            .into_iter()
            .map(|dto| dto.into_question(&mut rng))
            .collect()
    }
}

/// Wire shape of the quiz API response. `response_code == 0` signals success;
/// any other value is an application-level error with no further detail.
#[derive(Debug, Deserialize)]
pub struct QuizResponseDto {
    pub response_code: i32,
    pub results: Vec<QuizQuestionDto>,
}

#[derive(Debug, Deserialize)]
pub struct QuizQuestionDto {
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub category: String,
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

impl QuizQuestionDto {
    /// Map the DTO into a domain question, building the display answer set
    /// from the correct answer plus all distractors with one unbiased
    /// shuffle.
    ///
    /// # Errors
    ///
    /// Returns `QuizFetchError::Question` if the resulting answer set is
    /// malformed (e.g. a distractor duplicates the correct answer).
    pub fn into_question<R: rand::Rng>(self, rng: &mut R) -> Result<Question, QuizFetchError> {
        let mut all_answers = self.incorrect_answers;
        all_answers.push(self.correct_answer.clone());
        all_answers.shuffle(rng);

        Question::new(
            self.question,
            self.category,
            self.difficulty,
            self.correct_answer,
            all_answers,
        )
        .map_err(QuizFetchError::from)
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("answer set does not contain the correct answer")]
    CorrectAnswerMissing,

    #[error("answer set contains the correct answer {count} times")]
    DuplicateCorrectAnswer { count: usize },

    #[error("question already has a confirmed answer")]
    AlreadyAnswered,
}

/// A single trivia question within an attempt.
///
/// `all_answers` holds the correct answer and the distractors in the order
/// they will be displayed; it is randomized once when the question is built
/// from the network response and never reordered afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    category: String,
    difficulty: String,
    correct_answer: String,
    all_answers: Vec<String>,
    chosen_answer: Option<String>,
}

impl Question {
    /// Build a fresh, unanswered question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::CorrectAnswerMissing` if `all_answers` lacks
    /// the correct answer, and `QuestionError::DuplicateCorrectAnswer` if it
    /// appears more than once.
    pub fn new(
        prompt: impl Into<String>,
        category: impl Into<String>,
        difficulty: impl Into<String>,
        correct_answer: impl Into<String>,
        all_answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let correct_answer = correct_answer.into();
        check_answer_set(&correct_answer, &all_answers)?;

        Ok(Self {
            prompt: prompt.into(),
            category: category.into(),
            difficulty: difficulty.into(),
            correct_answer,
            all_answers,
            chosen_answer: None,
        })
    }

    /// Rehydrate a question from persisted storage, chosen answer included.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the answer set invariant does not hold.
    pub fn from_persisted(
        prompt: String,
        category: String,
        difficulty: String,
        correct_answer: String,
        all_answers: Vec<String>,
        chosen_answer: Option<String>,
    ) -> Result<Self, QuestionError> {
        check_answer_set(&correct_answer, &all_answers)?;

        Ok(Self {
            prompt,
            category,
            difficulty,
            correct_answer,
            all_answers,
            chosen_answer,
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn all_answers(&self) -> &[String] {
        &self.all_answers
    }

    #[must_use]
    pub fn chosen_answer(&self) -> Option<&str> {
        self.chosen_answer.as_deref()
    }

    /// True once a choice has been confirmed for this question.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.chosen_answer.is_some()
    }

    /// Confirm the user's choice. A question accepts exactly one confirmed
    /// answer for its whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::AlreadyAnswered` on a second confirmation.
    pub fn record_choice(&mut self, answer: impl Into<String>) -> Result<(), QuestionError> {
        if self.chosen_answer.is_some() {
            return Err(QuestionError::AlreadyAnswered);
        }
        self.chosen_answer = Some(answer.into());
        Ok(())
    }

    /// True when the confirmed answer matches the correct one.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.chosen_answer.as_deref() == Some(self.correct_answer.as_str())
    }
}

fn check_answer_set(correct: &str, all_answers: &[String]) -> Result<(), QuestionError> {
    let count = all_answers.iter().filter(|a| a.as_str() == correct).count();
    match count {
        0 => Err(QuestionError::CorrectAnswerMissing),
        1 => Ok(()),
        count => Err(QuestionError::DuplicateCorrectAnswer { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_question() -> Question {
        Question::new(
            "Capital of France?",
            "Geography",
            "easy",
            "Paris",
            vec!["Lyon".into(), "Paris".into(), "Nice".into(), "Metz".into()],
        )
        .unwrap()
    }

    #[test]
    fn rejects_answer_set_without_correct_answer() {
        let err = Question::new(
            "Q",
            "General",
            "easy",
            "Right",
            vec!["Wrong".into(), "Also wrong".into()],
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::CorrectAnswerMissing);
    }

    #[test]
    fn rejects_duplicated_correct_answer() {
        let err = Question::new(
            "Q",
            "General",
            "easy",
            "Right",
            vec!["Right".into(), "Right".into(), "Wrong".into()],
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::DuplicateCorrectAnswer { count: 2 });
    }

    #[test]
    fn records_choice_exactly_once() {
        let mut question = build_question();
        assert!(!question.is_answered());

        question.record_choice("Lyon").unwrap();
        assert_eq!(question.chosen_answer(), Some("Lyon"));
        assert!(!question.is_correct());

        let err = question.record_choice("Paris").unwrap_err();
        assert_eq!(err, QuestionError::AlreadyAnswered);
        assert_eq!(question.chosen_answer(), Some("Lyon"));
    }

    #[test]
    fn correct_choice_is_detected() {
        let mut question = build_question();
        question.record_choice("Paris").unwrap();
        assert!(question.is_correct());
    }
}

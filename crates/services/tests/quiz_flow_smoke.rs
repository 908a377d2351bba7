use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{QUIZ_SIZE, Question, QuizScore};
use quiz_core::time::fixed_clock;
use services::{
    QuizEngine, QuizSource, QuizState, SessionHistoryService, SessionRecorder,
    error::QuizFetchError,
};
use storage::repository::InMemoryRepository;

struct FixedSource;

#[async_trait]
impl QuizSource for FixedSource {
    async fn fetch_quiz(&self) -> Result<Vec<Question>, QuizFetchError> {
        (1..=QUIZ_SIZE)
            .map(|n| {
                Question::new(
                    format!("Question {n}"),
                    "General",
                    "easy",
                    "Right",
                    vec![
                        "Wrong 1".into(),
                        "Right".into(),
                        "Wrong 2".into(),
                        "Wrong 3".into(),
                    ],
                )
                .map_err(QuizFetchError::from)
            })
            .collect()
    }
}

#[tokio::test]
async fn finished_quiz_lands_in_history_and_reads_back() {
    let repo = Arc::new(InMemoryRepository::new());
    let recorder = SessionRecorder::new(fixed_clock(), repo.clone());
    let mut engine = QuizEngine::new(Arc::new(FixedSource), recorder);

    engine.begin_quiz().await;

    // Answer three right, two wrong.
    for n in 1..=QUIZ_SIZE {
        let answer = if n <= 3 { "Right" } else { "Wrong 1" };
        engine.choose_answer(answer);
        engine.confirm_answer().await;
        engine.confirm_answer().await;
    }
    assert_eq!(engine.state(), &QuizState::Result(QuizScore::Three));

    let history = SessionHistoryService::new(repo);
    let previews = history.list_previews().await.unwrap();
    assert_eq!(previews.len(), 1);
    assert_eq!(previews[0].count_of_right_answers, 3);

    let session = history
        .get_session(previews[0].session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.results().len(), QUIZ_SIZE);
    assert_eq!(session.count_of_right_answers(), 3);
    assert_eq!(session.results()[0].chosen_answer(), Some("Right"));
    assert_eq!(session.results()[4].chosen_answer(), Some("Wrong 1"));
}

use std::mem;
use std::sync::Arc;

use quiz_core::model::{Question, QuizScore};

use crate::quiz_client::QuizSource;
use crate::recorder::SessionRecorder;
use crate::timer::QuizTimer;

/// Ceiling for one attempt, in seconds.
pub const DEFAULT_ALLOWED_SECONDS: u64 = 300;

/// Screen states of one quiz attempt, matched exhaustively at the UI
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    /// Idle, no attempt.
    Start,
    /// Fetch in flight.
    Loading,
    /// Fetch failed; retry re-enters `Loading`.
    Error,
    /// Attempt active.
    Quiz(ActiveQuiz),
    /// Attempt finished, score computed.
    Result(QuizScore),
}

/// In-memory state of the active attempt.
///
/// `pending_questions` keeps exactly the fetch order; nothing is reordered
/// after the batch arrives. `passed_questions` is append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuiz {
    pub current_question: Question,
    pub pending_questions: Vec<Question>,
    pub passed_questions: Vec<Question>,
    pub chosen_answer: Option<String>,
    pub elapsed_seconds: u64,
    pub allowed_seconds: u64,
    pub is_dialog_lose_shown: bool,
}

/// Drives one quiz attempt from begin to finish or abandonment.
///
/// The engine's state is exclusively owned and serially mutated; the caller
/// serializes intents. Every transition out of `Quiz` cancels the countdown
/// timer and awaits its task first, so a stale tick can never mutate a dead
/// attempt.
pub struct QuizEngine {
    state: QuizState,
    source: Arc<dyn QuizSource>,
    recorder: SessionRecorder,
    allowed_seconds: u64,
    timer: Option<QuizTimer>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(source: Arc<dyn QuizSource>, recorder: SessionRecorder) -> Self {
        Self {
            state: QuizState::Start,
            source,
            recorder,
            allowed_seconds: DEFAULT_ALLOWED_SECONDS,
            timer: None,
        }
    }

    /// Override the per-attempt time ceiling.
    #[must_use]
    pub fn with_allowed_seconds(mut self, allowed_seconds: u64) -> Self {
        self.allowed_seconds = allowed_seconds;
        self
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    /// Begin (or retry) an attempt: fetch a batch and enter `Quiz`, or
    /// `Error` on a failed fetch.
    ///
    /// Legal from `Start`, `Error`, and `Result`; ignored while a fetch is in
    /// flight or an attempt is active.
    pub async fn begin_quiz(&mut self) {
        if matches!(self.state, QuizState::Loading | QuizState::Quiz(_)) {
            return;
        }

        self.state = QuizState::Loading;
        match self.source.fetch_quiz().await {
            Ok(batch) => {
                let mut pending = batch;
                if pending.is_empty() {
                    self.state = QuizState::Error;
                    return;
                }
                let current = pending.remove(0);
                self.state = QuizState::Quiz(ActiveQuiz {
                    current_question: current,
                    pending_questions: pending,
                    passed_questions: Vec::new(),
                    chosen_answer: None,
                    elapsed_seconds: 0,
                    allowed_seconds: self.allowed_seconds,
                    is_dialog_lose_shown: false,
                });
                self.timer = Some(QuizTimer::start(self.allowed_seconds));
            }
            Err(err) => {
                tracing::debug!(error = %err, "quiz fetch failed");
                self.state = QuizState::Error;
            }
        }
    }

    /// Record a not-yet-confirmed choice for the current question.
    ///
    /// Repeated calls overwrite the pending choice. Ignored outside `Quiz`
    /// and once the current question has been confirmed.
    pub fn choose_answer(&mut self, answer: &str) {
        if let QuizState::Quiz(active) = &mut self.state {
            if !active.current_question.is_answered() {
                active.chosen_answer = Some(answer.to_owned());
            }
        }
    }

    /// Confirm the pending choice, or advance past an already-confirmed
    /// question.
    ///
    /// The first confirmation copies the pending choice into the current
    /// question (rejected as a no-op when no choice exists). The second moves
    /// on: the question joins `passed_questions` and the next pending
    /// question is promoted, or, when none remains, the attempt finishes —
    /// timer stopped, score computed, session persisted.
    pub async fn confirm_answer(&mut self) {
        if let QuizState::Quiz(active) = &mut self.state {
            if !active.current_question.is_answered() {
                let Some(choice) = active.chosen_answer.clone() else {
                    return;
                };
                let _ = active.current_question.record_choice(choice);
                return;
            }
        } else {
            return;
        }

        match mem::replace(&mut self.state, QuizState::Start) {
            QuizState::Quiz(mut active) => {
                active.passed_questions.push(active.current_question);

                if active.pending_questions.is_empty() {
                    self.stop_timer().await;
                    self.finish(active.passed_questions).await;
                } else {
                    let next = active.pending_questions.remove(0);
                    self.state = QuizState::Quiz(ActiveQuiz {
                        current_question: next,
                        pending_questions: active.pending_questions,
                        passed_questions: active.passed_questions,
                        chosen_answer: None,
                        elapsed_seconds: active.elapsed_seconds,
                        allowed_seconds: active.allowed_seconds,
                        is_dialog_lose_shown: active.is_dialog_lose_shown,
                    });
                }
            }
            other => self.state = other,
        }
    }

    async fn finish(&mut self, passed_questions: Vec<Question>) {
        let count = passed_questions.iter().filter(|q| q.is_correct()).count();
        let score = QuizScore::from_count(count);

        // Count fits: an attempt holds at most the batch size of questions.
        let count = u32::try_from(count).unwrap_or(0);
        if let Err(err) = self.recorder.save_session(count, &passed_questions).await {
            // The score was already computed and shown; losing one history
            // row must not fail the attempt.
            tracing::warn!(error = %err, "failed to persist finished quiz session");
        }

        self.state = QuizState::Result(score);
    }

    /// Merge the timer's additive updates into the attempt state.
    ///
    /// Once the ceiling is reached `is_dialog_lose_shown` turns on, and no
    /// further automatic transition happens; an explicit user action (e.g.
    /// `return_to_beginning`) is required.
    pub fn poll_timer(&mut self) {
        let Some(timer) = &self.timer else {
            return;
        };
        if let QuizState::Quiz(active) = &mut self.state {
            active.elapsed_seconds = timer.elapsed_seconds();
            if timer.is_expired() {
                active.is_dialog_lose_shown = true;
            }
        }
    }

    /// Abandon any in-flight attempt without persisting and return to
    /// `Start`. The timer is cancelled (and its task awaited) first.
    pub async fn return_to_beginning(&mut self) {
        self.stop_timer().await;
        self.state = QuizState::Start;
    }

    async fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::time::fixed_clock;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::repository::{InMemoryRepository, SessionRepository, StorageError};

    use crate::error::QuizFetchError;

    fn question(n: usize) -> Question {
        Question::new(
            format!("Question {n}"),
            "General",
            "easy",
            "Right",
            vec![
                "Right".into(),
                "Wrong 1".into(),
                "Wrong 2".into(),
                "Wrong 3".into(),
            ],
        )
        .unwrap()
    }

    fn batch(size: usize) -> Vec<Question> {
        (1..=size).map(question).collect()
    }

    struct StubSource {
        responses: Mutex<VecDeque<Result<Vec<Question>, QuizFetchError>>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(responses: Vec<Result<Vec<Question>, QuizFetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuizSource for StubSource {
        async fn fetch_quiz(&self) -> Result<Vec<Question>, QuizFetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(QuizFetchError::Api(1)))
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl SessionRepository for FailingRepository {
        async fn save_session(
            &self,
            _session: &quiz_core::model::QuizSession,
        ) -> Result<quiz_core::model::SessionId, StorageError> {
            Err(StorageError::Connection("disk gone".into()))
        }

        async fn get_session(
            &self,
            _id: quiz_core::model::SessionId,
        ) -> Result<Option<quiz_core::model::QuizSession>, StorageError> {
            Ok(None)
        }

        async fn list_previews(
            &self,
        ) -> Result<Vec<quiz_core::model::SessionPreview>, StorageError> {
            Ok(Vec::new())
        }

        async fn rename_session(
            &self,
            _id: quiz_core::model::SessionId,
            _name: &str,
        ) -> Result<(), StorageError> {
            Err(StorageError::NotFound)
        }

        async fn delete_session(
            &self,
            _id: quiz_core::model::SessionId,
        ) -> Result<(), StorageError> {
            Ok(())
        }

        async fn clear_all(&self) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn engine_with(
        source: Arc<StubSource>,
        sessions: Arc<dyn SessionRepository>,
    ) -> QuizEngine {
        QuizEngine::new(source, SessionRecorder::new(fixed_clock(), sessions))
    }

    #[tokio::test]
    async fn full_run_with_all_correct_answers_scores_five() {
        let source = StubSource::new(vec![Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo.clone());

        engine.begin_quiz().await;
        assert!(matches!(engine.state(), QuizState::Quiz(_)));

        // Two confirms per question: confirm the choice, then advance.
        for _ in 0..5 {
            engine.choose_answer("Right");
            engine.confirm_answer().await;
            engine.confirm_answer().await;
        }

        assert_eq!(engine.state(), &QuizState::Result(QuizScore::Five));

        let previews = repo.list_previews().await.unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].count_of_right_answers, 5);
    }

    #[tokio::test]
    async fn final_confirm_never_leaves_a_dangling_question() {
        let source = StubSource::new(vec![Ok(batch(1))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo);

        engine.begin_quiz().await;
        engine.choose_answer("Wrong 1");
        engine.confirm_answer().await;
        engine.confirm_answer().await;

        assert_eq!(engine.state(), &QuizState::Result(QuizScore::Zero));
    }

    #[tokio::test]
    async fn fetch_error_enters_error_state_and_retry_refetches() {
        let source = StubSource::new(vec![Err(QuizFetchError::Api(1)), Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source.clone(), repo);

        engine.begin_quiz().await;
        assert_eq!(engine.state(), &QuizState::Error);

        engine.begin_quiz().await;
        assert!(matches!(engine.state(), QuizState::Quiz(_)));
        assert_eq!(source.calls(), 2);

        engine.return_to_beginning().await;
        assert_eq!(engine.state(), &QuizState::Start);
    }

    #[tokio::test]
    async fn confirm_without_a_choice_is_a_no_op() {
        let source = StubSource::new(vec![Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo);

        engine.begin_quiz().await;
        let before = engine.state().clone();

        engine.confirm_answer().await;
        assert_eq!(engine.state(), &before);
    }

    #[tokio::test]
    async fn choosing_again_overwrites_only_the_pending_choice() {
        let source = StubSource::new(vec![Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo);

        engine.begin_quiz().await;
        engine.choose_answer("Wrong 1");
        engine.choose_answer("Right");

        let QuizState::Quiz(active) = engine.state() else {
            panic!("expected an active quiz");
        };
        assert_eq!(active.chosen_answer.as_deref(), Some("Right"));
        assert!(!active.current_question.is_answered());
    }

    #[tokio::test]
    async fn choosing_after_confirmation_is_ignored() {
        let source = StubSource::new(vec![Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo);

        engine.begin_quiz().await;
        engine.choose_answer("Right");
        engine.confirm_answer().await;
        engine.choose_answer("Wrong 1");

        let QuizState::Quiz(active) = engine.state() else {
            panic!("expected an active quiz");
        };
        assert_eq!(active.current_question.chosen_answer(), Some("Right"));
        assert_eq!(active.chosen_answer.as_deref(), Some("Right"));
    }

    #[tokio::test]
    async fn pending_questions_keep_fetch_order() {
        let source = StubSource::new(vec![Ok(batch(3))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo.clone());

        engine.begin_quiz().await;
        for expected in 1..=3 {
            let QuizState::Quiz(active) = engine.state() else {
                panic!("expected an active quiz");
            };
            assert_eq!(
                active.current_question.prompt(),
                format!("Question {expected}")
            );
            engine.choose_answer("Right");
            engine.confirm_answer().await;
            engine.confirm_answer().await;
        }

        let previews = repo.list_previews().await.unwrap();
        let session = repo
            .get_session(previews[0].session_id)
            .await
            .unwrap()
            .unwrap();
        let prompts: Vec<_> = session.results().iter().map(|q| q.prompt()).collect();
        assert_eq!(prompts, vec!["Question 1", "Question 2", "Question 3"]);
    }

    #[tokio::test]
    async fn persistence_failure_still_shows_the_result() {
        let source = StubSource::new(vec![Ok(batch(1))]);
        let mut engine = engine_with(source, Arc::new(FailingRepository));

        engine.begin_quiz().await;
        engine.choose_answer("Right");
        engine.confirm_answer().await;
        engine.confirm_answer().await;

        assert_eq!(engine.state(), &QuizState::Result(QuizScore::One));
    }

    #[tokio::test(start_paused = true)]
    async fn running_out_of_time_raises_the_lose_dialog_only() {
        let source = StubSource::new(vec![Ok(batch(5))]);
        let repo = Arc::new(InMemoryRepository::new());
        let mut engine = engine_with(source, repo.clone()).with_allowed_seconds(2);

        engine.begin_quiz().await;
        tokio::time::sleep(std::time::Duration::from_millis(2_500)).await;
        engine.poll_timer();

        let QuizState::Quiz(active) = engine.state() else {
            panic!("expected the attempt to stay active");
        };
        assert!(active.is_dialog_lose_shown);
        assert_eq!(active.elapsed_seconds, 2);

        // No automatic transition, nothing persisted; only an explicit action
        // leaves this state.
        assert!(repo.list_previews().await.unwrap().is_empty());
        engine.return_to_beginning().await;
        assert_eq!(engine.state(), &QuizState::Start);
        assert!(repo.list_previews().await.unwrap().is_empty());
    }
}

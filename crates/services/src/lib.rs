#![forbid(unsafe_code)]

pub mod engine;
pub mod error;
pub mod history;
pub mod quiz_client;
pub mod recorder;
pub mod timer;

pub use quiz_core::Clock;

pub use engine::{ActiveQuiz, QuizEngine, QuizState};
pub use error::{HistoryError, QuizFetchError, SessionSaveError};
pub use history::{SessionHistoryService, SessionPreviewItem};
pub use quiz_client::{OpenTdbClient, QuizSource};
pub use recorder::SessionRecorder;
pub use timer::QuizTimer;

mod ids;
mod question;
mod score;
mod session;

pub use ids::SessionId;
pub use question::{Question, QuestionError};
pub use score::{QUIZ_SIZE, QuizScore};
pub use session::{QuizSession, SessionError, SessionPreview};

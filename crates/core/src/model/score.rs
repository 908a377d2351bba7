/// Number of questions in every quiz attempt.
pub const QUIZ_SIZE: usize = 5;

/// Final score of a finished attempt, one variant per exact count of right
/// answers.
///
/// The narrative shown to the user is a static lookup by exact score value,
/// not a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuizScore {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
}

impl QuizScore {
    /// Map a count of right answers to its score variant.
    ///
    /// Counts outside `0..=QUIZ_SIZE` fall back to `Zero`.
    #[must_use]
    pub fn from_count(count: usize) -> Self {
        match count {
            1 => Self::One,
            2 => Self::Two,
            3 => Self::Three,
            4 => Self::Four,
            5 => Self::Five,
            _ => Self::Zero,
        }
    }

    /// The count of right answers this score represents.
    #[must_use]
    pub fn count(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Zero => "Bad luck!",
            Self::One => "A rough start",
            Self::Two => "Room to grow",
            Self::Three => "Solid effort",
            Self::Four => "Almost perfect!",
            Self::Five => "Brilliant!",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Zero => "No right answers this time. Try again and it can only get better.",
            Self::One => "One right answer. Warm up with another round.",
            Self::Two => "Two right answers. You are getting the hang of it.",
            Self::Three => "Three out of five. A respectable result.",
            Self::Four => "Four right answers. So close to a perfect run!",
            Self::Five => "All five answers correct. Flawless victory!",
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a persisted quiz session.
///
/// The value is the session's completion time in epoch milliseconds, which
/// keeps ids monotonically related to time and directly usable as an SQLite
/// integer primary key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(i64);

impl SessionId {
    /// Creates a new `SessionId`
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying i64 value
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_orders_by_time() {
        let earlier = SessionId::new(1_700_000_000_000);
        let later = SessionId::new(1_700_000_000_001);
        assert!(earlier < later);
        assert_eq!(earlier.value(), 1_700_000_000_000);
    }
}

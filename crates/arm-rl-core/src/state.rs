//! Environment state snapshots

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Internal environment state attached to a step
pub trait State: Clone + Debug + Send + Sync {
    /// Flat feature vector
    fn features(&self) -> Vec<f64>;

    /// Whether the episode is over in this state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// How a state relates to the end of its episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Terminal {
    /// Episode continues
    No,
    /// Episode ended on its own terms
    Yes,
    /// Episode cut short by a step budget
    Truncated,
}

impl Terminal {
    /// Build from the two step flags; `done` takes precedence
    #[must_use]
    pub fn from_flags(done: bool, truncated: bool) -> Self {
        match (done, truncated) {
            (true, _) => Self::Yes,
            (false, true) => Self::Truncated,
            (false, false) => Self::No,
        }
    }

    /// Whether no further steps follow
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Terminal::from_flags(false, false), Terminal::No);
        assert_eq!(Terminal::from_flags(true, true), Terminal::Yes);
        assert_eq!(Terminal::from_flags(false, true), Terminal::Truncated);
        assert!(!Terminal::No.is_terminal());
        assert!(Terminal::Truncated.is_terminal());
    }
}

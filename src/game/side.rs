//! The two sides of a match.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The human player.
    Player,
    /// The AI opponent.
    Opponent,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    /// Whether units of this side count as enemy units from the player's view.
    #[must_use]
    pub const fn is_enemy(self) -> bool {
        matches!(self, Side::Opponent)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Opponent => write!(f, "opponent"),
        }
    }
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The player pushed their accumulated volume past the threshold.
    PlayerWin,
    /// The opponent did.
    OpponentWin,
}

impl Outcome {
    /// Outcome in favour of the given side.
    #[must_use]
    pub const fn won_by(side: Side) -> Self {
        match side {
            Side::Player => Outcome::PlayerWin,
            Side::Opponent => Outcome::OpponentWin,
        }
    }

    /// The winning side.
    #[must_use]
    pub const fn winner(self) -> Side {
        match self {
            Outcome::PlayerWin => Side::Player,
            Outcome::OpponentWin => Side::Opponent,
        }
    }
}

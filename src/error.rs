//! Error types for the match engine.

use std::fmt;

use crate::game::{CardRoute, Coord, Side};

/// Errors raised by the match engine.
///
/// Most of these are absorbed at the decision/action boundary: the match state
/// itself never fails a transition. They surface to callers only from player
/// actions and configuration loading.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A card effect was routed to a receiver that cannot apply it.
    InvalidTarget {
        /// Name of the effect.
        effect: &'static str,
        /// Receiver the card was routed to.
        route: CardRoute,
    },
    /// A draw was attempted with a full hand.
    CapacityExceeded {
        /// The hand capacity.
        capacity: usize,
    },
    /// Random placement was attempted with no free tile.
    EmptyPool,
    /// The AI tile mirror disagrees with the board.
    StateDesync {
        /// What disagreed.
        detail: String,
    },
    /// The acting side does not own the current turn.
    OutOfTurn {
        /// Side that tried to act.
        side: Side,
    },
    /// The match has already been decided.
    MatchOver,
    /// No tile exists at the coordinate.
    NoSuchTile(Coord),
    /// The tile holds a unit that cannot be stacked onto.
    IllegalPlacement(Coord),
    /// The coordinate does not hold a unit.
    NoUnit(Coord),
    /// The hand slot index is out of range or empty.
    NoSuchHandSlot(usize),
    /// The attack target is not in range of the attacker.
    OutOfRange {
        /// Attacking prism.
        from: Coord,
        /// Requested target.
        to: Coord,
    },
    /// A card target was chosen without a card awaiting one.
    NotSelecting,
    /// Configuration could not be read or is invalid.
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { effect, route } => {
                write!(f, "effect {effect} cannot be applied to the {route}")
            }
            Self::CapacityExceeded { capacity } => {
                write!(f, "hand is full ({capacity} cards)")
            }
            Self::EmptyPool => write!(f, "no unoccupied tile available"),
            Self::StateDesync { detail } => write!(f, "tile mirror out of sync: {detail}"),
            Self::OutOfTurn { side } => write!(f, "{side} cannot act outside its turn"),
            Self::MatchOver => write!(f, "match is over"),
            Self::NoSuchTile(coord) => write!(f, "no tile at {coord}"),
            Self::IllegalPlacement(coord) => write!(f, "cannot place a unit on {coord}"),
            Self::NoUnit(coord) => write!(f, "no unit at {coord}"),
            Self::NoSuchHandSlot(slot) => write!(f, "hand slot {slot} is empty"),
            Self::OutOfRange { from, to } => write!(f, "{to} is not in range of {from}"),
            Self::NotSelecting => write!(f, "no card is waiting for a target"),
            Self::Config(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_invalid_target() {
        let err = EngineError::InvalidTarget {
            effect: "heal",
            route: CardRoute::Board,
        };
        assert_eq!(err.to_string(), "effect heal cannot be applied to the board");
    }

    #[test]
    fn test_display_out_of_range() {
        let err = EngineError::OutOfRange {
            from: Coord::new(1, 1),
            to: Coord::new(4, 1),
        };
        let text = err.to_string();
        assert!(text.contains("(4, 1)"));
        assert!(text.contains("(1, 1)"));
    }
}

//! Match invariants - sanity checks that detect bugs.
//!
//! None of these should ever trigger. A violation means a transition left the
//! counters or the board in a state the rules cannot produce.

use crate::game::{BoardService, MatchState, Phase, Side};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    /// Create a violation with a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check the match counters and the board against each other.
///
/// Returns every violation found, or an empty list if all invariants hold.
#[must_use]
pub fn check_invariants<B: BoardService + ?Sized>(
    state: &MatchState,
    board: &B,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let config = state.config();

    let deck = state.deck();
    if deck.cursor() > deck.len() {
        violations.push(InvariantViolation::new(format!(
            "deck cursor {} past deck length {}",
            deck.cursor(),
            deck.len()
        )));
    }

    if state.cards_in_hand() > state.cards().capacity() {
        violations.push(InvariantViolation::new(format!(
            "{} cards held with {} slots",
            state.cards_in_hand(),
            state.cards().capacity()
        )));
    }
    if let Some(held) = state.held_card()
        && state.cards().find(held).is_none()
    {
        violations.push(InvariantViolation::new(format!(
            "held card {} is not in the hand",
            held.0
        )));
    }

    if state.knowledge() > config.max_knowledge {
        violations.push(InvariantViolation::new(format!(
            "knowledge {} above cap {}",
            state.knowledge(),
            config.max_knowledge
        )));
    }

    for side in [Side::Player, Side::Opponent] {
        let pieces = state.pieces_in_hand(side);
        if pieces > config.max_pieces_in_hand {
            violations.push(InvariantViolation::new(format!(
                "{side} holds {pieces} pieces, max {}",
                config.max_pieces_in_hand
            )));
        }

        let volume = state.accumulated_volume(side);
        if !volume.is_finite() || volume < 0.0 {
            violations.push(InvariantViolation::new(format!(
                "{side} accumulated volume {volume} is not a finite non-negative value"
            )));
        }
    }

    if let Some(side) = state.active_side()
        && state.remaining_moves(side) == 0
    {
        violations.push(InvariantViolation::new(format!(
            "{side} owns the turn with no moves left"
        )));
    }

    if let Phase::GameOver(outcome) = state.phase() {
        let winner = outcome.winner();
        if state.accumulated_volume(winner) < config.required_volume_to_win {
            violations.push(InvariantViolation::new(format!(
                "{winner} won below the volume threshold"
            )));
        }
    }

    let occupied = board
        .list_occupied_tiles(Side::Opponent)
        .into_iter()
        .chain(board.list_occupied_tiles(Side::Player));
    for coord in occupied {
        let Some(tile) = board.get_tile(coord) else {
            continue;
        };
        let Some(unit) = &tile.unit else {
            continue;
        };

        if unit.side() != tile.side {
            violations.push(InvariantViolation::new(format!(
                "{} unit on the {} half at {coord}",
                unit.side(),
                tile.side
            )));
        }
        if unit.height() == 0 || unit.height() > unit.max_height() {
            violations.push(InvariantViolation::new(format!(
                "unit at {coord} has height {} outside [1, {}]",
                unit.height(),
                unit.max_height()
            )));
        }
        if unit.is_destroyed() {
            violations.push(InvariantViolation::new(format!(
                "destroyed unit left on the board at {coord}"
            )));
        }
        if unit.health() > unit.max_health() + 1e-3 {
            violations.push(InvariantViolation::new(format!(
                "unit at {coord} has health {} above max {}",
                unit.health(),
                unit.max_health()
            )));
        }
    }

    violations
}

/// Assert all match invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(violations: &[InvariantViolation]) {
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Match invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_violations: &[InvariantViolation]) {}

//! Game layer for Prismfall.
//!
//! Implements the match rules:
//! - Combat units (cuboids and prisms) with height and orientation scaling
//! - Card deck, hand slots and typed card effects
//! - The board collaborator interface and an in-memory grid board
//! - Match state machine (turns, moves, hands, knowledge, volume tallies)
//! - Debug-build invariant checks

mod board;
mod card;
mod events;
mod invariants;
mod side;
mod state;
mod unit;

pub use board::{BoardService, Coord, DamageReport, GridBoard, Placement, Tile, DIRECTIONS};
pub use card::{Card, CardEffect, CardHand, CardId, CardRoute, CardSpec, Deck};
pub use events::{AudioCue, MatchEvent};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use side::{Outcome, Side};
pub use state::{CardDispatch, MatchState, Opening, Phase};
pub use unit::{CombatUnit, StatRow, UnitId, UnitKind, UnitSpec, MAX_ANGLE_INDEX};

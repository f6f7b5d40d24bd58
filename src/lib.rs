// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Prismfall: rule engine and opponent AI for a turn-based prism tactics game.
//!
//! Two sides take turns placing cuboids and prisms on their half of a tile
//! grid. Prisms hit enemy units in range; every point of damage dealt is
//! credited to the attacker's side, and the first side to accumulate the
//! configured volume wins.
//!
//! The crate provides:
//! - Deterministic matches from a seed
//! - A match state machine owning turns, moves, hands and the win condition
//! - A rule-based AI that can drive either side
//! - A board collaborator trait with an in-memory grid implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Engine (init / tick / teardown)   │
//! ├──────────────────┬──────────────────┤
//! │   Match State    │   Opponent AI    │
//! ├──────────────────┴──────────────────┤
//! │  Units · Cards · Board · Scheduler  │
//! └─────────────────────────────────────┘
//! ```

pub mod ai;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod scheduler;

pub use error::{EngineError, EngineResult};

// Re-export key types at crate root for convenience
pub use ai::{Decision, OpponentAi};
pub use config::MatchConfig;
pub use engine::{Engine, MatchSummary};
pub use game::{
    BoardService, Card, CardEffect, CombatUnit, Coord, GridBoard, MatchEvent, MatchState,
    Outcome, Phase, Side,
};
pub use scheduler::{Scheduler, Task};

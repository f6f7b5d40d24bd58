//! Pure decision functions.
//!
//! Every scan runs in a fixed order: prisms in mirror order, buckets in
//! [`DIRECTIONS`](crate::game::DIRECTIONS) order, tiles nearest first. The
//! first hit wins; there is no scoring.

use rand::Rng;

use crate::ai::AiMemory;
use crate::error::{EngineError, EngineResult};
use crate::game::{BoardService, CombatUnit, Coord, Side};

/// A chosen attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackPlan {
    /// Tile of the attacking prism.
    pub attacker: Coord,
    /// Bucket index the prism turns to.
    pub facing: usize,
    /// Tile being hit.
    pub target: Coord,
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Start a telegraphed attack.
    Attack(AttackPlan),
    /// Place a piece from hand.
    Place {
        /// Index into the hand.
        hand_index: usize,
        /// Destination tile.
        tile: Coord,
    },
    /// Nothing to do this cycle.
    Idle,
}

/// Whether `coord` holds a unit `side` may attack: occupied and on the
/// other half.
pub fn is_attack_target<B: BoardService + ?Sized>(board: &B, side: Side, coord: Coord) -> bool {
    board
        .get_tile(coord)
        .is_some_and(|tile| tile.side != side && tile.is_occupied())
}

/// Whether any listed prism has a target in any of its buckets.
pub fn can_attack<B: BoardService + ?Sized>(board: &B, side: Side, prisms: &[Coord]) -> bool {
    prisms.iter().any(|&prism| {
        board
            .range_buckets(prism)
            .iter()
            .flatten()
            .any(|&coord| is_attack_target(board, side, coord))
    })
}

/// First attack found by the fixed scan.
pub fn find_attack<B: BoardService + ?Sized>(
    board: &B,
    side: Side,
    prisms: &[Coord],
) -> Option<AttackPlan> {
    prisms.iter().find_map(|&attacker| {
        board
            .range_buckets(attacker)
            .iter()
            .enumerate()
            .find_map(|(facing, bucket)| {
                bucket
                    .iter()
                    .find(|&&coord| is_attack_target(board, side, coord))
                    .map(|&target| AttackPlan {
                        attacker,
                        facing,
                        target,
                    })
            })
    })
}

/// First ranged piece in hand, else the first piece.
#[must_use]
pub fn select_from_hand(hand: &[CombatUnit]) -> Option<usize> {
    if hand.is_empty() {
        return None;
    }
    Some(hand.iter().position(CombatUnit::is_ranged).unwrap_or(0))
}

/// First occupied tile whose resident shares the unit's kind and sits below
/// `max_height - 2`.
pub fn find_stack_tile<B: BoardService + ?Sized>(
    board: &B,
    occupied: &[Coord],
    unit: &CombatUnit,
) -> Option<Coord> {
    occupied.iter().copied().find(|&coord| {
        board.unit_at(coord).is_some_and(|resident| {
            resident.kind() == unit.kind()
                && resident.height() < resident.max_height().saturating_sub(2)
                && board.can_place(coord, unit).is_ok()
        })
    })
}

/// Uniformly random free tile.
///
/// # Errors
///
/// Returns [`EngineError::EmptyPool`] if there is no free tile.
pub fn random_tile<R: Rng + ?Sized>(unoccupied: &[Coord], rng: &mut R) -> EngineResult<Coord> {
    if unoccupied.is_empty() {
        return Err(EngineError::EmptyPool);
    }
    Ok(unoccupied[rng.random_range(0..unoccupied.len())])
}

/// Run the decision order: attack, else stack, else random placement.
///
/// # Errors
///
/// Returns [`EngineError::EmptyPool`] when a placement is needed and the
/// side's half is full.
pub fn decide<B: BoardService + ?Sized, R: Rng + ?Sized>(
    board: &B,
    memory: &AiMemory,
    rng: &mut R,
) -> EngineResult<Decision> {
    let side = memory.side();

    if can_attack(board, side, memory.prisms_on_board())
        && let Some(plan) = find_attack(board, side, memory.prisms_on_board())
    {
        return Ok(Decision::Attack(plan));
    }

    let hand = memory.pieces_in_hand();
    let Some(hand_index) = select_from_hand(hand) else {
        return Ok(Decision::Idle);
    };

    let tile = match find_stack_tile(board, memory.occupied_tiles(), &hand[hand_index]) {
        Some(tile) => tile,
        None => random_tile(memory.unoccupied_tiles(), rng)?,
    };
    Ok(Decision::Place { hand_index, tile })
}

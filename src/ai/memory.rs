//! The AI's cached view of its half of the board plus the pieces it holds.
//!
//! The board stays authoritative. The mirror is refreshed from it at the start
//! of every decision cycle and patched synchronously on every placement and
//! removal the AI performs or is told about, so list order (which drives the
//! fixed scan order of decisions) survives across cycles.

use crate::error::{EngineError, EngineResult};
use crate::game::{BoardService, CombatUnit, Coord, Side};

/// Tile mirror and hand of one AI-driven side.
#[derive(Debug, Clone)]
pub struct AiMemory {
    side: Side,
    pieces_in_hand: Vec<CombatUnit>,
    occupied_tiles: Vec<Coord>,
    unoccupied_tiles: Vec<Coord>,
    prisms_on_board: Vec<Coord>,
}

impl AiMemory {
    /// Build a mirror of `side`'s half with an empty hand.
    #[must_use]
    pub fn new<B: BoardService + ?Sized>(board: &B, side: Side) -> Self {
        let mut memory = Self {
            side,
            pieces_in_hand: Vec::new(),
            occupied_tiles: Vec::new(),
            unoccupied_tiles: Vec::new(),
            prisms_on_board: Vec::new(),
        };
        memory.sync_from(board);
        memory
    }

    /// Side this memory mirrors.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Pieces drawn but not yet placed.
    #[must_use]
    pub fn pieces_in_hand(&self) -> &[CombatUnit] {
        &self.pieces_in_hand
    }

    /// Occupied own tiles, in the order they were first seen.
    #[must_use]
    pub fn occupied_tiles(&self) -> &[Coord] {
        &self.occupied_tiles
    }

    /// Free own tiles.
    #[must_use]
    pub fn unoccupied_tiles(&self) -> &[Coord] {
        &self.unoccupied_tiles
    }

    /// Tiles holding own ranged units, in placement order.
    #[must_use]
    pub fn prisms_on_board(&self) -> &[Coord] {
        &self.prisms_on_board
    }

    /// Add a freshly drawn batch to the hand.
    pub fn receive(&mut self, batch: impl IntoIterator<Item = CombatUnit>) {
        self.pieces_in_hand.extend(batch);
    }

    /// Take a piece out of the hand.
    pub fn take_piece(&mut self, index: usize) -> Option<CombatUnit> {
        (index < self.pieces_in_hand.len()).then(|| self.pieces_in_hand.remove(index))
    }

    /// Refresh the mirror from the board.
    ///
    /// Entries still valid keep their position; new ones are appended in
    /// board order.
    pub fn sync_from<B: BoardService + ?Sized>(&mut self, board: &B) {
        let occupied = board.list_occupied_tiles(self.side);
        let unoccupied = board.list_unoccupied_tiles(self.side);
        let prisms: Vec<Coord> = occupied
            .iter()
            .copied()
            .filter(|&coord| board.unit_at(coord).is_some_and(CombatUnit::is_ranged))
            .collect();

        reconcile(&mut self.occupied_tiles, &occupied);
        reconcile(&mut self.unoccupied_tiles, &unoccupied);
        reconcile(&mut self.prisms_on_board, &prisms);
    }

    /// Record a placement on `coord`. Stacking onto a tracked tile changes
    /// nothing.
    pub fn record_placement(&mut self, coord: Coord, ranged: bool) {
        if !self.occupied_tiles.contains(&coord) {
            self.occupied_tiles.push(coord);
            self.unoccupied_tiles.retain(|&tile| tile != coord);
        }
        if ranged && !self.prisms_on_board.contains(&coord) {
            self.prisms_on_board.push(coord);
        }
    }

    /// Record that the unit on `coord` is gone.
    pub fn record_removal(&mut self, coord: Coord) {
        self.occupied_tiles.retain(|&tile| tile != coord);
        if !self.unoccupied_tiles.contains(&coord) {
            self.unoccupied_tiles.push(coord);
        }
        self.prisms_on_board.retain(|&tile| tile != coord);
    }

    /// Compare the mirror with the board.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StateDesync`] describing the first list that
    /// disagrees.
    pub fn check_against<B: BoardService + ?Sized>(&self, board: &B) -> EngineResult<()> {
        let occupied = board.list_occupied_tiles(self.side);
        let unoccupied = board.list_unoccupied_tiles(self.side);
        let prisms: Vec<Coord> = occupied
            .iter()
            .copied()
            .filter(|&coord| board.unit_at(coord).is_some_and(CombatUnit::is_ranged))
            .collect();

        for (name, mirror, truth) in [
            ("occupied", &self.occupied_tiles, &occupied),
            ("unoccupied", &self.unoccupied_tiles, &unoccupied),
            ("prism", &self.prisms_on_board, &prisms),
        ] {
            if !same_tiles(mirror, truth) {
                return Err(EngineError::StateDesync {
                    detail: format!(
                        "{} {name} tiles: mirror {mirror:?}, board {truth:?}",
                        self.side
                    ),
                });
            }
        }
        Ok(())
    }
}

fn reconcile(mirror: &mut Vec<Coord>, truth: &[Coord]) {
    mirror.retain(|coord| truth.contains(coord));
    for &coord in truth {
        if !mirror.contains(&coord) {
            mirror.push(coord);
        }
    }
}

fn same_tiles(a: &[Coord], b: &[Coord]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    b.sort_unstable();
    a == b
}

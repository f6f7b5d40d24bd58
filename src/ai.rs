//! Rule-based AI for one side.
//!
//! Fires one decision per `move_delay` seconds of its own turn. An attack
//! keeps the AI busy until the telegraphed hit lands; the delay restarts only
//! after that.

mod decision;
mod memory;

pub use decision::{
    AttackPlan, Decision, can_attack, decide, find_attack, find_stack_tile, is_attack_target,
    random_tile, select_from_hand,
};
pub use memory::AiMemory;

use rand::Rng;
use tracing::debug;

use crate::config::AiConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::{BoardService, CombatUnit, Coord, Placement, Side};

/// Decision loop state for one AI-driven side.
#[derive(Debug, Clone)]
pub struct OpponentAi {
    config: AiConfig,
    memory: AiMemory,
    delay_remaining: f32,
    busy: bool,
}

impl OpponentAi {
    /// Create an AI for `side` with an empty hand.
    #[must_use]
    pub fn new<B: BoardService + ?Sized>(side: Side, config: AiConfig, board: &B) -> Self {
        Self {
            config,
            memory: AiMemory::new(board, side),
            delay_remaining: config.move_delay,
            busy: false,
        }
    }

    /// Side this AI plays.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.memory.side()
    }

    /// Cached board view and hand.
    #[must_use]
    pub const fn memory(&self) -> &AiMemory {
        &self.memory
    }

    /// Whether an attack is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Seconds until the next decision.
    #[must_use]
    pub const fn delay_remaining(&self) -> f32 {
        self.delay_remaining
    }

    /// Add a freshly drawn batch to the hand.
    pub fn receive_pieces(&mut self, batch: Vec<CombatUnit>) {
        debug!(side = %self.side(), count = batch.len(), "pieces received");
        self.memory.receive(batch);
    }

    /// Whether any of this side's prisms has a target in range.
    pub fn can_attack<B: BoardService + ?Sized>(&self, board: &B) -> bool {
        can_attack(board, self.side(), self.memory.prisms_on_board())
    }

    /// Refresh the tile mirror from the board.
    pub fn sync_from<B: BoardService + ?Sized>(&mut self, board: &B) {
        self.memory.sync_from(board);
    }

    /// Count the decision delay down. Returns `true` when a decision is due.
    ///
    /// Nothing happens while `active` is false or an attack is in flight.
    pub fn update(&mut self, dt: f32, active: bool) -> bool {
        if !active || self.busy {
            return false;
        }
        self.delay_remaining -= dt;
        self.delay_remaining <= 0.0
    }

    /// Refresh the mirror and pick this cycle's action.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyPool`] when a placement is needed and the
    /// side's half is full.
    pub fn decide<B: BoardService + ?Sized, R: Rng + ?Sized>(
        &mut self,
        board: &B,
        rng: &mut R,
    ) -> EngineResult<Decision> {
        self.memory.sync_from(board);
        let decision = decide(board, &self.memory, rng)?;
        debug!(side = %self.side(), ?decision, "decision");
        Ok(decision)
    }

    /// Move a piece from hand onto the board and update the mirror.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoSuchHandSlot`] for a bad hand index, or the
    /// board's error if the tile cannot take the piece. The piece stays in
    /// hand on error.
    pub fn execute_placement<B: BoardService + ?Sized>(
        &mut self,
        board: &mut B,
        hand_index: usize,
        tile: Coord,
    ) -> EngineResult<Placement> {
        let piece = self
            .memory
            .pieces_in_hand()
            .get(hand_index)
            .ok_or(EngineError::NoSuchHandSlot(hand_index))?;
        board.can_place(tile, piece)?;

        let piece = self
            .memory
            .take_piece(hand_index)
            .ok_or(EngineError::NoSuchHandSlot(hand_index))?;
        let ranged = piece.is_ranged();
        let placement = board.place_unit(tile, piece)?;
        self.memory.record_placement(tile, ranged);
        debug!(side = %self.side(), %tile, ?placement, "piece placed");
        Ok(placement)
    }

    /// Turn the attacker toward its target and hold further decisions until
    /// [`OpponentAi::finish_cycle`].
    pub fn begin_attack<B: BoardService + ?Sized>(&mut self, board: &mut B, plan: &AttackPlan) {
        if let Some(prism) = board.unit_at_mut(plan.attacker) {
            prism.set_facing(plan.facing);
        }
        self.busy = true;
    }

    /// End the current cycle and restart the decision delay.
    pub fn finish_cycle(&mut self) {
        self.busy = false;
        self.delay_remaining = self.config.move_delay;
    }

    /// Forget the unit that stood on `coord`.
    pub fn remove_piece(&mut self, coord: Coord) {
        self.memory.record_removal(coord);
    }
}

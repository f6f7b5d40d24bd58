//! Composition root.
//!
//! [`Engine`] owns the match state, the board, the scheduler and the AI(s),
//! and is the only place they meet. A host drives it with [`Engine::tick`]
//! and the player action methods, and drains [`MatchEvent`]s afterwards.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::{Decision, OpponentAi, is_attack_target};
use crate::config::MatchConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::{
    BoardService, CardDispatch, CardEffect, CardId, CardRoute, CombatUnit, Coord, DamageReport,
    GridBoard, InvariantViolation, MatchEvent, MatchState, Outcome, Phase, Placement, Side,
    assert_invariants, check_invariants,
};
use crate::scheduler::{Scheduler, Task};

/// End-of-match report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSummary {
    /// Seed the match ran with.
    pub seed: u64,
    /// Winner, if decided.
    pub outcome: Option<Outcome>,
    /// Completed turns.
    pub turns_played: u32,
    /// Simulated seconds.
    pub elapsed: f64,
    /// Volume the player accumulated.
    pub player_volume: f32,
    /// Volume the opponent accumulated.
    pub opponent_volume: f32,
    /// Final knowledge.
    pub knowledge: u32,
    /// Final player move budget.
    pub max_player_moves: u32,
    /// Deck shuffles, including the opening one.
    pub deck_reshuffles: u32,
    /// Player units left on the board.
    pub player_units: usize,
    /// Opponent units left on the board.
    pub opponent_units: usize,
}

/// A running match.
#[derive(Debug)]
pub struct Engine<B: BoardService = GridBoard> {
    state: MatchState,
    board: B,
    scheduler: Scheduler,
    opponent: OpponentAi,
    autopilot: Option<OpponentAi>,
    player_hand: Vec<CombatUnit>,
    running: bool,
    finished: bool,
}

impl Engine<GridBoard> {
    /// Validate the config, build an empty board and run setup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the config is invalid.
    pub fn init(config: MatchConfig) -> EngineResult<Self> {
        let board = GridBoard::new(config.board.rows, config.board.cols)
            .ok_or_else(|| EngineError::Config("board is too small".to_string()))?;
        Self::with_board(config, board)
    }
}

impl<B: BoardService> Engine<B> {
    /// Run setup on a caller-supplied board.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the config is invalid.
    pub fn with_board(config: MatchConfig, board: B) -> EngineResult<Self> {
        config.validate()?;

        let mut opponent = OpponentAi::new(Side::Opponent, config.ai, &board);
        let mut state = MatchState::new(config);
        let opening = state.setup();
        opponent.receive_pieces(opening.opponent);

        let mut engine = Self {
            state,
            board,
            scheduler: Scheduler::new(),
            opponent,
            autopilot: None,
            player_hand: opening.player,
            running: true,
            finished: false,
        };
        engine.after_action();
        Ok(engine)
    }

    /// Hand the player side to the decision engine. The player's pieces move
    /// into the autopilot, so manual placement is no longer possible.
    #[must_use]
    pub fn with_autopilot(mut self) -> Self {
        let mut pilot = OpponentAi::new(Side::Player, self.state.config().ai, &self.board);
        pilot.receive_pieces(std::mem::take(&mut self.player_hand));
        self.autopilot = Some(pilot);
        self
    }

    /// Match counters.
    #[must_use]
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &B {
        &self.board
    }

    /// The opponent AI.
    #[must_use]
    pub const fn opponent(&self) -> &OpponentAi {
        &self.opponent
    }

    /// The player autopilot, if enabled.
    #[must_use]
    pub const fn autopilot(&self) -> Option<&OpponentAi> {
        self.autopilot.as_ref()
    }

    /// Pieces the player holds.
    #[must_use]
    pub fn player_hand(&self) -> &[CombatUnit] {
        &self.player_hand
    }

    /// Delayed tasks.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Whether the outcome has been shown.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance time: run due tasks, then let the AI(s) act.
    pub fn tick(&mut self, dt: f32) {
        if !self.running {
            return;
        }

        for task in self.scheduler.advance(dt) {
            self.run_task(task);
        }

        drive_ai(&mut self.opponent, &mut self.board, &mut self.state, &mut self.scheduler, dt);
        if let Some(pilot) = self.autopilot.as_mut() {
            drive_ai(pilot, &mut self.board, &mut self.state, &mut self.scheduler, dt);
        }

        self.after_action();
    }

    /// Stop the match, drop pending tasks and report.
    pub fn teardown(&mut self) -> MatchSummary {
        self.running = false;
        self.scheduler.clear();
        info!(outcome = ?self.state.outcome(), "match torn down");
        self.summary()
    }

    /// Current report.
    #[must_use]
    pub fn summary(&self) -> MatchSummary {
        let state = &self.state;
        MatchSummary {
            seed: state.config().seed,
            outcome: state.outcome(),
            turns_played: state.turns_played(),
            elapsed: self.scheduler.now(),
            player_volume: state.accumulated_volume(Side::Player),
            opponent_volume: state.accumulated_volume(Side::Opponent),
            knowledge: state.knowledge(),
            max_player_moves: state.max_moves(Side::Player),
            deck_reshuffles: state.deck().times_reshuffled(),
            player_units: self.board.list_occupied_tiles(Side::Player).len(),
            opponent_units: self.board.list_occupied_tiles(Side::Opponent).len(),
        }
    }

    /// Take every queued notification.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.state.drain_events()
    }

    /// Place a piece from the player's hand. Consumes a move.
    ///
    /// # Errors
    ///
    /// Fails outside the player's turn, for a bad hand index, or when the
    /// board refuses the tile. Nothing changes on error.
    pub fn place_unit(&mut self, hand_index: usize, coord: Coord) -> EngineResult<Placement> {
        self.ensure_player_turn()?;
        let piece = self
            .player_hand
            .get(hand_index)
            .ok_or(EngineError::NoSuchHandSlot(hand_index))?;
        self.board.can_place(coord, piece)?;

        let piece = self.player_hand.remove(hand_index);
        let placement = self.board.place_unit(coord, piece)?;
        self.state.emit(MatchEvent::UnitPlaced {
            side: Side::Player,
            coord,
        });
        if let Some(batch) = self.state.on_place_piece() {
            self.player_hand.extend(batch);
        }

        self.after_action();
        Ok(placement)
    }

    /// Hit `target` with the player's prism on `attacker`. Consumes a move.
    ///
    /// The prism turns to face the bucket holding the target.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoUnit`] if `attacker` holds no player prism, and
    /// [`EngineError::OutOfRange`] if `target` is not an occupied opponent
    /// tile in its range.
    pub fn attack(&mut self, attacker: Coord, target: Coord) -> EngineResult<DamageReport> {
        self.ensure_player_turn()?;
        let damage = self
            .board
            .unit_at(attacker)
            .filter(|unit| unit.side() == Side::Player && unit.is_ranged())
            .map(CombatUnit::damage)
            .ok_or(EngineError::NoUnit(attacker))?;

        let out_of_range = EngineError::OutOfRange {
            from: attacker,
            to: target,
        };
        if !is_attack_target(&self.board, Side::Player, target) {
            return Err(out_of_range);
        }
        let facing = self
            .board
            .range_buckets(attacker)
            .iter()
            .position(|bucket| bucket.contains(&target))
            .ok_or(out_of_range.clone())?;

        if let Some(prism) = self.board.unit_at_mut(attacker) {
            prism.set_facing(facing);
        }
        let report = self.resolve_hit(target, damage).ok_or(out_of_range)?;
        self.state.perform_move();

        self.after_action();
        Ok(report)
    }

    /// Draw a card. Consumes a move unless the hand is full.
    ///
    /// # Errors
    ///
    /// Fails outside the player's turn.
    pub fn draw_card(&mut self) -> EngineResult<Option<CardId>> {
        self.ensure_player_turn()?;
        let drawn = self.state.draw_card();
        self.after_action();
        Ok(drawn)
    }

    /// Use the card in a slot.
    ///
    /// Board cards resolve here and are consumed without spending a move.
    /// Unit cards wait for [`Engine::select_card_target`].
    ///
    /// # Errors
    ///
    /// Fails outside the player's turn or for an empty slot.
    pub fn use_card(&mut self, slot: usize) -> EngineResult<CardDispatch> {
        self.ensure_player_turn()?;
        let dispatch = self.state.start_using_card(slot)?;

        if let CardDispatch::ToBoard(card) = dispatch {
            if let Err(e) = self.apply_board_effect(card.effect) {
                warn!(%e, "card effect dropped");
            }
            self.state.use_card(card.id);
        }

        self.after_action();
        Ok(dispatch)
    }

    /// Resolve the waiting unit card on the unit at `coord`. Consumes the
    /// card and a move, even if the effect does not apply to that unit. A
    /// unit the effect leaves without volume is taken off the board.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotSelecting`] with no card waiting, and
    /// [`EngineError::NoUnit`] for an empty tile.
    pub fn select_card_target(&mut self, coord: Coord) -> EngineResult<()> {
        self.ensure_player_turn()?;
        let card = self.state.selected_card().ok_or(EngineError::NotSelecting)?;
        let unit = self
            .board
            .unit_at_mut(coord)
            .ok_or(EngineError::NoUnit(coord))?;

        if let Err(e) = card.effect.apply_to_unit(unit) {
            warn!(%e, %coord, "card effect dropped");
        }
        if unit.is_destroyed() {
            let side = unit.side();
            self.board.remove_unit(coord);
            self.on_unit_destroyed(side, coord);
        }
        self.state.use_card(card.id);
        self.state.perform_move();

        self.after_action();
        Ok(())
    }

    /// Check the state, the board and every AI mirror.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = check_invariants(&self.state, &self.board);

        let player_pieces = self
            .autopilot
            .as_ref()
            .map_or(self.player_hand.len(), |pilot| pilot.memory().pieces_in_hand().len());
        let hands = [
            (Side::Player, player_pieces),
            (Side::Opponent, self.opponent.memory().pieces_in_hand().len()),
        ];
        for (side, held) in hands {
            if held != self.state.pieces_in_hand(side) {
                violations.push(InvariantViolation::new(format!(
                    "{side} holds {held} pieces, counter says {}",
                    self.state.pieces_in_hand(side)
                )));
            }
        }

        for ai in std::iter::once(&self.opponent).chain(self.autopilot.as_ref()) {
            if let Err(e) = ai.memory().check_against(&self.board) {
                violations.push(InvariantViolation::new(e.to_string()));
            }
        }

        violations
    }

    fn ensure_player_turn(&self) -> EngineResult<()> {
        match self.state.phase() {
            _ if !self.running => Err(EngineError::MatchOver),
            Phase::GameOver(_) => Err(EngineError::MatchOver),
            Phase::PlayerTurn => Ok(()),
            Phase::Setup | Phase::OpponentTurn => {
                Err(EngineError::OutOfTurn { side: Side::Player })
            }
        }
    }

    fn ai_mut(&mut self, side: Side) -> Option<&mut OpponentAi> {
        match side {
            Side::Opponent => Some(&mut self.opponent),
            Side::Player => self.autopilot.as_mut(),
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::LandAttack {
                side,
                attacker,
                target,
            } => self.land_attack(side, attacker, target),
            Task::OpenTutorial => self.state.emit(MatchEvent::TutorialShouldOpen),
            Task::ShowOutcome(outcome) => {
                self.finished = true;
                self.state.emit(MatchEvent::MatchEnded { outcome });
            }
        }
    }

    fn land_attack(&mut self, side: Side, attacker: Coord, target: Coord) {
        if let Some(ai) = self.ai_mut(side) {
            ai.finish_cycle();
        }
        if self.state.outcome().is_some() {
            debug!(%attacker, "match over, attack dropped");
            return;
        }
        let Some(damage) = self.board.unit_at(attacker).map(CombatUnit::damage) else {
            debug!(%attacker, "attacker gone, attack dropped");
            return;
        };

        if self.resolve_hit(target, damage).is_some() && self.state.active_side() == Some(side) {
            self.state.perform_move();
        }
    }

    /// Damage the unit on `target`, credit the hit and clear the tile if the
    /// unit died.
    fn resolve_hit(&mut self, target: Coord, damage: f32) -> Option<DamageReport> {
        let report = self.board.apply_damage(target, damage)?;
        self.state.on_hit_piece(report.side, damage);

        if report.destroyed {
            self.on_unit_destroyed(report.side, target);
        }
        Some(report)
    }

    /// Bookkeeping once a unit has left the board: notify and patch the
    /// owning AI's mirror.
    fn on_unit_destroyed(&mut self, side: Side, coord: Coord) {
        debug!(%side, %coord, "unit destroyed");
        self.state.emit(MatchEvent::UnitDestroyed { side, coord });
        if let Some(ai) = self.ai_mut(side) {
            ai.remove_piece(coord);
        }
    }

    fn apply_board_effect(&mut self, effect: CardEffect) -> EngineResult<()> {
        match effect {
            CardEffect::Barrage { damage } => {
                for coord in self.board.list_occupied_tiles(Side::Opponent) {
                    self.resolve_hit(coord, damage);
                }
                Ok(())
            }
            other => Err(EngineError::InvalidTarget {
                effect: other.name(),
                route: CardRoute::Board,
            }),
        }
    }

    fn after_action(&mut self) {
        for (delay, task) in self.state.take_deferred() {
            self.scheduler.schedule(delay, task);
        }
        if cfg!(debug_assertions) {
            assert_invariants(&self.check_invariants());
        }
    }
}

/// Run one AI step: count its delay down and, when due, decide and act.
fn drive_ai<B: BoardService>(
    ai: &mut OpponentAi,
    board: &mut B,
    state: &mut MatchState,
    scheduler: &mut Scheduler,
    dt: f32,
) {
    let side = ai.side();
    if !ai.update(dt, state.active_side() == Some(side)) {
        return;
    }

    let decision = match ai.decide(&*board, state.rng()) {
        Ok(decision) => decision,
        Err(e) => {
            warn!(%side, %e, "decision cycle aborted");
            ai.finish_cycle();
            return;
        }
    };

    match decision {
        Decision::Attack(plan) => {
            ai.begin_attack(board, &plan);
            state.emit(MatchEvent::AttackTelegraphed {
                from: plan.attacker,
                to: plan.target,
            });
            scheduler.schedule(
                state.config().ai.attack_telegraph,
                Task::LandAttack {
                    side,
                    attacker: plan.attacker,
                    target: plan.target,
                },
            );
        }
        Decision::Place { hand_index, tile } => {
            match ai.execute_placement(board, hand_index, tile) {
                Ok(_) => {
                    state.emit(MatchEvent::UnitPlaced { side, coord: tile });
                    if let Some(batch) = state.on_place_piece() {
                        ai.receive_pieces(batch);
                    }
                }
                Err(e) => warn!(%side, %e, %tile, "placement refused"),
            }
            ai.finish_cycle();
        }
        Decision::Idle => {
            debug!(%side, "nothing to do");
            ai.finish_cycle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{AudioCue, CardSpec, UnitId, UnitSpec};

    fn config() -> MatchConfig {
        MatchConfig {
            seed: 3,
            ..MatchConfig::default()
        }
    }

    fn with_cards(effect: CardEffect, route: CardRoute) -> MatchConfig {
        MatchConfig {
            cards: vec![CardSpec {
                name: "only".to_string(),
                effect,
                route,
                knowledge: false,
                count: 4,
                can_be_reshuffled: true,
            }],
            ..config()
        }
    }

    fn unit(spec: &UnitSpec, side: Side) -> CombatUnit {
        CombatUnit::new(UnitId(1000), spec, side)
    }

    /// 6x6 board with an opponent prism at (2, 0) facing a player cuboid at
    /// (3, 0), and a player prism at (3, 5) facing an opponent cuboid at (2, 5).
    fn skirmish_board() -> GridBoard {
        let mut board = GridBoard::new(6, 6).unwrap();
        board.place_unit(Coord::new(2, 0), unit(&UnitSpec::prism(), Side::Opponent)).unwrap();
        board.place_unit(Coord::new(3, 0), unit(&UnitSpec::cuboid(), Side::Player)).unwrap();
        board.place_unit(Coord::new(3, 5), unit(&UnitSpec::prism(), Side::Player)).unwrap();
        board.place_unit(Coord::new(2, 5), unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        board
    }

    fn pass_turn<B: BoardService>(engine: &mut Engine<B>) {
        while engine.state().active_side() == Some(Side::Player) {
            engine.draw_card().unwrap();
        }
    }

    #[test]
    fn test_init_starts_player_turn() {
        let mut engine = Engine::init(config()).unwrap();
        assert_eq!(engine.state().phase(), Phase::PlayerTurn);
        assert_eq!(engine.player_hand().len(), 4);
        assert_eq!(engine.opponent().memory().pieces_in_hand().len(), 4);

        let events = engine.drain_events();
        assert!(events.contains(&MatchEvent::TurnChanged { side: Side::Player }));
        assert!(events.contains(&MatchEvent::Audio {
            cue: AudioCue::PieceDrawn
        }));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_init_rejects_bad_config() {
        let config = MatchConfig {
            max_player_moves: 0,
            ..config()
        };
        assert!(matches!(Engine::init(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_place_unit_spends_moves() {
        let mut engine = Engine::init(config()).unwrap();

        engine.place_unit(0, Coord::new(5, 0)).unwrap();
        assert_eq!(engine.player_hand().len(), 3);
        assert_eq!(engine.state().remaining_moves(Side::Player), 1);

        engine.place_unit(0, Coord::new(5, 1)).unwrap();
        assert_eq!(engine.state().active_side(), Some(Side::Opponent));
        assert_eq!(
            engine.place_unit(0, Coord::new(5, 2)),
            Err(EngineError::OutOfTurn { side: Side::Player })
        );
    }

    #[test]
    fn test_refused_placement_keeps_piece() {
        let mut engine = Engine::init(config()).unwrap();
        assert_eq!(
            engine.place_unit(0, Coord::new(0, 0)),
            Err(EngineError::IllegalPlacement(Coord::new(0, 0)))
        );
        assert_eq!(engine.player_hand().len(), 4);
        assert_eq!(engine.state().remaining_moves(Side::Player), 2);
        assert_eq!(engine.place_unit(9, Coord::new(5, 0)), Err(EngineError::NoSuchHandSlot(9)));
    }

    #[test]
    fn test_opponent_places_after_delay() {
        let mut engine = Engine::init(MatchConfig {
            max_opponent_moves: 3,
            ..config()
        })
        .unwrap();
        pass_turn(&mut engine);
        engine.drain_events();

        engine.tick(3.9);
        assert!(engine.board().list_occupied_tiles(Side::Opponent).is_empty());

        engine.tick(0.2);
        assert_eq!(engine.board().list_occupied_tiles(Side::Opponent).len(), 1);
        assert_eq!(engine.opponent().memory().pieces_in_hand().len(), 3);
        assert_eq!(engine.state().remaining_moves(Side::Opponent), 2);
        assert!(
            engine
                .drain_events()
                .iter()
                .any(|event| matches!(event, MatchEvent::UnitPlaced { side: Side::Opponent, .. }))
        );
    }

    #[test]
    fn test_opponent_idle_on_player_turn() {
        let mut engine = Engine::init(config()).unwrap();
        for _ in 0..20 {
            engine.tick(1.0);
        }
        assert!(engine.board().list_occupied_tiles(Side::Opponent).is_empty());
        assert_eq!(engine.state().active_side(), Some(Side::Player));
    }

    #[test]
    fn test_opponent_attack_is_telegraphed() {
        let mut engine = Engine::with_board(config(), skirmish_board()).unwrap();
        pass_turn(&mut engine);
        engine.drain_events();

        engine.tick(4.0);
        assert!(engine.opponent().is_busy());
        assert!(engine.drain_events().contains(&MatchEvent::AttackTelegraphed {
            from: Coord::new(2, 0),
            to: Coord::new(3, 0),
        }));
        assert_eq!(engine.board().unit_at(Coord::new(2, 0)).unwrap().facing(), 2);
        assert!(engine.state().accumulated_volume(Side::Opponent).abs() < f32::EPSILON);

        // Busy: no second decision while the telegraph runs.
        engine.tick(1.0);
        assert_eq!(engine.scheduler().pending(), 1);

        engine.tick(0.5);
        assert!(!engine.opponent().is_busy());
        assert!((engine.state().accumulated_volume(Side::Opponent) - 20.0).abs() < 1e-4);
        assert!((engine.board().unit_at(Coord::new(3, 0)).unwrap().health() - 80.0).abs() < 1e-4);
        assert_eq!(engine.state().remaining_moves(Side::Opponent), 1);
    }

    #[test]
    fn test_player_attack() {
        let mut engine = Engine::with_board(config(), skirmish_board()).unwrap();
        let report = engine.attack(Coord::new(3, 5), Coord::new(2, 5)).unwrap();

        assert_eq!(report.side, Side::Opponent);
        assert!(!report.destroyed);
        assert_eq!(engine.board().unit_at(Coord::new(3, 5)).unwrap().facing(), 0);
        assert!((engine.state().accumulated_volume(Side::Player) - 20.0).abs() < 1e-4);
        assert_eq!(engine.state().remaining_moves(Side::Player), 1);
    }

    #[test]
    fn test_player_attack_errors() {
        let mut engine = Engine::with_board(config(), skirmish_board()).unwrap();
        assert_eq!(
            engine.attack(Coord::new(3, 0), Coord::new(2, 0)),
            Err(EngineError::NoUnit(Coord::new(3, 0)))
        );
        assert_eq!(
            engine.attack(Coord::new(3, 5), Coord::new(0, 5)),
            Err(EngineError::OutOfRange {
                from: Coord::new(3, 5),
                to: Coord::new(0, 5),
            })
        );
        assert_eq!(engine.state().remaining_moves(Side::Player), 2);
    }

    #[test]
    fn test_destroying_opponent_unit_updates_mirror() {
        let mut board = skirmish_board();
        board.unit_at_mut(Coord::new(2, 5)).unwrap().take_damage(90.0);
        let mut engine = Engine::with_board(config(), board).unwrap();

        let report = engine.attack(Coord::new(3, 5), Coord::new(2, 5)).unwrap();
        assert!(report.destroyed);
        assert!(!engine.board().is_occupied(Coord::new(2, 5)));
        assert!(!engine.opponent().memory().occupied_tiles().contains(&Coord::new(2, 5)));
        assert!(engine.check_invariants().is_empty());
    }

    #[test]
    fn test_win_shows_outcome_after_delay() {
        let mut engine = Engine::with_board(
            MatchConfig {
                required_volume_to_win: 20.0,
                ..config()
            },
            skirmish_board(),
        )
        .unwrap();
        engine.attack(Coord::new(3, 5), Coord::new(2, 5)).unwrap();

        assert_eq!(engine.state().outcome(), Some(Outcome::PlayerWin));
        assert!(engine.drain_events().contains(&MatchEvent::FadeIn));
        assert_eq!(engine.draw_card(), Err(EngineError::MatchOver));

        engine.tick(2.0);
        assert!(!engine.is_finished());
        engine.tick(0.5);
        assert!(engine.is_finished());
        assert!(engine.drain_events().contains(&MatchEvent::MatchEnded {
            outcome: Outcome::PlayerWin
        }));
    }

    #[test]
    fn test_unit_card_resolves_on_target() {
        let mut board = skirmish_board();
        board.unit_at_mut(Coord::new(3, 0)).unwrap().take_damage(50.0);
        let config = with_cards(CardEffect::HealQuarter, CardRoute::Unit);
        let mut engine = Engine::with_board(config, board).unwrap();

        assert_eq!(engine.select_card_target(Coord::new(3, 0)), Err(EngineError::NotSelecting));

        engine.draw_card().unwrap();
        assert!(matches!(engine.use_card(0).unwrap(), CardDispatch::AwaitingTarget(_)));
        assert_eq!(engine.state().remaining_moves(Side::Player), 1);
        assert_eq!(
            engine.select_card_target(Coord::new(4, 4)),
            Err(EngineError::NoUnit(Coord::new(4, 4)))
        );

        engine.select_card_target(Coord::new(3, 0)).unwrap();
        assert!((engine.board().unit_at(Coord::new(3, 0)).unwrap().health() - 75.0).abs() < 1e-4);
        assert_eq!(engine.state().cards_in_hand(), 0);
        assert_eq!(engine.state().active_side(), Some(Side::Opponent));
    }

    #[test]
    fn test_unit_card_that_kills_clears_the_tile() {
        let target = Coord::new(2, 2);
        let mut board = skirmish_board();
        board.place_unit(target, unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        board.place_unit(target, unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        board.unit_at_mut(target).unwrap().take_damage(150.0);
        let mut engine = Engine::with_board(
            with_cards(CardEffect::ChangeHeight { delta: -1 }, CardRoute::Unit),
            board,
        )
        .unwrap();
        assert!(engine.opponent().memory().occupied_tiles().contains(&target));

        engine.draw_card().unwrap();
        engine.use_card(0).unwrap();
        engine.drain_events();
        engine.select_card_target(target).unwrap();

        assert!(!engine.board().is_occupied(target));
        assert!(!engine.opponent().memory().occupied_tiles().contains(&target));
        assert!(engine.opponent().memory().unoccupied_tiles().contains(&target));
        assert!(engine.drain_events().contains(&MatchEvent::UnitDestroyed {
            side: Side::Opponent,
            coord: target,
        }));
        assert!(engine.check_invariants().is_empty());
    }

    #[test]
    fn test_barrage_hits_every_opponent_unit() {
        let mut engine = Engine::with_board(
            with_cards(CardEffect::Barrage { damage: 10.0 }, CardRoute::Board),
            skirmish_board(),
        )
        .unwrap();
        engine.draw_card().unwrap();
        assert!(matches!(engine.use_card(0).unwrap(), CardDispatch::ToBoard(_)));

        assert!((engine.state().accumulated_volume(Side::Player) - 20.0).abs() < 1e-4);
        assert!((engine.board().unit_at(Coord::new(2, 0)).unwrap().health() - 50.0).abs() < 1e-4);
        assert_eq!(engine.state().cards_in_hand(), 0);
        assert_eq!(engine.state().remaining_moves(Side::Player), 1);
    }

    #[test]
    fn test_misrouted_board_card_is_consumed() {
        let config = with_cards(CardEffect::HealQuarter, CardRoute::Board);
        let mut engine = Engine::with_board(config, skirmish_board()).unwrap();
        engine.draw_card().unwrap();
        engine.use_card(0).unwrap();
        assert_eq!(engine.state().cards_in_hand(), 0);
        assert!((engine.board().unit_at(Coord::new(2, 0)).unwrap().health() - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_tutorial_opens_after_first_opponent_turn() {
        let mut engine = Engine::with_board(config(), skirmish_board()).unwrap();
        pass_turn(&mut engine);
        // Two telegraphed attacks use up the opponent's moves.
        for _ in 0..60 {
            engine.tick(0.5);
            if engine.state().active_side() == Some(Side::Player) {
                break;
            }
        }
        assert_eq!(engine.state().active_side(), Some(Side::Player));
        assert!(!engine.drain_events().contains(&MatchEvent::TutorialShouldOpen));

        engine.tick(2.0);
        assert!(engine.drain_events().contains(&MatchEvent::TutorialShouldOpen));
    }

    #[test]
    fn test_full_half_aborts_cycle() {
        let mut board = GridBoard::new(2, 1).unwrap();
        board.place_unit(Coord::new(0, 0), unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        let config = MatchConfig {
            opponent_roster: vec![UnitSpec::prism()],
            board: crate::config::BoardConfig { rows: 2, cols: 1 },
            ..config()
        };
        let mut engine = Engine::with_board(config, board).unwrap();
        pass_turn(&mut engine);

        engine.tick(4.0);
        assert_eq!(engine.state().active_side(), Some(Side::Opponent));
        assert_eq!(engine.opponent().memory().pieces_in_hand().len(), 4);
        assert!((engine.opponent().delay_remaining() - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_teardown_stops_the_match() {
        let mut engine = Engine::init(config()).unwrap();
        engine.place_unit(0, Coord::new(4, 4)).unwrap();
        let summary = engine.teardown();

        assert_eq!(summary.seed, 3);
        assert_eq!(summary.player_units, 1);
        assert_eq!(summary.outcome, None);
        assert_eq!(engine.draw_card(), Err(EngineError::MatchOver));
        engine.tick(10.0);
        assert!((engine.summary().elapsed).abs() < f64::EPSILON);
    }

    #[test]
    fn test_autopilot_plays_both_sides() {
        let mut engine = Engine::init(MatchConfig {
            required_volume_to_win: 150.0,
            ..config()
        })
        .unwrap()
        .with_autopilot();
        assert!(engine.player_hand().is_empty());

        for _ in 0..2_000 {
            if engine.is_finished() {
                break;
            }
            engine.tick(0.5);
        }

        let summary = engine.summary();
        assert!(summary.turns_played > 0);
        assert!(summary.player_units + summary.opponent_units > 0);
        assert!(engine.check_invariants().is_empty());
    }
}

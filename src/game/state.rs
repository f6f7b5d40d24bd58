//! Match state machine.
//!
//! Owns the authoritative counters: turn ownership, move budgets, hand sizes,
//! knowledge and the two accumulated-volume tallies. Nothing else advances the
//! turn or declares a winner.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::{EngineError, EngineResult};
use crate::game::{
    AudioCue, Card, CardEffect, CardHand, CardId, CardRoute, CombatUnit, Deck, MatchEvent,
    Outcome, Side, UnitId,
};
use crate::scheduler::Task;

/// Phase of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before hands are dealt.
    Setup,
    /// The player is acting.
    PlayerTurn,
    /// The opponent is acting.
    OpponentTurn,
    /// A side has won.
    GameOver(Outcome),
}

impl Phase {
    /// Side that owns the turn, if any.
    #[must_use]
    pub const fn active_side(self) -> Option<Side> {
        match self {
            Phase::PlayerTurn => Some(Side::Player),
            Phase::OpponentTurn => Some(Side::Opponent),
            Phase::Setup | Phase::GameOver(_) => None,
        }
    }
}

/// Hands dealt during setup.
#[derive(Debug, Clone)]
pub struct Opening {
    /// Player's first batch.
    pub player: Vec<CombatUnit>,
    /// Opponent's first batch.
    pub opponent: Vec<CombatUnit>,
}

/// What starting to use a card did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardDispatch {
    /// A knowledge card was picked up; use it again to apply it.
    PickedUp,
    /// The card waits for a target unit.
    AwaitingTarget(CardId),
    /// The card must be applied to the board, then consumed with
    /// [`MatchState::use_card`].
    ToBoard(Card),
    /// The controller applied the card and it was consumed.
    Applied(CardId),
}

/// Authoritative match counters.
#[derive(Debug, Clone)]
pub struct MatchState {
    config: MatchConfig,
    phase: Phase,
    max_player_moves: u32,
    remaining_player_moves: u32,
    remaining_opponent_moves: u32,
    player_pieces_in_hand: usize,
    opponent_pieces_in_hand: usize,
    knowledge: u32,
    player_volume: f32,
    opponent_volume: f32,
    turns_played: u32,
    deck: Deck,
    cards: CardHand,
    held_card: Option<CardId>,
    selecting: Option<CardId>,
    tutorial_pending: bool,
    next_unit_id: u32,
    rng: StdRng,
    events: Vec<MatchEvent>,
    deferred: Vec<(f32, Task)>,
}

impl MatchState {
    /// Create a match in the setup phase.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        Self {
            phase: Phase::Setup,
            max_player_moves: config.max_player_moves,
            remaining_player_moves: 0,
            remaining_opponent_moves: 0,
            player_pieces_in_hand: 0,
            opponent_pieces_in_hand: 0,
            knowledge: 0,
            player_volume: 0.0,
            opponent_volume: 0.0,
            turns_played: 0,
            deck: Deck::new(&config.cards),
            cards: CardHand::new(config.max_cards_in_hand),
            held_card: None,
            selecting: None,
            tutorial_pending: config.tutorial_enabled,
            next_unit_id: 0,
            rng: StdRng::seed_from_u64(config.seed),
            events: Vec::new(),
            deferred: Vec::new(),
            config,
        }
    }

    /// Fill move budgets, shuffle the deck, deal both hands and hand the turn
    /// to the player.
    pub fn setup(&mut self) -> Opening {
        debug_assert_eq!(self.phase, Phase::Setup, "setup runs once");

        self.remaining_player_moves = self.max_player_moves;
        self.remaining_opponent_moves = self.config.max_opponent_moves;
        self.deck.shuffle(&mut self.rng);

        let opponent = self.draw_pieces(Side::Opponent);
        let player = self.draw_pieces(Side::Player);

        self.phase = Phase::PlayerTurn;
        self.emit(MatchEvent::TurnChanged { side: Side::Player });
        self.emit(MatchEvent::MovesLeftChanged {
            moves: self.remaining_player_moves,
        });
        info!(seed = self.config.seed, "match started");

        Opening { player, opponent }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Side that owns the turn, if any.
    #[must_use]
    pub const fn active_side(&self) -> Option<Side> {
        self.phase.active_side()
    }

    /// Final result, once decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            Phase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Configuration the match runs with.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Moves left this turn for a side.
    #[must_use]
    pub const fn remaining_moves(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.remaining_player_moves,
            Side::Opponent => self.remaining_opponent_moves,
        }
    }

    /// Per-turn move budget for a side.
    #[must_use]
    pub const fn max_moves(&self, side: Side) -> u32 {
        match side {
            Side::Player => self.max_player_moves,
            Side::Opponent => self.config.max_opponent_moves,
        }
    }

    /// Pieces a side holds.
    #[must_use]
    pub const fn pieces_in_hand(&self, side: Side) -> usize {
        match side {
            Side::Player => self.player_pieces_in_hand,
            Side::Opponent => self.opponent_pieces_in_hand,
        }
    }

    /// Knowledge counter.
    #[must_use]
    pub const fn knowledge(&self) -> u32 {
        self.knowledge
    }

    /// Volume a side has accumulated by damaging the other.
    #[must_use]
    pub const fn accumulated_volume(&self, side: Side) -> f32 {
        match side {
            Side::Player => self.player_volume,
            Side::Opponent => self.opponent_volume,
        }
    }

    /// Completed turns.
    #[must_use]
    pub const fn turns_played(&self) -> u32 {
        self.turns_played
    }

    /// The draw pile.
    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Mutable draw pile.
    #[cfg(test)]
    pub(crate) fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    /// Card slots.
    #[must_use]
    pub const fn cards(&self) -> &CardHand {
        &self.cards
    }

    /// Cards held, equal to the number of occupied slots.
    #[must_use]
    pub fn cards_in_hand(&self) -> usize {
        self.cards.occupied()
    }

    /// Knowledge card currently picked up.
    #[must_use]
    pub const fn held_card(&self) -> Option<CardId> {
        self.held_card
    }

    /// Unit-targeted card waiting for a target.
    #[must_use]
    pub fn selected_card(&self) -> Option<Card> {
        self.selecting.and_then(|id| self.cards.find(id)).copied()
    }

    /// Match random source.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Queue a notification.
    pub fn emit(&mut self, event: MatchEvent) {
        self.events.push(event);
    }

    /// Take every queued notification.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take the delayed triggers requested since the last call.
    pub fn take_deferred(&mut self) -> Vec<(f32, Task)> {
        std::mem::take(&mut self.deferred)
    }

    /// Spend one move of the side owning the turn.
    ///
    /// When the budget hits zero the other side's budget is refilled and the
    /// turn flips. Returns `true` on a flip. Does nothing outside a turn.
    pub fn perform_move(&mut self) -> bool {
        match self.phase {
            Phase::PlayerTurn => {
                self.remaining_player_moves = self.remaining_player_moves.saturating_sub(1);
                self.emit(MatchEvent::MovesLeftChanged {
                    moves: self.remaining_player_moves,
                });
                if self.remaining_player_moves > 0 {
                    return false;
                }

                self.remaining_opponent_moves = self.config.max_opponent_moves;
                self.phase = Phase::OpponentTurn;
                self.turns_played += 1;
                info!(turn = self.turns_played, "opponent turn");

                self.emit(MatchEvent::TurnChangeAnimation);
                self.emit(MatchEvent::MovesLeftChanged {
                    moves: self.remaining_opponent_moves,
                });
                self.emit(MatchEvent::TurnChanged { side: Side::Opponent });
                self.emit(MatchEvent::PointerCapture { locked: true });
                true
            }
            Phase::OpponentTurn => {
                self.remaining_opponent_moves = self.remaining_opponent_moves.saturating_sub(1);
                self.emit(MatchEvent::MovesLeftChanged {
                    moves: self.remaining_opponent_moves,
                });
                if self.remaining_opponent_moves > 0 {
                    return false;
                }

                self.remaining_player_moves = self.max_player_moves;
                self.phase = Phase::PlayerTurn;
                self.turns_played += 1;
                info!(turn = self.turns_played, "player turn");

                self.emit(MatchEvent::MovesLeftChanged {
                    moves: self.remaining_player_moves,
                });
                self.emit(MatchEvent::TurnChanged { side: Side::Player });
                self.emit(MatchEvent::PointerCapture { locked: false });
                if self.tutorial_pending {
                    self.tutorial_pending = false;
                    self.deferred
                        .push((self.config.timing.tutorial_delay, Task::OpenTutorial));
                } else {
                    self.emit(MatchEvent::TurnChangeAnimation);
                }
                true
            }
            Phase::Setup | Phase::GameOver(_) => {
                debug!(phase = ?self.phase, "move ignored outside a turn");
                false
            }
        }
    }

    /// Account for a piece leaving the acting side's hand.
    ///
    /// Refills the hand when it empties, then spends a move. Returns the fresh
    /// batch, if one was drawn.
    pub fn on_place_piece(&mut self) -> Option<Vec<CombatUnit>> {
        let side = self.active_side()?;

        let emptied = {
            let count = match side {
                Side::Player => &mut self.player_pieces_in_hand,
                Side::Opponent => &mut self.opponent_pieces_in_hand,
            };
            *count = count.saturating_sub(1);
            *count == 0
        };
        let refill = emptied.then(|| self.draw_pieces(side));

        self.perform_move();
        refill
    }

    /// Deal a full batch of random pieces from a side's roster.
    pub fn draw_pieces(&mut self, side: Side) -> Vec<CombatUnit> {
        let roster = match side {
            Side::Player => &self.config.player_roster,
            Side::Opponent => &self.config.opponent_roster,
        };
        if roster.is_empty() {
            warn!(%side, "cannot draw pieces from an empty roster");
            return Vec::new();
        }

        let count = self.config.max_pieces_in_hand;
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            let spec = &roster[self.rng.random_range(0..roster.len())];
            batch.push(CombatUnit::new(UnitId(self.next_unit_id), spec, side));
            self.next_unit_id += 1;
        }

        match side {
            Side::Player => self.player_pieces_in_hand = count,
            Side::Opponent => self.opponent_pieces_in_hand = count,
        }
        debug!(%side, count, "pieces drawn");
        self.emit(MatchEvent::Audio {
            cue: AudioCue::PieceDrawn,
        });
        batch
    }

    /// Credit damage dealt to a `target`-side unit to the other side's tally,
    /// ending the match once a tally reaches the threshold.
    pub fn on_hit_piece(&mut self, target: Side, damage: f32) {
        let credited = target.opposite();
        let tally = match credited {
            Side::Player => &mut self.player_volume,
            Side::Opponent => &mut self.opponent_volume,
        };
        *tally += damage;
        let value = *tally;
        let max = self.config.required_volume_to_win;

        debug!(side = %credited, damage, value, "volume credited");
        self.emit(MatchEvent::VolumeFillChanged {
            side: credited,
            value,
            max,
        });

        if value >= max && self.outcome().is_none() {
            let outcome = Outcome::won_by(credited);
            self.phase = Phase::GameOver(outcome);
            info!(?outcome, "match decided");
            self.emit(MatchEvent::FadeIn);
            self.deferred
                .push((self.config.timing.outcome_delay, Task::ShowOutcome(outcome)));
        }
    }

    /// Advance knowledge by one, granting a permanent extra player move at
    /// every multiple of the configured interval. No-op at the cap.
    pub fn increase_knowledge(&mut self) {
        if self.knowledge >= self.config.max_knowledge {
            return;
        }

        self.knowledge += 1;
        if self.knowledge % self.config.extra_move_required_knowledge == 0 {
            self.max_player_moves += 1;
            info!(moves = self.max_player_moves, "player move budget raised");
        }
        self.emit(MatchEvent::KnowledgeChanged {
            knowledge: self.knowledge,
        });
    }

    /// Draw a card into the first free slot and spend a move.
    ///
    /// A full hand makes this a silent no-op that spends nothing.
    pub fn draw_card(&mut self) -> Option<CardId> {
        if self.cards.is_full() {
            debug!(capacity = self.cards.capacity(), "card draw ignored, hand full");
            return None;
        }

        let card = self.deck.draw_next(&mut self.rng)?;
        if let Err(e) = self.cards.insert(card) {
            debug!(%e, "card draw ignored");
            return None;
        }

        debug!(card = card.id.0, cursor = self.deck.cursor(), "card drawn");
        self.perform_move();
        self.emit(MatchEvent::Audio {
            cue: AudioCue::CardDrawn,
        });
        Some(card.id)
    }

    /// Start using the card in a slot.
    ///
    /// Knowledge cards are picked up on first use and applied on the second.
    /// Controller cards resolve here; board cards are handed back to the
    /// caller; unit cards wait for a target.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoSuchHandSlot`] for an empty or missing slot.
    pub fn start_using_card(&mut self, slot: usize) -> EngineResult<CardDispatch> {
        let card = *self.cards.slot(slot).ok_or(EngineError::NoSuchHandSlot(slot))?;

        if card.knowledge {
            if self.held_card != Some(card.id) {
                self.held_card = Some(card.id);
                self.emit(MatchEvent::CardPickedUp { card: card.id });
                return Ok(CardDispatch::PickedUp);
            }
            self.held_card = None;
            self.emit(MatchEvent::CardDropped { card: card.id });
            self.emit(MatchEvent::Audio {
                cue: AudioCue::KnowledgeCardUsed,
            });
        }

        match card.route {
            CardRoute::Unit => {
                self.emit(MatchEvent::Audio {
                    cue: AudioCue::CardSelected,
                });
                self.selecting = Some(card.id);
                Ok(CardDispatch::AwaitingTarget(card.id))
            }
            CardRoute::Board => Ok(CardDispatch::ToBoard(card)),
            CardRoute::Controller => {
                if let Err(e) = self.apply_controller_effect(card.effect) {
                    warn!(%e, "card effect dropped");
                }
                self.use_card(card.id);
                Ok(CardDispatch::Applied(card.id))
            }
        }
    }

    /// Apply an effect addressed to the match controller.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTarget`] for effects the controller does
    /// not handle.
    pub fn apply_controller_effect(&mut self, effect: CardEffect) -> EngineResult<()> {
        match effect {
            CardEffect::IncreaseKnowledge => {
                self.increase_knowledge();
                Ok(())
            }
            CardEffect::GrantMoves { count } => {
                let Some(side) = self.active_side() else {
                    return Ok(());
                };
                let remaining = match side {
                    Side::Player => &mut self.remaining_player_moves,
                    Side::Opponent => &mut self.remaining_opponent_moves,
                };
                *remaining += count;
                let moves = *remaining;
                self.emit(MatchEvent::MovesLeftChanged { moves });
                Ok(())
            }
            other => Err(EngineError::InvalidTarget {
                effect: other.name(),
                route: CardRoute::Controller,
            }),
        }
    }

    /// Remove a card from its slot and retire it.
    pub fn use_card(&mut self, id: CardId) -> Option<Card> {
        let card = self.cards.take(id)?;
        self.deck.retire(&card);
        if self.held_card == Some(id) {
            self.held_card = None;
        }
        if self.selecting == Some(id) {
            self.selecting = None;
        }
        self.emit(MatchEvent::CardUsed { card: id });
        Some(card)
    }
}

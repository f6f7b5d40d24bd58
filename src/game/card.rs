//! Cards, the draw deck and the hand slots.
//!
//! Cards describe their effect as data: a typed [`CardEffect`] plus a
//! [`CardRoute`] naming which receiver applies it.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::game::CombatUnit;

/// Receiver a card's effect is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRoute {
    /// A unit picked on the board after the card is played.
    Unit,
    /// The board as a whole, applied immediately.
    Board,
    /// The match controller, applied immediately.
    Controller,
}

impl std::fmt::Display for CardRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardRoute::Unit => write!(f, "unit"),
            CardRoute::Board => write!(f, "board"),
            CardRoute::Controller => write!(f, "controller"),
        }
    }
}

/// What a card does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardEffect {
    /// Restore volume to a unit.
    Heal {
        /// Volume restored.
        amount: f32,
    },
    /// Restore a quarter of a unit's max volume.
    HealQuarter,
    /// Stack or unstack a unit.
    ChangeHeight {
        /// Height levels added.
        delta: i32,
    },
    /// Tilt a prism.
    ChangeAngle {
        /// Orientation steps added.
        delta: i32,
    },
    /// Damage every opponent unit on the board.
    Barrage {
        /// Damage per unit.
        damage: f32,
    },
    /// Advance the knowledge counter by one.
    IncreaseKnowledge,
    /// Add moves to the current turn.
    GrantMoves {
        /// Moves added.
        count: u32,
    },
}

impl CardEffect {
    /// Short name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            CardEffect::Heal { .. } => "heal",
            CardEffect::HealQuarter => "heal_quarter",
            CardEffect::ChangeHeight { .. } => "change_height",
            CardEffect::ChangeAngle { .. } => "change_angle",
            CardEffect::Barrage { .. } => "barrage",
            CardEffect::IncreaseKnowledge => "increase_knowledge",
            CardEffect::GrantMoves { .. } => "grant_moves",
        }
    }

    /// Apply a unit-targeted effect.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTarget`] for effects that do not act on a
    /// single unit, and for tilting a unit that cannot tilt.
    pub fn apply_to_unit(self, unit: &mut CombatUnit) -> EngineResult<()> {
        let invalid = EngineError::InvalidTarget {
            effect: self.name(),
            route: CardRoute::Unit,
        };
        match self {
            CardEffect::Heal { amount } => unit.heal(amount),
            CardEffect::HealQuarter => unit.heal_quarter(),
            CardEffect::ChangeHeight { delta } => {
                unit.change_height(delta);
            }
            CardEffect::ChangeAngle { delta } => {
                if !unit.change_angle(delta) {
                    return Err(invalid);
                }
            }
            CardEffect::Barrage { .. }
            | CardEffect::IncreaseKnowledge
            | CardEffect::GrantMoves { .. } => return Err(invalid),
        }
        Ok(())
    }
}

/// A card template as configured, with how many copies go in the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSpec {
    /// Display name.
    pub name: String,
    /// Effect applied on use.
    pub effect: CardEffect,
    /// Receiver of the effect.
    pub route: CardRoute,
    /// Knowledge cards must be picked up before they can be used.
    #[serde(default)]
    pub knowledge: bool,
    /// Copies in the deck.
    pub count: u32,
    /// Whether a used copy returns to the deck on reshuffle.
    #[serde(default = "default_true")]
    pub can_be_reshuffled: bool,
}

const fn default_true() -> bool {
    true
}

/// Identifier of a drawn card instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

/// A card instance drawn into the hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Card {
    /// Instance identifier.
    pub id: CardId,
    /// Index of the template in the deck's template table.
    pub template: usize,
    /// Effect applied on use.
    pub effect: CardEffect,
    /// Receiver of the effect.
    pub route: CardRoute,
    /// Must be picked up before use.
    pub knowledge: bool,
}

/// The shuffled draw pile.
///
/// Entries are template indices. Drawing deals a fresh [`Card`] instance for
/// the entry under the cursor; the entry itself stays in the pile.
#[derive(Debug, Clone)]
pub struct Deck {
    templates: Vec<CardSpec>,
    entries: Vec<usize>,
    cursor: usize,
    times_reshuffled: u32,
    retired: Vec<usize>,
    next_id: u32,
}

impl Deck {
    /// Build an unshuffled deck from card templates.
    #[must_use]
    pub fn new(templates: &[CardSpec]) -> Self {
        let entries = templates
            .iter()
            .enumerate()
            .flat_map(|(index, spec)| std::iter::repeat_n(index, spec.count as usize))
            .collect();

        Self {
            templates: templates.to_vec(),
            entries,
            cursor: 0,
            times_reshuffled: 0,
            retired: Vec::new(),
            next_id: 0,
        }
    }

    /// Number of entries in the pile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pile has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries dealt since the last shuffle.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor, clamped to the pile length.
    #[cfg(test)]
    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.entries.len());
    }

    /// How many times the pile has been shuffled.
    #[must_use]
    pub const fn times_reshuffled(&self) -> u32 {
        self.times_reshuffled
    }

    /// Template a card was dealt from.
    #[must_use]
    pub fn template(&self, card: &Card) -> Option<&CardSpec> {
        self.templates.get(card.template)
    }

    /// Uniform in-place shuffle. Resets the cursor.
    ///
    /// Entries of used, non-reshufflable templates are dropped first.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for template in self.retired.drain(..) {
            if let Some(pos) = self.entries.iter().position(|&entry| entry == template) {
                self.entries.remove(pos);
            }
        }

        self.entries.shuffle(rng);
        self.cursor = 0;
        self.times_reshuffled += 1;
    }

    /// Deal the entry under the cursor, reshuffling first if the pile is
    /// exhausted. Returns `None` only for an empty pile.
    pub fn draw_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.cursor >= self.entries.len() {
            self.shuffle(rng);
        }

        let template = *self.entries.get(self.cursor)?;
        let spec = &self.templates[template];
        let card = Card {
            id: CardId(self.next_id),
            template,
            effect: spec.effect,
            route: spec.route,
            knowledge: spec.knowledge,
        };
        self.next_id += 1;
        self.cursor += 1;
        Some(card)
    }

    /// Record that a card was used. Non-reshufflable templates lose one entry
    /// at the next shuffle.
    pub fn retire(&mut self, card: &Card) {
        if self
            .template(card)
            .is_some_and(|spec| !spec.can_be_reshuffled)
        {
            self.retired.push(card.template);
        }
    }
}

/// Fixed set of card slots.
#[derive(Debug, Clone)]
pub struct CardHand {
    slots: Vec<Option<Card>>,
}

impl CardHand {
    /// Create a hand with `capacity` empty slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Whether every slot is occupied.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Card in a slot.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Card> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Find a card by instance id.
    #[must_use]
    pub fn find(&self, id: CardId) -> Option<&Card> {
        self.slots.iter().flatten().find(|card| card.id == id)
    }

    /// Put a card into the first free slot, scanning in slot order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CapacityExceeded`] if every slot is taken.
    pub fn insert(&mut self, card: Card) -> EngineResult<usize> {
        let capacity = self.slots.len();
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(EngineError::CapacityExceeded { capacity })?;
        *slot = Some(card);
        Ok(index)
    }

    /// Free the slot holding this card instance.
    pub fn take(&mut self, id: CardId) -> Option<Card> {
        self.slots
            .iter_mut()
            .find(|slot| slot.is_some_and(|card| card.id == id))
            .and_then(Option::take)
    }

    /// Iterate over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Card)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|card| (index, card)))
    }
}

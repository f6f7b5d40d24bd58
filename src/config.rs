//! Match configuration.
//!
//! Every setting has a default matching the stock game, so a config file only
//! needs to name what it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::game::{CardEffect, CardRoute, CardSpec, MAX_ANGLE_INDEX, UnitKind, UnitSpec};

/// Opponent decision timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Seconds between decisions while the AI owns the turn.
    pub move_delay: f32,
    /// Seconds between turning to face a target and the hit landing.
    pub attack_telegraph: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            move_delay: 4.0,
            attack_telegraph: 1.5,
        }
    }
}

/// Delays for one-off presentation triggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds after the first opponent-to-player flip before the tutorial opens.
    pub tutorial_delay: f32,
    /// Seconds between the winning hit and the outcome screen.
    pub outcome_delay: f32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tutorial_delay: 2.0,
            outcome_delay: 2.5,
        }
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Rows; the first half belongs to the opponent.
    pub rows: u16,
    /// Columns.
    pub cols: u16,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { rows: 6, cols: 6 }
    }
}

/// Complete configuration for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Seed for deck shuffles, piece draws and random placement.
    pub seed: u64,
    /// Pieces dealt per batch.
    pub max_pieces_in_hand: usize,
    /// Card slots.
    pub max_cards_in_hand: usize,
    /// Player moves per turn at the start of the match.
    pub max_player_moves: u32,
    /// Opponent moves per turn.
    pub max_opponent_moves: u32,
    /// Knowledge interval that grants a permanent extra player move.
    pub extra_move_required_knowledge: u32,
    /// Knowledge cap.
    pub max_knowledge: u32,
    /// Accumulated volume that wins the match.
    pub required_volume_to_win: f32,
    /// Open the tutorial after the first opponent turn.
    pub tutorial_enabled: bool,
    /// Board dimensions.
    pub board: BoardConfig,
    /// Templates the player draws from.
    pub player_roster: Vec<UnitSpec>,
    /// Templates the opponent draws from.
    pub opponent_roster: Vec<UnitSpec>,
    /// Deck composition.
    pub cards: Vec<CardSpec>,
    /// Opponent timing.
    pub ai: AiConfig,
    /// Presentation delays.
    pub timing: TimingConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_pieces_in_hand: 4,
            max_cards_in_hand: 3,
            max_player_moves: 2,
            max_opponent_moves: 2,
            extra_move_required_knowledge: 5,
            max_knowledge: 5,
            required_volume_to_win: 1000.0,
            tutorial_enabled: true,
            board: BoardConfig::default(),
            player_roster: vec![UnitSpec::cuboid(), UnitSpec::prism()],
            opponent_roster: vec![UnitSpec::cuboid(), UnitSpec::prism()],
            cards: default_cards(),
            ai: AiConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

fn card(name: &str, effect: CardEffect, route: CardRoute, count: u32) -> CardSpec {
    CardSpec {
        name: name.to_string(),
        effect,
        route,
        knowledge: false,
        count,
        can_be_reshuffled: true,
    }
}

fn default_cards() -> Vec<CardSpec> {
    vec![
        card("Mend", CardEffect::Heal { amount: 40.0 }, CardRoute::Unit, 3),
        card("Restore", CardEffect::HealQuarter, CardRoute::Unit, 2),
        card("Raise", CardEffect::ChangeHeight { delta: 1 }, CardRoute::Unit, 2),
        card("Tilt", CardEffect::ChangeAngle { delta: -1 }, CardRoute::Unit, 2),
        card("Brace", CardEffect::ChangeAngle { delta: 1 }, CardRoute::Unit, 2),
        card("Haste", CardEffect::GrantMoves { count: 1 }, CardRoute::Controller, 1),
        CardSpec {
            can_be_reshuffled: false,
            ..card("Barrage", CardEffect::Barrage { damage: 25.0 }, CardRoute::Board, 1)
        },
        CardSpec {
            knowledge: true,
            ..card("Insight", CardEffect::IncreaseKnowledge, CardRoute::Controller, 3)
        },
    ]
}

impl MatchConfig {
    /// Load a config from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the file cannot be read, is not
    /// valid JSON, or fails validation.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EngineError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if serialization fails.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Reject settings the match state machine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] naming the first offending setting.
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |reason: &str| Err(EngineError::Config(reason.to_string()));

        if self.max_pieces_in_hand == 0 {
            return fail("max_pieces_in_hand must be at least 1");
        }
        if self.max_cards_in_hand == 0 {
            return fail("max_cards_in_hand must be at least 1");
        }
        if self.max_player_moves == 0 || self.max_opponent_moves == 0 {
            return fail("move budgets must be at least 1");
        }
        if self.extra_move_required_knowledge == 0 {
            return fail("extra_move_required_knowledge must be at least 1");
        }
        if self.required_volume_to_win.is_nan() || self.required_volume_to_win <= 0.0 {
            return fail("required_volume_to_win must be positive");
        }
        if self.board.rows < 2 || self.board.cols == 0 {
            return fail("board needs at least 2 rows and 1 column");
        }
        if self.player_roster.is_empty() || self.opponent_roster.is_empty() {
            return fail("both rosters need at least one unit template");
        }
        for spec in self.player_roster.iter().chain(&self.opponent_roster) {
            validate_unit(spec)?;
        }
        if self.cards.iter().all(|card| card.count == 0) {
            return fail("deck must contain at least one card");
        }
        if self.ai.move_delay < 0.0 || self.ai.attack_telegraph < 0.0 {
            return fail("AI delays cannot be negative");
        }
        Ok(())
    }
}

fn validate_unit(spec: &UnitSpec) -> EngineResult<()> {
    let fail = |reason: String| Err(EngineError::Config(reason));

    if spec.stats.is_empty() {
        return fail(format!("{:?} template has no stats rows", spec.kind));
    }
    if spec.kind == UnitKind::Prism && spec.stats.len() != MAX_ANGLE_INDEX + 1 {
        return fail(format!(
            "prism template needs {} stats rows, got {}",
            MAX_ANGLE_INDEX + 1,
            spec.stats.len()
        ));
    }
    if spec.default_stats_index >= spec.stats.len() {
        return fail(format!(
            "default_stats_index {} is out of range",
            spec.default_stats_index
        ));
    }
    if spec.max_height == 0 {
        return fail("max_height must be at least 1".to_string());
    }
    if spec
        .stats
        .iter()
        .any(|row| row.volume.is_nan() || row.volume <= 0.0 || row.damage < 0.0)
    {
        return fail(format!(
            "{:?} template has a non-positive volume or negative damage",
            spec.kind
        ));
    }
    Ok(())
}

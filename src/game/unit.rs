//! Combat units: cuboids and prisms.
//!
//! A unit's health ("volume") and damage both scale with its height. Prisms
//! additionally carry an orientation index selecting a row in their stats
//! table, trading volume for damage as they tilt.

use serde::{Deserialize, Serialize};

use crate::game::Side;

/// Highest orientation index a prism can take.
pub const MAX_ANGLE_INDEX: usize = 4;

/// Kind of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Solid block with no attack.
    Cuboid,
    /// Ranged unit whose orientation sets damage and volume.
    Prism,
}

/// One row of a unit's stats table, expressed per unit of height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    /// Volume (max health) per height.
    pub volume: f32,
    /// Damage per height.
    pub damage: f32,
}

impl StatRow {
    /// Create a stats row.
    #[must_use]
    pub const fn new(volume: f32, damage: f32) -> Self {
        Self { volume, damage }
    }
}

/// Template a unit is drawn from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    /// Kind of unit.
    pub kind: UnitKind,
    /// Stats rows. Cuboids use a single row, prisms one row per orientation.
    pub stats: Vec<StatRow>,
    /// Orientation a freshly drawn unit starts in.
    pub default_stats_index: usize,
    /// Height at which the unit can no longer be stacked onto.
    pub max_height: u32,
}

impl UnitSpec {
    /// Default cuboid template.
    #[must_use]
    pub fn cuboid() -> Self {
        Self {
            kind: UnitKind::Cuboid,
            stats: vec![StatRow::new(100.0, 0.0)],
            default_stats_index: 0,
            max_height: 5,
        }
    }

    /// Default prism template. Tilting towards index 0 favours damage,
    /// towards index 4 favours volume.
    #[must_use]
    pub fn prism() -> Self {
        Self {
            kind: UnitKind::Prism,
            stats: vec![
                StatRow::new(30.0, 40.0),
                StatRow::new(45.0, 30.0),
                StatRow::new(60.0, 20.0),
                StatRow::new(75.0, 12.5),
                StatRow::new(90.0, 5.0),
            ],
            default_stats_index: 2,
            max_height: 5,
        }
    }
}

/// Identifier of a unit, unique within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

/// A unit in hand or on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatUnit {
    id: UnitId,
    kind: UnitKind,
    side: Side,
    stats: Vec<StatRow>,
    max_height: u32,
    height: u32,
    health: f32,
    damage: f32,
    angle_index: usize,
    facing: usize,
}

impl CombatUnit {
    /// Create a height-1 unit from a template.
    ///
    /// A template with an empty stats table gets a single inert row.
    #[must_use]
    pub fn new(id: UnitId, spec: &UnitSpec, side: Side) -> Self {
        let stats = if spec.stats.is_empty() {
            vec![StatRow::new(1.0, 0.0)]
        } else {
            spec.stats.clone()
        };
        let angle_index = spec.default_stats_index.min(stats.len() - 1);
        let row = stats[angle_index];

        Self {
            id,
            kind: spec.kind,
            side,
            stats,
            max_height: spec.max_height.max(1),
            height: 1,
            health: row.volume,
            damage: row.damage,
            angle_index,
            facing: 0,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Unit kind.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Side the unit was spawned for.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Whether this is an opponent unit.
    #[must_use]
    pub const fn is_enemy_unit(&self) -> bool {
        self.side.is_enemy()
    }

    /// Current height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Maximum stack height.
    #[must_use]
    pub const fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Remaining volume.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Damage dealt per attack.
    #[must_use]
    pub const fn damage(&self) -> f32 {
        self.damage
    }

    /// Current orientation index into the stats table.
    #[must_use]
    pub const fn angle_index(&self) -> usize {
        self.angle_index
    }

    /// Direction the unit is facing (index into its range buckets).
    #[must_use]
    pub const fn facing(&self) -> usize {
        self.facing
    }

    /// Turn to face the given range bucket.
    pub fn set_facing(&mut self, facing: usize) {
        self.facing = facing;
    }

    /// Whether the unit can attack at range.
    #[must_use]
    pub const fn is_ranged(&self) -> bool {
        matches!(self.kind, UnitKind::Prism)
    }

    /// Max health for the current orientation and height.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn max_health(&self) -> f32 {
        self.row().volume * self.height as f32
    }

    /// Whether the unit has run out of volume.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Subtract damage, clamping at zero.
    ///
    /// Returns `true` if the unit is now destroyed. Removing it from the board
    /// is the caller's job.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.health = (self.health - amount).max(0.0);
        self.is_destroyed()
    }

    /// Heal, clamped to max health.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(self.max_health());
    }

    /// Heal by a quarter of max health.
    pub fn heal_quarter(&mut self) {
        self.heal(self.max_health() / 4.0);
    }

    /// Grow (or shrink) by `delta` levels, clamped to `[1, max_height]`.
    ///
    /// Health and damage change by the per-height values of the current row,
    /// so damage already taken carries over. Returns the delta actually applied.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn change_height(&mut self, delta: i32) -> i32 {
        let target =
            (i64::from(self.height) + i64::from(delta)).clamp(1, i64::from(self.max_height));
        let applied = (target - i64::from(self.height)) as i32;
        if applied == 0 {
            return 0;
        }

        let row = self.row();
        self.height = target as u32;
        self.health = (self.health + row.volume * applied as f32).max(0.0);
        self.damage = (self.damage + row.damage * applied as f32).max(0.0);
        applied
    }

    /// Tilt a prism by `delta` orientation steps, clamped to `[0, 4]`.
    ///
    /// Damage is recomputed from the new row. Health keeps the same fraction
    /// of max health it had before the tilt. Returns `false` for units that
    /// cannot tilt.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn change_angle(&mut self, delta: i32) -> bool {
        if !self.is_ranged() {
            return false;
        }

        let old_max = self.max_health();
        let fraction = if old_max > 0.0 {
            (self.health / old_max).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let last = MAX_ANGLE_INDEX.min(self.stats.len() - 1);
        let target = (self.angle_index as i64 + i64::from(delta)).clamp(0, last as i64);
        self.angle_index = target as usize;

        self.damage = self.row().damage * self.height as f32;
        self.health = self.max_health() * fraction;
        true
    }

    /// Hit `target` with this unit's damage. Returns the damage applied.
    pub fn attack(&self, target: &mut CombatUnit) -> f32 {
        target.take_damage(self.damage);
        self.damage
    }

    fn row(&self) -> StatRow {
        self.stats[self.angle_index]
    }
}

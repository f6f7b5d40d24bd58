//! Board topology: tiles, occupancy and prism ranges.
//!
//! The match engine only talks to the board through [`BoardService`].
//! [`GridBoard`] is the in-memory implementation: a rectangular grid whose
//! top half belongs to the opponent and bottom half to the player.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::game::{CombatUnit, Side, UnitKind};

/// Range-bucket directions as `(row, col)` steps: up, right, down, left.
pub const DIRECTIONS: [(i32, i32); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

/// A coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row, counted from the opponent's back row.
    pub row: u16,
    /// Column.
    pub col: u16,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(row: u16, col: u16) -> Self {
        Self { row, col }
    }

    /// Step `distance` tiles in a direction, staying inside `rows` x `cols`.
    #[must_use]
    pub fn step(
        self,
        (d_row, d_col): (i32, i32),
        distance: u32,
        rows: u16,
        cols: u16,
    ) -> Option<Self> {
        let distance = i64::from(distance);
        let row = i64::from(self.row) + i64::from(d_row) * distance;
        let col = i64::from(self.col) + i64::from(d_col) * distance;
        let row = u16::try_from(row).ok().filter(|&r| r < rows)?;
        let col = u16::try_from(col).ok().filter(|&c| c < cols)?;
        Some(Self::new(row, col))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A single board tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Side whose half of the board the tile is on.
    pub side: Side,
    /// Unit standing on the tile.
    pub unit: Option<CombatUnit>,
}

impl Tile {
    /// Create an empty tile on the given side.
    #[must_use]
    pub const fn new(side: Side) -> Self {
        Self { side, unit: None }
    }

    /// Whether a unit stands on the tile.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.unit.is_some()
    }
}

/// How a unit ended up on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The unit took an empty tile.
    Placed,
    /// The unit was merged into a same-type unit, raising its height.
    Stacked {
        /// Height of the stack afterwards.
        height: u32,
    },
}

/// What a hit did to its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Side owning the hit unit.
    pub side: Side,
    /// Kind of the hit unit.
    pub kind: UnitKind,
    /// Whether the unit was destroyed and removed.
    pub destroyed: bool,
}

/// Board topology collaborator.
///
/// Authoritative owner of tile occupancy. Queries return tiles in row-major
/// order.
pub trait BoardService {
    /// Tile at a coordinate.
    fn get_tile(&self, coord: Coord) -> Option<&Tile>;

    /// Mutable unit at a coordinate.
    fn unit_at_mut(&mut self, coord: Coord) -> Option<&mut CombatUnit>;

    /// Unoccupied tiles on one side's half.
    fn list_unoccupied_tiles(&self, side: Side) -> Vec<Coord>;

    /// Occupied tiles on one side's half.
    fn list_occupied_tiles(&self, side: Side) -> Vec<Coord>;

    /// Check that a unit may be placed on a tile without placing it.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoSuchTile`] for a missing tile, and
    /// [`EngineError::IllegalPlacement`] for a tile on the wrong side or one
    /// holding a unit that cannot take the stack.
    fn can_place(&self, coord: Coord, unit: &CombatUnit) -> EngineResult<()>;

    /// Place a unit, stacking it onto a same-type unit already there.
    ///
    /// # Errors
    ///
    /// Same as [`BoardService::can_place`].
    fn place_unit(&mut self, coord: Coord, unit: CombatUnit) -> EngineResult<Placement>;

    /// Take a unit off the board.
    fn remove_unit(&mut self, coord: Coord) -> Option<CombatUnit>;

    /// Range buckets of the unit on a tile, one per entry of [`DIRECTIONS`].
    /// Empty for tiles without a ranged unit.
    fn range_buckets(&self, coord: Coord) -> Vec<Vec<Coord>>;

    /// Unit at a coordinate.
    fn unit_at(&self, coord: Coord) -> Option<&CombatUnit> {
        self.get_tile(coord).and_then(|tile| tile.unit.as_ref())
    }

    /// Whether a unit stands on the tile.
    fn is_occupied(&self, coord: Coord) -> bool {
        self.get_tile(coord).is_some_and(Tile::is_occupied)
    }

    /// Whether the tile is on the opponent's half.
    fn is_enemy_tile(&self, coord: Coord) -> bool {
        self.get_tile(coord).is_some_and(|tile| tile.side == Side::Opponent)
    }

    /// Unoccupied tiles on the opponent's half.
    fn list_unoccupied_enemy_tiles(&self) -> Vec<Coord> {
        self.list_unoccupied_tiles(Side::Opponent)
    }

    /// Hit the unit on a tile, removing it if destroyed.
    fn apply_damage(&mut self, coord: Coord, amount: f32) -> Option<DamageReport> {
        let unit = self.unit_at_mut(coord)?;
        let destroyed = unit.take_damage(amount);
        let report = DamageReport {
            side: unit.side(),
            kind: unit.kind(),
            destroyed,
        };
        if destroyed {
            self.remove_unit(coord);
        }
        Some(report)
    }
}

/// Rectangular in-memory board.
#[derive(Debug, Clone)]
pub struct GridBoard {
    /// Number of rows.
    rows: u16,
    /// Number of columns.
    cols: u16,
    /// Tiles stored in row-major order.
    tiles: Vec<Tile>,
}

impl GridBoard {
    /// Create an empty board. The first `rows / 2` rows are the opponent's.
    ///
    /// Returns `None` if either dimension is below 2 rows / 1 column.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Option<Self> {
        if rows < 2 || cols == 0 {
            return None;
        }

        let half = rows / 2;
        let tiles = (0..rows)
            .flat_map(|row| {
                let side = if row < half { Side::Opponent } else { Side::Player };
                (0..cols).map(move |_| Tile::new(side))
            })
            .collect();

        Some(Self { rows, cols, tiles })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> u16 {
        self.cols
    }

    /// Check if a coordinate is within the board.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.row < self.rows && coord.col < self.cols
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        self.in_bounds(coord)
            .then(|| usize::from(coord.row) * usize::from(self.cols) + usize::from(coord.col))
    }

    /// Iterate over all coordinates and tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Tile)> {
        let cols = usize::from(self.cols);
        self.tiles.iter().enumerate().map(move |(idx, tile)| {
            #[allow(clippy::cast_possible_truncation)]
            let coord = Coord::new((idx / cols) as u16, (idx % cols) as u16);
            (coord, tile)
        })
    }

    /// Iterate over the tiles on one side's half.
    pub fn side_tiles(&self, side: Side) -> impl Iterator<Item = (Coord, &Tile)> {
        self.iter().filter(move |(_, tile)| tile.side == side)
    }
}

impl BoardService for GridBoard {
    fn get_tile(&self, coord: Coord) -> Option<&Tile> {
        self.index(coord).map(|idx| &self.tiles[idx])
    }

    fn unit_at_mut(&mut self, coord: Coord) -> Option<&mut CombatUnit> {
        let idx = self.index(coord)?;
        self.tiles[idx].unit.as_mut()
    }

    fn list_unoccupied_tiles(&self, side: Side) -> Vec<Coord> {
        self.side_tiles(side)
            .filter(|(_, tile)| !tile.is_occupied())
            .map(|(coord, _)| coord)
            .collect()
    }

    fn list_occupied_tiles(&self, side: Side) -> Vec<Coord> {
        self.side_tiles(side)
            .filter(|(_, tile)| tile.is_occupied())
            .map(|(coord, _)| coord)
            .collect()
    }

    fn can_place(&self, coord: Coord, unit: &CombatUnit) -> EngineResult<()> {
        let tile = self.get_tile(coord).ok_or(EngineError::NoSuchTile(coord))?;
        if tile.side != unit.side() {
            return Err(EngineError::IllegalPlacement(coord));
        }

        match &tile.unit {
            None => Ok(()),
            Some(resident)
                if resident.side() == unit.side()
                    && resident.kind() == unit.kind()
                    && resident.height() + unit.height() <= resident.max_height() =>
            {
                Ok(())
            }
            Some(_) => Err(EngineError::IllegalPlacement(coord)),
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    fn place_unit(&mut self, coord: Coord, unit: CombatUnit) -> EngineResult<Placement> {
        self.can_place(coord, &unit)?;
        let idx = self.index(coord).ok_or(EngineError::NoSuchTile(coord))?;
        let tile = &mut self.tiles[idx];

        if let Some(resident) = tile.unit.as_mut() {
            resident.change_height(unit.height() as i32);
            Ok(Placement::Stacked {
                height: resident.height(),
            })
        } else {
            tile.unit = Some(unit);
            Ok(Placement::Placed)
        }
    }

    fn remove_unit(&mut self, coord: Coord) -> Option<CombatUnit> {
        let idx = self.index(coord)?;
        self.tiles[idx].unit.take()
    }

    fn range_buckets(&self, coord: Coord) -> Vec<Vec<Coord>> {
        let Some(unit) = self.unit_at(coord).filter(|unit| unit.is_ranged()) else {
            return Vec::new();
        };
        let reach = unit.height();

        DIRECTIONS
            .iter()
            .map(|&direction| {
                (1..=reach)
                    .map_while(|distance| coord.step(direction, distance, self.rows, self.cols))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{UnitId, UnitSpec};

    fn unit(spec: &UnitSpec, side: Side) -> CombatUnit {
        CombatUnit::new(UnitId(0), spec, side)
    }

    #[test]
    fn test_board_creation() {
        let board = GridBoard::new(6, 5).unwrap();
        assert_eq!(board.rows(), 6);
        assert_eq!(board.cols(), 5);
        assert_eq!(board.list_unoccupied_enemy_tiles().len(), 15);
        assert_eq!(board.list_unoccupied_tiles(Side::Player).len(), 15);
    }

    #[test]
    fn test_board_too_small() {
        assert!(GridBoard::new(1, 4).is_none());
        assert!(GridBoard::new(4, 0).is_none());
    }

    #[test]
    fn test_enemy_half() {
        let board = GridBoard::new(6, 6).unwrap();
        assert!(board.is_enemy_tile(Coord::new(0, 0)));
        assert!(board.is_enemy_tile(Coord::new(2, 5)));
        assert!(!board.is_enemy_tile(Coord::new(3, 0)));
        assert!(!board.is_enemy_tile(Coord::new(9, 0)));
    }

    #[test]
    fn test_coord_step_bounds() {
        let coord = Coord::new(0, 0);
        assert_eq!(coord.step((1, 0), 2, 6, 6), Some(Coord::new(2, 0)));
        assert_eq!(coord.step((-1, 0), 1, 6, 6), None);
        assert_eq!(coord.step((0, 1), 6, 6, 6), None);
    }

    #[test]
    fn test_place_and_stack() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(4, 2);
        let spec = UnitSpec::cuboid();

        assert_eq!(board.place_unit(coord, unit(&spec, Side::Player)).unwrap(), Placement::Placed);
        assert_eq!(
            board.place_unit(coord, unit(&spec, Side::Player)).unwrap(),
            Placement::Stacked { height: 2 }
        );
        assert_eq!(board.unit_at(coord).unwrap().height(), 2);
        assert_eq!(board.list_occupied_tiles(Side::Player), vec![coord]);
    }

    #[test]
    fn test_cannot_place_on_other_half() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let err = board
            .place_unit(Coord::new(0, 0), unit(&UnitSpec::cuboid(), Side::Player))
            .unwrap_err();
        assert_eq!(err, EngineError::IllegalPlacement(Coord::new(0, 0)));
    }

    #[test]
    fn test_cannot_stack_different_kinds() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(1, 1);
        board.place_unit(coord, unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        assert!(board.can_place(coord, &unit(&UnitSpec::prism(), Side::Opponent)).is_err());
    }

    #[test]
    fn test_cannot_stack_past_max_height() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(1, 1);
        let spec = UnitSpec::cuboid();
        for _ in 0..5 {
            board.place_unit(coord, unit(&spec, Side::Opponent)).unwrap();
        }
        assert_eq!(board.unit_at(coord).unwrap().height(), 5);
        assert!(board.place_unit(coord, unit(&spec, Side::Opponent)).is_err());
    }

    #[test]
    fn test_apply_damage_removes_destroyed_unit() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(1, 1);
        board.place_unit(coord, unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();

        let report = board.apply_damage(coord, 60.0).unwrap();
        assert!(!report.destroyed);
        assert_eq!(report.side, Side::Opponent);

        let report = board.apply_damage(coord, 60.0).unwrap();
        assert!(report.destroyed);
        assert!(!board.is_occupied(coord));
        assert!(board.apply_damage(coord, 1.0).is_none());
    }

    #[test]
    fn test_range_buckets_follow_height() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(2, 0);
        board.place_unit(coord, unit(&UnitSpec::prism(), Side::Opponent)).unwrap();

        let buckets = board.range_buckets(coord);
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0], vec![Coord::new(1, 0)]);
        assert_eq!(buckets[1], vec![Coord::new(2, 1)]);
        assert_eq!(buckets[2], vec![Coord::new(3, 0)]);
        assert!(buckets[3].is_empty());

        board.place_unit(coord, unit(&UnitSpec::prism(), Side::Opponent)).unwrap();
        let buckets = board.range_buckets(coord);
        assert_eq!(buckets[2], vec![Coord::new(3, 0), Coord::new(4, 0)]);
    }

    #[test]
    fn test_cuboid_has_no_range() {
        let mut board = GridBoard::new(6, 6).unwrap();
        let coord = Coord::new(2, 0);
        board.place_unit(coord, unit(&UnitSpec::cuboid(), Side::Opponent)).unwrap();
        assert!(board.range_buckets(coord).is_empty());
    }
}

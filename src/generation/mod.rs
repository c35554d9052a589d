//! # Generation Module
//!
//! Procedural floor generation: layout, monster and item placement, and the
//! descent point.
//!
//! Two strategies implement [`Generator`]: rectangular rooms joined by
//! L-shaped corridors ([`RoomCorridorGenerator`]) and cellular-automata caves
//! ([`CellularAutomataGenerator`]). Both draw every random number from the
//! game RNG they are handed, so a seed reproduces a floor exactly.

pub mod caves;
pub mod dungeon;
pub mod encounters;
pub mod items;

pub use caves::*;
pub use dungeon::*;
pub use encounters::*;
pub use items::*;

use crate::game::{GameMap, GameRng, Position, Prefabs, TileType};
use crate::{config, CairnError, CairnResult};
use serde::{Deserialize, Serialize};

/// Which layout strategy builds new floors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// Rectangular rooms chained by corridors
    #[default]
    Rooms,
    /// Smoothed cellular-automata caves
    Caves,
}

impl GeneratorKind {
    /// Returns the generator implementing this strategy.
    pub fn generator(self) -> Box<dyn Generator<GeneratedFloor>> {
        match self {
            GeneratorKind::Rooms => Box::new(RoomCorridorGenerator::new()),
            GeneratorKind::Caves => Box::new(CellularAutomataGenerator::new()),
        }
    }
}

/// Configuration for procedural generation.
///
/// Controls map size, room limits, cave parameters and the strategy used.
/// Missing fields in a JSON config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed for standalone generation through [`utils::create_rng`]
    pub seed: u64,
    pub map_width: i32,
    pub map_height: i32,
    /// Minimum room side length
    pub room_min_size: i32,
    /// Maximum room side length
    pub room_max_size: i32,
    /// Room placement attempts per floor
    pub max_rooms: u32,
    /// Percentage of interior cells seeded as wall in caves
    pub wall_percent: u32,
    /// Reached fraction below which a cave is regenerated
    pub min_open_fraction: f64,
    /// Attempts before a floor is given up on
    pub max_generation_attempts: u32,
    pub kind: GeneratorKind,
}

impl GenerationConfig {
    /// Creates a default generation configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!((config.map_width, config.map_height), (80, 43));
    /// assert!(config.room_max_size >= config.room_min_size);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            map_width: config::DEFAULT_MAP_WIDTH,
            map_height: config::DEFAULT_MAP_HEIGHT,
            room_min_size: config::ROOM_MIN_SIZE,
            room_max_size: config::ROOM_MAX_SIZE,
            max_rooms: config::MAX_ROOMS,
            wall_percent: config::CAVE_WALL_PERCENT,
            min_open_fraction: config::CAVE_MIN_OPEN_FRACTION,
            max_generation_attempts: config::MAX_GENERATION_ATTEMPTS,
            kind: GeneratorKind::Rooms,
        }
    }

    /// Creates a configuration for testing with smaller, simpler floors.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            map_width: 40,
            map_height: 30,
            room_min_size: 4,
            room_max_size: 8,
            max_rooms: 20,
            ..Self::new(seed)
        }
    }

    /// Switches the layout strategy.
    pub fn with_kind(mut self, kind: GeneratorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// A rectangular room.
///
/// The rectangle spans `x1..=x2` by `y1..=y2`; its outermost ring stays
/// wall and only the interior is carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Acceptance order on its floor
    pub id: u32,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Room {
    /// Creates a room at `top_left` with the given size.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{Position, Room};
    ///
    /// let room = Room::new(0, Position::new(5, 5), 10, 8);
    /// assert_eq!(room.center(), Position::new(10, 9));
    /// assert_eq!(room.inner_positions().len(), 9 * 7);
    /// ```
    pub fn new(id: u32, top_left: Position, width: i32, height: i32) -> Self {
        Self {
            id,
            x1: top_left.x,
            y1: top_left.y,
            x2: top_left.x + width,
            y2: top_left.y + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Integer midpoint of the rectangle.
    pub fn center(&self) -> Position {
        Position::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    /// Cells carved to floor, in row-major order.
    pub fn inner_positions(&self) -> Vec<Position> {
        ((self.y1 + 1)..self.y2)
            .flat_map(|y| ((self.x1 + 1)..self.x2).map(move |x| Position::new(x, y)))
            .collect()
    }

    /// True if `pos` lies in the carved interior.
    pub fn contains_inner(&self, pos: Position) -> bool {
        pos.x > self.x1 && pos.x < self.x2 && pos.y > self.y1 && pos.y < self.y2
    }

    /// Inclusive overlap test, so touching rooms also intersect.
    pub fn intersects(&self, other: &Room) -> bool {
        self.x1 <= other.x2 && self.x2 >= other.x1 && self.y1 <= other.y2 && self.y2 >= other.y1
    }
}

/// A freshly generated floor, before the player is seated on it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedFloor {
    /// Tiles, monsters and items; the player is not yet on it
    pub map: GameMap,
    pub player_start: Position,
    /// Accepted rooms, empty for cave floors
    pub rooms: Vec<Room>,
}

/// Trait for procedural generators.
///
/// Generators draw from the game RNG they are given and never keep state
/// between calls.
pub trait Generator<T> {
    /// Generates content for floor `depth`.
    fn generate(
        &self,
        config: &GenerationConfig,
        depth: u32,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> CairnResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;
    use ::pathfinding::prelude::{bfs_reach, dijkstra_all};
    use std::cmp::Reverse;
    use std::collections::HashSet;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> GameRng {
        crate::game::seeded_rng(config.seed)
    }

    fn walkable_neighbours(map: &GameMap, pos: Position) -> Vec<Position> {
        pos.adjacent_positions()
            .into_iter()
            .filter(|next| map.is_walkable(*next))
            .collect()
    }

    /// Every walkable cell reachable from `start` by 8-way steps.
    pub fn reachable_positions(map: &GameMap, start: Position) -> HashSet<Position> {
        if !map.is_walkable(start) {
            return HashSet::new();
        }
        bfs_reach(start, |pos| walkable_neighbours(map, *pos)).collect()
    }

    /// The reachable cell with the most steps from `start`.
    ///
    /// Ties go to the smallest position so the result does not depend on
    /// hash order.
    pub fn farthest_reachable(map: &GameMap, start: Position) -> Option<Position> {
        dijkstra_all(&start, |pos| {
            walkable_neighbours(map, *pos)
                .into_iter()
                .map(|next| (next, 1usize))
        })
        .into_iter()
        .max_by_key(|(pos, (_, steps))| (*steps, Reverse(*pos)))
        .map(|(pos, _)| pos)
    }

    /// Checks that a floor is fully connected and can be descended from.
    pub fn validate_floor(floor: &GeneratedFloor) -> CairnResult<()> {
        let map = &floor.map;
        if !map.is_walkable(floor.player_start) {
            return Err(CairnError::GenerationFailed(format!(
                "Player start {} is not walkable",
                floor.player_start
            )));
        }
        if map.tile(map.downstairs) != Some(TileType::DownStairs) {
            return Err(CairnError::GenerationFailed(format!(
                "No downstairs at {}",
                map.downstairs
            )));
        }

        let reached = reachable_positions(map, floor.player_start);
        let stranded = map
            .walkable_positions()
            .into_iter()
            .filter(|pos| !reached.contains(pos))
            .count();
        if stranded > 0 {
            return Err(CairnError::GenerationFailed(format!(
                "{} walkable cells are unreachable from the player start",
                stranded
            )));
        }

        if let Some(entity) = map.entities.iter().find(|e| !map.is_walkable(e.position)) {
            return Err(CairnError::GenerationFailed(format!(
                "{} placed inside a wall at {}",
                entity.name, entity.position
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.kind, GeneratorKind::Rooms);
        assert!(config.room_min_size <= config.room_max_size);

        let small = GenerationConfig::for_testing(1).with_kind(GeneratorKind::Caves);
        assert!(small.map_width < config.map_width);
        assert_eq!(small.kind, GeneratorKind::Caves);
    }

    #[test]
    fn test_partial_json_config_uses_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{ "kind": "Caves", "wall_percent": 45 }"#).unwrap();
        assert_eq!(config.kind, GeneratorKind::Caves);
        assert_eq!(config.wall_percent, 45);
        assert_eq!(config.map_width, 80);
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(0, Position::new(5, 5), 10, 8);
        assert_eq!((room.x2, room.y2), (15, 13));
        assert_eq!(room.width(), 10);
        assert_eq!(room.center(), Position::new(10, 9));
        assert!(room.contains_inner(Position::new(6, 6)));
        assert!(room.contains_inner(Position::new(14, 12)));
        assert!(!room.contains_inner(Position::new(5, 6)));
        assert!(!room.contains_inner(Position::new(15, 6)));
        assert!(room
            .inner_positions()
            .iter()
            .all(|pos| room.contains_inner(*pos)));
    }

    #[test]
    fn test_room_intersection_is_inclusive() {
        let room = Room::new(0, Position::new(0, 0), 6, 6);
        let touching = Room::new(1, Position::new(6, 0), 6, 6);
        let apart = Room::new(2, Position::new(7, 0), 6, 6);
        assert!(room.intersects(&touching));
        assert!(touching.intersects(&room));
        assert!(!room.intersects(&apart));
    }

    #[test]
    fn test_farthest_reachable_in_corridor() {
        let mut map = GameMap::new(10, 3, 1);
        for x in 1..9 {
            map.set_tile(Position::new(x, 1), TileType::Floor).unwrap();
        }
        assert_eq!(
            utils::farthest_reachable(&map, Position::new(3, 1)),
            Some(Position::new(8, 1))
        );
        assert_eq!(utils::reachable_positions(&map, Position::new(3, 1)).len(), 8);
        assert!(utils::reachable_positions(&map, Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_validate_floor_rejects_stranded_cells() {
        let mut map = GameMap::new(10, 5, 1);
        for x in 1..4 {
            map.set_tile(Position::new(x, 1), TileType::Floor).unwrap();
        }
        map.set_tile(Position::new(3, 1), TileType::DownStairs).unwrap();
        map.downstairs = Position::new(3, 1);
        let mut floor = GeneratedFloor {
            map,
            player_start: Position::new(1, 1),
            rooms: Vec::new(),
        };
        assert!(utils::validate_floor(&floor).is_ok());

        floor.map.set_tile(Position::new(7, 3), TileType::Floor).unwrap();
        assert!(utils::validate_floor(&floor).is_err());
    }
}

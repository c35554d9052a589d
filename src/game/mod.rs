//! # Game Module
//!
//! Core game state management, world representation, and entity systems.
//!
//! This module contains the fundamental building blocks of the Cairn core:
//! - Game state management, the turn loop and persistence
//! - Map and tile representation with field of view
//! - Composed actors and items, and the prefab registry
//! - Melee resolution, scheduling, AI and the action layer

pub mod actions;
pub mod ai;
pub mod combat;
pub mod entities;
pub mod fov;
pub mod messages;
pub mod prefabs;
pub mod state;
pub mod ticker;
pub mod world;

pub use actions::*;
pub use ai::*;
pub use combat::*;
pub use entities::*;
pub use fov::*;
pub use messages::*;
pub use prefabs::*;
pub use state::*;
pub use ticker::*;
pub use world::*;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A cell coordinate; `y` grows downward.
///
/// # Examples
///
/// ```
/// use cairn::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.adjacent_positions().len(), 8);
/// assert_eq!(pos.to_string(), "(10, 5)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// `max(|dx|, |dy|)`. Melee reaches exactly the cells at distance 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::Position;
    ///
    /// let here = Position::origin();
    /// assert_eq!(here.chebyshev_distance(Position::new(3, -4)), 4);
    /// assert_eq!(here.chebyshev_distance(Position::new(1, 1)), 1);
    /// ```
    pub fn chebyshev_distance(self, other: Position) -> u32 {
        let delta = self - other;
        delta.x.unsigned_abs().max(delta.y.unsigned_abs())
    }

    /// Straight-line distance, used for spell ranges and blast radii.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let delta = self - other;
        f64::from(delta.x).hypot(f64::from(delta.y))
    }

    /// The eight surrounding cells, in [`Direction::ALL`] order.
    pub fn adjacent_positions(self) -> Vec<Position> {
        Direction::ALL
            .iter()
            .map(|direction| self + direction.to_delta())
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the eight single-cell steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// Row-major order around a cell, top-left first.
    pub const ALL: [Direction; 8] = [
        Direction::Northwest,
        Direction::North,
        Direction::Northeast,
        Direction::West,
        Direction::East,
        Direction::Southwest,
        Direction::South,
        Direction::Southeast,
    ];

    /// # Examples
    ///
    /// ```
    /// use cairn::{Direction, Position};
    ///
    /// assert_eq!(Direction::North.to_delta(), Position::new(0, -1));
    /// assert_eq!(Direction::Southwest.to_delta(), Position::new(-1, 1));
    /// ```
    pub fn to_delta(self) -> Position {
        let (dx, dy) = match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
            Direction::Northeast => (1, -1),
            Direction::Northwest => (-1, -1),
            Direction::Southeast => (1, 1),
            Direction::Southwest => (-1, 1),
        };
        Position::new(dx, dy)
    }

    /// The direction of a single step, or `None` for anything longer.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        Self::ALL
            .into_iter()
            .find(|direction| direction.to_delta() == delta)
    }
}

/// An RGB colour attached to glyphs and log messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);
    pub const CORPSE: Color = Color::new(191, 0, 0);
}

/// Unique identifier for game entities.
pub type EntityId = Uuid;

/// Random number generator carried by the game state.
///
/// ChaCha8 serializes its full stream position, so a restored game keeps
/// rolling the same numbers it would have rolled before saving.
pub type GameRng = ChaCha8Rng;

/// Creates a seeded game RNG.
pub fn seeded_rng(seed: u64) -> GameRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Creates a new entity ID from the given RNG.
///
/// Ids are drawn from the game RNG so a seed reproduces a whole floor,
/// identifiers included.
pub fn new_entity_id<R: Rng + ?Sized>(rng: &mut R) -> EntityId {
    let bytes: [u8; 16] = rng.gen();
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distances() {
        let a = Position::origin();
        let b = Position::new(3, 4);
        assert_eq!(a.euclidean_distance(b), 5.0);
        assert_eq!(a.chebyshev_distance(b), 4);
        assert_eq!(b.chebyshev_distance(a), 4);
    }

    #[test]
    fn test_position_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.adjacent_positions();
        assert_eq!(adjacent.len(), 8);
        assert!(adjacent.contains(&Position::new(4, 4)));
        assert!(adjacent.contains(&Position::new(6, 6)));
        assert!(!adjacent.contains(&pos));
        assert!(adjacent.iter().all(|p| p.chebyshev_distance(pos) == 1));
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
        }
        assert_eq!(Direction::from_delta(Position::new(2, 0)), None);
        assert_eq!(Direction::from_delta(Position::origin()), None);
    }

    #[test]
    fn test_entity_ids_follow_seed() {
        let mut rng_a = seeded_rng(7);
        let mut rng_b = seeded_rng(7);
        let first = new_entity_id(&mut rng_a);
        assert_eq!(first, new_entity_id(&mut rng_b));
        assert_ne!(first, new_entity_id(&mut rng_a));
    }
}

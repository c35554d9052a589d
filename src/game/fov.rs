//! # Field of View
//!
//! Radius-limited line of sight over a [`GameMap`].
//!
//! The map exposes its opacity to `bracket-pathfinding`, whose shadowcasting
//! decides what the player sees. Opaque cells on the edge of sight are
//! themselves visible, so walls bounding a room are seen.

use crate::game::{GameMap, Position};
use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{field_of_view, Algorithm2D, BaseMap};

impl From<Position> for Point {
    fn from(pos: Position) -> Self {
        Point::new(pos.x, pos.y)
    }
}

impl From<Point> for Position {
    fn from(point: Point) -> Self {
        Position::new(point.x, point.y)
    }
}

impl BaseMap for GameMap {
    fn is_opaque(&self, idx: usize) -> bool {
        let width = self.width.max(1) as usize;
        let pos = Position::new((idx % width) as i32, (idx / width) as i32);
        !self.is_transparent(pos)
    }
}

impl Algorithm2D for GameMap {
    fn dimensions(&self) -> Point {
        Point::new(self.width, self.height)
    }

    fn in_bounds(&self, point: Point) -> bool {
        GameMap::in_bounds(self, point.into())
    }
}

/// Cells visible from `origin` within a Euclidean `radius`.
///
/// # Examples
///
/// ```
/// use cairn::{visible_cells, GameMap, Position, TileType};
///
/// let mut map = GameMap::new(5, 5, 1);
/// for x in 1..4 {
///     for y in 1..4 {
///         map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
///     }
/// }
/// let seen = visible_cells(&map, Position::new(2, 2), 8);
/// assert!(seen.contains(&Position::new(1, 1)));
/// assert!(seen.contains(&Position::new(0, 2)));
/// ```
pub fn visible_cells(map: &GameMap, origin: Position, radius: i32) -> Vec<Position> {
    if !map.in_bounds(origin) {
        return Vec::new();
    }
    field_of_view(origin.into(), radius, map)
        .into_iter()
        .map(Position::from)
        .filter(|pos| map.in_bounds(*pos))
        .filter(|pos| pos.euclidean_distance(origin) <= f64::from(radius))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::TileType;

    /// A one-row corridor of floor, walled above and below.
    fn corridor(length: i32) -> GameMap {
        let mut map = GameMap::new(length, 3, 1);
        for x in 0..length {
            map.set_tile(Position::new(x, 1), TileType::Floor).unwrap();
        }
        map
    }

    #[test]
    fn test_radius_limits_sight() {
        let map = corridor(30);
        let seen = visible_cells(&map, Position::new(0, 1), 8);
        assert!(seen.contains(&Position::new(7, 1)));
        assert!(seen.iter().all(|pos| pos.x <= 8));
    }

    #[test]
    fn test_wall_blocks_cells_behind_it() {
        let mut map = corridor(10);
        map.set_tile(Position::new(3, 1), TileType::Wall).unwrap();
        let seen = visible_cells(&map, Position::new(0, 1), 8);
        assert!(seen.contains(&Position::new(2, 1)));
        assert!(seen.contains(&Position::new(3, 1)), "the wall itself is seen");
        assert!(!seen.contains(&Position::new(4, 1)));
    }

    #[test]
    fn test_origin_outside_map_sees_nothing() {
        let map = corridor(4);
        assert!(visible_cells(&map, Position::new(-1, 1), 8).is_empty());
    }

    #[test]
    fn test_opacity_follows_tiles() {
        let map = corridor(4);
        let floor = map.point2d_to_index(Point::new(2, 1));
        let wall = map.point2d_to_index(Point::new(2, 0));
        assert!(!map.is_opaque(floor));
        assert!(map.is_opaque(wall));
    }
}

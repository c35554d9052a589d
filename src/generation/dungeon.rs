//! # Dungeon Generation
//!
//! Rectangular rooms chained together by L-shaped corridors.
//!
//! Rooms are proposed at random and dropped if they touch an earlier room.
//! Every accepted room after the first is tunnelled to the one accepted just
//! before it, so the rooms form a chain and the floor is connected by
//! construction. The player starts in the centre of the first room and the
//! stairs down sit in the centre of the last.

use crate::game::{GameMap, GameRng, Position, Prefabs, TileType};
use crate::generation::{
    item_table, items_per_room, monster_table, monsters_per_room, utils, GeneratedFloor,
    GenerationConfig, Generator, Room,
};
use crate::{CairnError, CairnResult};
use bracket_geometry::prelude::Bresenham;
use rand::Rng;

/// Primary dungeon generator using the room-and-corridor algorithm.
///
/// # Examples
///
/// ```
/// use cairn::{GenerationConfig, Generator, Prefabs, RoomCorridorGenerator};
/// use cairn::generation::utils::create_rng;
///
/// let config = GenerationConfig::for_testing(3);
/// let mut rng = create_rng(&config);
/// let generator = RoomCorridorGenerator::new();
/// let floor = generator.generate(&config, 1, &Prefabs::standard(), &mut rng).unwrap();
/// assert!(floor.rooms.len() >= 2);
/// assert!(generator.validate(&floor, &config).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoomCorridorGenerator;

impl RoomCorridorGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Proposes one room of random size and position, if the map can hold it.
    fn propose_room(
        &self,
        id: u32,
        config: &GenerationConfig,
        rng: &mut GameRng,
    ) -> Option<Room> {
        // A room needs at least one interior cell.
        let min = config.room_min_size.max(2);
        let max = config.room_max_size.max(min);
        let width = rng.gen_range(min..=max);
        let height = rng.gen_range(min..=max);

        let max_x = config.map_width - width - 1;
        let max_y = config.map_height - height - 1;
        if max_x < 0 || max_y < 0 {
            return None;
        }

        let x = rng.gen_range(0..=max_x);
        let y = rng.gen_range(0..=max_y);
        Some(Room::new(id, Position::new(x, y), width, height))
    }

    /// Scatters this floor's share of monsters and items inside `room`.
    ///
    /// A spawn that lands on an occupied cell is skipped, not moved.
    fn place_entities(
        &self,
        map: &mut GameMap,
        room: &Room,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<()> {
        let depth = map.depth;
        let monster_count = rng.gen_range(0..=monsters_per_room().value_for(depth));
        let item_count = rng.gen_range(0..=items_per_room().value_for(depth));

        let mut spawns = monster_table().pick(depth, monster_count, rng)?;
        spawns.extend(item_table().pick(depth, item_count, rng)?);

        for prefab in spawns {
            let pos = Position::new(
                rng.gen_range(room.x1 + 1..=room.x2 - 1),
                rng.gen_range(room.y1 + 1..=room.y2 - 1),
            );
            if map.is_occupied(pos) {
                log::trace!("Skipping {:?} at occupied {}", prefab, pos);
                continue;
            }
            map.add_entity(prefabs.spawn(prefab, pos, rng)?);
        }
        Ok(())
    }
}

/// Cells of an L-shaped tunnel from `start` to `end`.
///
/// The corner is picked at random: horizontal leg first or vertical leg first.
pub fn tunnel_between(start: Position, end: Position, rng: &mut GameRng) -> Vec<Position> {
    let corner = if rng.gen_bool(0.5) {
        Position::new(end.x, start.y)
    } else {
        Position::new(start.x, end.y)
    };

    let mut cells = line(start, corner);
    cells.extend(line(corner, end));
    cells
}

/// Rasterized straight line with both endpoints included.
fn line(start: Position, end: Position) -> Vec<Position> {
    let mut cells: Vec<Position> = Bresenham::new(start.into(), end.into())
        .map(Position::from)
        .collect();
    if cells.last() != Some(&end) {
        cells.push(end);
    }
    cells
}

impl Generator<GeneratedFloor> for RoomCorridorGenerator {
    fn generate(
        &self,
        config: &GenerationConfig,
        depth: u32,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<GeneratedFloor> {
        let mut map = GameMap::new(config.map_width, config.map_height, depth);
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..config.max_rooms {
            let Some(room) = self.propose_room(rooms.len() as u32, config, rng) else {
                continue;
            };
            if rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }

            for pos in room.inner_positions() {
                map.set_tile(pos, TileType::Floor)?;
            }

            if let Some(previous) = rooms.last() {
                self.place_entities(&mut map, &room, prefabs, rng)?;
                for pos in tunnel_between(previous.center(), room.center(), rng) {
                    map.set_tile(pos, TileType::Floor)?;
                }
            }

            rooms.push(room);
        }

        let (first, last) = match (rooms.first(), rooms.last()) {
            (Some(first), Some(last)) if rooms.len() >= 2 => (*first, *last),
            _ => {
                return Err(CairnError::GenerationFailed(format!(
                    "Only {} room(s) fit on floor {}",
                    rooms.len(),
                    depth
                )))
            }
        };

        let stairs = last.center();
        map.set_tile(stairs, TileType::DownStairs)?;
        map.downstairs = stairs;

        log::debug!("Placed {} rooms on floor {}", rooms.len(), depth);
        Ok(GeneratedFloor {
            map,
            player_start: first.center(),
            rooms,
        })
    }

    fn validate(&self, content: &GeneratedFloor, _config: &GenerationConfig) -> CairnResult<()> {
        if content.rooms.len() < 2 {
            return Err(CairnError::GenerationFailed(
                "A room floor needs at least two rooms".to_string(),
            ));
        }
        if content.map.is_occupied(content.player_start) {
            return Err(CairnError::GenerationFailed(format!(
                "Player start {} is occupied",
                content.player_start
            )));
        }
        utils::validate_floor(content)
    }

    fn generator_type(&self) -> &'static str {
        "RoomCorridorGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    fn generate(seed: u64, depth: u32) -> GeneratedFloor {
        let config = GenerationConfig::new(seed);
        let mut rng = create_rng(&config);
        RoomCorridorGenerator::new()
            .generate(&config, depth, &Prefabs::standard(), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_rooms_never_intersect() {
        let floor = generate(17, 1);
        for (i, room) in floor.rooms.iter().enumerate() {
            for other in &floor.rooms[i + 1..] {
                assert!(!room.intersects(other));
            }
        }
    }

    #[test]
    fn test_player_start_and_stairs() {
        let floor = generate(23, 1);
        assert_eq!(floor.player_start, floor.rooms[0].center());
        let last = floor.rooms.last().unwrap();
        assert_eq!(floor.map.downstairs, last.center());
        assert_eq!(floor.map.tile(last.center()), Some(TileType::DownStairs));
    }

    #[test]
    fn test_first_room_is_empty() {
        for seed in 0..10 {
            let floor = generate(seed, 6);
            let first = floor.rooms[0];
            assert!(floor
                .map
                .entities
                .iter()
                .all(|entity| !first.contains_inner(entity.position)));
        }
    }

    #[test]
    fn test_same_seed_same_floor() {
        assert_eq!(generate(99, 2), generate(99, 2));
    }

    #[test]
    fn test_generation_is_valid_across_seeds() {
        let config = GenerationConfig::new(0);
        let generator = RoomCorridorGenerator::new();
        for seed in 0..25 {
            let floor = generate(seed, 1 + (seed % 8) as u32);
            generator.validate(&floor, &config).unwrap();
        }
    }

    #[test]
    fn test_tunnel_is_l_shaped() {
        let mut rng = crate::game::seeded_rng(1);
        let cells = tunnel_between(Position::new(2, 2), Position::new(6, 5), &mut rng);
        assert_eq!(cells.first(), Some(&Position::new(2, 2)));
        assert_eq!(cells.last(), Some(&Position::new(6, 5)));
        let corner_first = cells.contains(&Position::new(6, 2));
        let corner_second = cells.contains(&Position::new(2, 5));
        assert!(corner_first ^ corner_second);
    }

    #[test]
    fn test_line_includes_both_ends() {
        let point = Position::new(4, 4);
        assert_eq!(line(point, point), vec![point]);

        let cells = line(Position::new(-3, 7), Position::new(9, -2));
        assert_eq!(cells.first(), Some(&Position::new(-3, 7)));
        assert_eq!(cells.last(), Some(&Position::new(9, -2)));
        assert_eq!(cells.len(), 13);
        for pair in cells.windows(2) {
            assert_eq!(pair[0].chebyshev_distance(pair[1]), 1);
        }
    }

    #[test]
    fn test_tiny_map_fails() {
        let config = GenerationConfig {
            map_width: 8,
            map_height: 8,
            ..GenerationConfig::new(1)
        };
        let mut rng = create_rng(&config);
        let result = RoomCorridorGenerator::new().generate(&config, 1, &Prefabs::standard(), &mut rng);
        assert!(matches!(result, Err(CairnError::GenerationFailed(_))));
    }
}

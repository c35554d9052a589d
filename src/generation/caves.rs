//! # Cave Generation
//!
//! Organic cave floors grown with a cellular automaton.
//!
//! The interior is seeded with random walls, smoothed by four passes of the
//! primary rule and three of the secondary rule, then flood filled from a
//! random open cell. Only cells the flood reaches become floor, so a cave is
//! connected by construction. An attempt whose reached fraction is below
//! [`GenerationConfig::min_open_fraction`] is regrown; when every attempt falls
//! short the most open one is kept.

use crate::game::{GameMap, GameRng, Position, Prefabs, TileType};
use crate::generation::{
    item_table, items_per_floor, monster_table, monsters_per_floor, utils, GeneratedFloor,
    GenerationConfig, Generator,
};
use crate::{CairnError, CairnResult};
use ::pathfinding::prelude::bfs_reach;
use rand::Rng;
use std::collections::HashSet;

/// Smoothing passes of the primary rule.
const PRIMARY_PASSES: usize = 4;

/// Smoothing passes of the secondary rule.
const SECONDARY_PASSES: usize = 3;

/// Random cells tried before the flood fill or the player gives up.
const SEAT_TRIES: usize = 99;

/// Random cells tried per monster or item.
const SPAWN_TRIES: usize = 3;

/// Binary wall grid the automaton runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CaveGrid {
    width: i32,
    height: i32,
    walls: Vec<bool>,
}

impl CaveGrid {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Out-of-bounds cells count as walls.
    fn is_wall(&self, x: i32, y: i32) -> bool {
        !self.in_bounds(x, y) || self.walls[(y * self.width + x) as usize]
    }

    /// Walls in the square window of `radius` around `(x, y)`, centre included.
    fn walls_within(&self, x: i32, y: i32, radius: i32) -> u32 {
        let mut count = 0;
        for wy in (y - radius)..=(y + radius) {
            for wx in (x - radius)..=(x + radius) {
                if self.is_wall(wx, wy) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Runs one generation of the automaton.
    fn smoothed(&self, primary: bool) -> CaveGrid {
        let mut walls = Vec::with_capacity(self.walls.len());
        for y in 0..self.height {
            for x in 0..self.width {
                let near = self.walls_within(x, y, 1);
                let wall = if primary {
                    near >= 5 || self.walls_within(x, y, 2) <= 2
                } else {
                    near >= 5
                };
                walls.push(wall);
            }
        }
        CaveGrid {
            width: self.width,
            height: self.height,
            walls,
        }
    }

    fn open_neighbours(&self, pos: Position) -> Vec<Position> {
        pos.adjacent_positions()
            .into_iter()
            .filter(|next| !self.is_wall(next.x, next.y))
            .collect()
    }
}

/// Cave generator using a cellular automaton.
///
/// # Examples
///
/// ```
/// use cairn::{CellularAutomataGenerator, GenerationConfig, GeneratorKind, Generator, Prefabs};
/// use cairn::generation::utils::create_rng;
///
/// let config = GenerationConfig::for_testing(11).with_kind(GeneratorKind::Caves);
/// let mut rng = create_rng(&config);
/// let generator = CellularAutomataGenerator::new();
/// let floor = generator.generate(&config, 1, &Prefabs::standard(), &mut rng).unwrap();
/// assert!(floor.rooms.is_empty());
/// assert!(generator.validate(&floor, &config).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CellularAutomataGenerator;

impl CellularAutomataGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Seeds the grid: solid border, random interior.
    fn random_fill(&self, config: &GenerationConfig, rng: &mut GameRng) -> CaveGrid {
        let (width, height) = (config.map_width, config.map_height);
        let mut walls = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                walls.push(border || rng.gen_range(1..=100) <= config.wall_percent);
            }
        }
        CaveGrid {
            width,
            height,
            walls,
        }
    }

    /// Grows one cave and returns the cells reached from a random open cell.
    fn grow(&self, config: &GenerationConfig, rng: &mut GameRng) -> CairnResult<HashSet<Position>> {
        let mut grid = self.random_fill(config, rng);
        for _ in 0..PRIMARY_PASSES {
            grid = grid.smoothed(true);
        }
        for _ in 0..SECONDARY_PASSES {
            grid = grid.smoothed(false);
        }

        let start = (0..SEAT_TRIES)
            .map(|_| {
                Position::new(
                    rng.gen_range(0..grid.width),
                    rng.gen_range(0..grid.height),
                )
            })
            .find(|pos| !grid.is_wall(pos.x, pos.y))
            .ok_or_else(|| {
                CairnError::GenerationFailed(
                    "Could not find an open cell to start the flood fill".to_string(),
                )
            })?;

        Ok(bfs_reach(start, |pos| grid.open_neighbours(*pos)).collect())
    }

    /// A random walkable, unoccupied cell, if one turns up within `tries`.
    fn random_free_cell(map: &GameMap, tries: usize, rng: &mut GameRng) -> Option<Position> {
        (0..tries)
            .map(|_| {
                Position::new(
                    rng.gen_range(1..map.width),
                    rng.gen_range(1..map.height),
                )
            })
            .find(|pos| map.is_walkable(*pos) && !map.is_occupied(*pos))
    }
}

impl Generator<GeneratedFloor> for CellularAutomataGenerator {
    fn generate(
        &self,
        config: &GenerationConfig,
        depth: u32,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<GeneratedFloor> {
        if config.map_width < 3 || config.map_height < 3 {
            return Err(CairnError::GenerationFailed(format!(
                "A {}x{} map has no interior for a cave",
                config.map_width, config.map_height
            )));
        }

        let total = (config.map_width * config.map_height) as f64;
        let attempts = config.max_generation_attempts.max(1);
        let mut best: Option<HashSet<Position>> = None;

        for attempt in 1..=attempts {
            let reached = self.grow(config, rng)?;
            let fraction = reached.len() as f64 / total;
            log::trace!("Cave attempt {} reached {:.2} of the map", attempt, fraction);

            let improves = best
                .as_ref()
                .map_or(true, |current| reached.len() > current.len());
            if improves {
                best = Some(reached);
            }
            if fraction >= config.min_open_fraction {
                break;
            }
        }

        let reached = best.unwrap_or_default();
        let fraction = reached.len() as f64 / total;
        if fraction < config.min_open_fraction {
            log::warn!(
                "Keeping cave on floor {} with only {:.2} open after {} attempts",
                depth,
                fraction,
                attempts
            );
        }

        let mut map = GameMap::new(config.map_width, config.map_height, depth);
        for pos in &reached {
            map.set_tile(*pos, TileType::Floor)?;
        }

        let mut spawns = monster_table().pick(depth, monsters_per_floor().value_for(depth), rng)?;
        spawns.extend(item_table().pick(depth, items_per_floor().value_for(depth), rng)?);
        for prefab in spawns {
            match Self::random_free_cell(&map, SPAWN_TRIES, rng) {
                Some(pos) => map.add_entity(prefabs.spawn(prefab, pos, rng)?),
                None => log::trace!("No room found for {:?} on floor {}", prefab, depth),
            }
        }

        let player_start = Self::random_free_cell(&map, SEAT_TRIES, rng).ok_or_else(|| {
            CairnError::GenerationFailed(format!("No seat for the player on floor {}", depth))
        })?;

        let stairs = utils::farthest_reachable(&map, player_start).ok_or_else(|| {
            CairnError::GenerationFailed(format!("No stairs position on floor {}", depth))
        })?;
        map.set_tile(stairs, TileType::DownStairs)?;
        map.downstairs = stairs;

        log::debug!(
            "Grew cave on floor {} with {} open cells",
            depth,
            reached.len()
        );
        Ok(GeneratedFloor {
            map,
            player_start,
            rooms: Vec::new(),
        })
    }

    fn validate(&self, content: &GeneratedFloor, _config: &GenerationConfig) -> CairnResult<()> {
        if content.map.is_occupied(content.player_start) {
            return Err(CairnError::GenerationFailed(format!(
                "Player start {} is occupied",
                content.player_start
            )));
        }
        utils::validate_floor(content)
    }

    fn generator_type(&self) -> &'static str {
        "CellularAutomataGenerator"
    }
}

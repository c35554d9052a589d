//! # World Module
//!
//! Tile grids, floors and the sequence of floors making up a dungeon.
//!
//! A [`GameMap`] owns its tiles, its visibility grids and every entity
//! physically present on it. The [`World`] holds the active map, an archive
//! of abandoned floors, and the generation settings used to build the next
//! floor when the player descends.

use crate::game::{visible_cells, Color, Entity, EntityId, GameRng, Position, Prefabs};
use crate::generation::{GeneratedFloor, GenerationConfig};
use crate::utils::CostGrid;
use crate::{CairnError, CairnResult};
use serde::{Deserialize, Serialize};

/// Extra path cost for a cell occupied by a movement-blocking entity.
pub const CROWD_PATH_PENALTY: u32 = 10;

/// How a tile is drawn in one lighting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGraphic {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

/// Static properties shared by every cell of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub walkable: bool,
    pub transparent: bool,
    pub light: TileGraphic,
    pub dark: TileGraphic,
}

const FLOOR: Tile = Tile {
    walkable: true,
    transparent: true,
    light: TileGraphic {
        glyph: '.',
        fg: Color::new(255, 255, 255),
        bg: Color::new(200, 180, 50),
    },
    dark: TileGraphic {
        glyph: '.',
        fg: Color::new(100, 100, 100),
        bg: Color::new(50, 50, 150),
    },
};

const WALL: Tile = Tile {
    walkable: false,
    transparent: false,
    light: TileGraphic {
        glyph: '#',
        fg: Color::new(255, 255, 255),
        bg: Color::new(130, 110, 50),
    },
    dark: TileGraphic {
        glyph: '#',
        fg: Color::new(100, 100, 100),
        bg: Color::new(0, 0, 100),
    },
};

const DOWN_STAIRS: Tile = Tile {
    walkable: true,
    transparent: true,
    light: TileGraphic {
        glyph: '>',
        fg: Color::new(255, 255, 255),
        bg: Color::new(200, 180, 50),
    },
    dark: TileGraphic {
        glyph: '>',
        fg: Color::new(0, 0, 100),
        bg: Color::new(50, 50, 150),
    },
};

/// The kinds of terrain a cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Floor,
    Wall,
    DownStairs,
}

impl TileType {
    /// Returns the immutable template for this tile type.
    pub fn tile(self) -> &'static Tile {
        match self {
            TileType::Floor => &FLOOR,
            TileType::Wall => &WALL,
            TileType::DownStairs => &DOWN_STAIRS,
        }
    }

    pub fn is_walkable(self) -> bool {
        self.tile().walkable
    }

    pub fn is_transparent(self) -> bool {
        self.tile().transparent
    }
}

/// A single dungeon floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    /// Floor number, starting at 1
    pub depth: u32,
    tiles: Vec<TileType>,
    visible: Vec<bool>,
    explored: Vec<bool>,
    /// Entities physically present, in placement order
    pub entities: Vec<Entity>,
    /// The descent point
    pub downstairs: Position,
}

impl GameMap {
    /// Creates a map filled with walls.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{GameMap, Position, TileType};
    ///
    /// let map = GameMap::new(10, 8, 1);
    /// assert_eq!(map.tile(Position::new(3, 3)), Some(TileType::Wall));
    /// assert_eq!(map.tile(Position::new(10, 3)), None);
    /// ```
    pub fn new(width: i32, height: i32, depth: u32) -> Self {
        let cells = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            depth,
            tiles: vec![TileType::Wall; cells],
            visible: vec![false; cells],
            explored: vec![false; cells],
            entities: Vec::new(),
            downstairs: Position::origin(),
        }
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some((pos.y * self.width + pos.x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn tile(&self, pos: Position) -> Option<TileType> {
        self.index(pos).map(|i| self.tiles[i])
    }

    pub fn set_tile(&mut self, pos: Position, tile: TileType) -> CairnResult<()> {
        let index = self.index(pos).ok_or_else(|| {
            CairnError::InvalidState(format!("Tile {} is outside the map", pos))
        })?;
        self.tiles[index] = tile;
        Ok(())
    }

    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).map(TileType::is_walkable).unwrap_or(false)
    }

    pub fn is_transparent(&self, pos: Position) -> bool {
        self.tile(pos).map(TileType::is_transparent).unwrap_or(false)
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.index(pos).map(|i| self.visible[i]).unwrap_or(false)
    }

    pub fn is_explored(&self, pos: Position) -> bool {
        self.index(pos).map(|i| self.explored[i]).unwrap_or(false)
    }

    /// Recomputes visibility from `origin` and folds it into the explored grid.
    pub fn update_fov(&mut self, origin: Position, radius: i32) {
        let seen = visible_cells(self, origin, radius);
        self.visible.iter_mut().for_each(|visible| *visible = false);
        for pos in seen {
            if let Some(index) = self.index(pos) {
                self.visible[index] = true;
                self.explored[index] = true;
            }
        }
    }

    /// Every walkable cell, in row-major order.
    pub fn walkable_positions(&self) -> Vec<Position> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
            .filter(|pos| self.is_walkable(*pos))
            .collect()
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    /// Removes an entity from the map and hands over ownership.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|entity| entity.id == id)?;
        Some(self.entities.remove(index))
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.entities.iter().any(|entity| entity.position == pos)
    }

    pub fn blocking_entity_at(&self, pos: Position) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|entity| entity.blocks_movement && entity.position == pos)
    }

    /// Returns the living actor standing on `pos`.
    pub fn actor_at(&self, pos: Position) -> Option<&Entity> {
        self.actors().find(|entity| entity.position == pos)
    }

    /// Iterates over living actors.
    pub fn actors(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_alive())
    }

    /// Iterates over items lying on `pos`.
    pub fn items_at(&self, pos: Position) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(move |entity| entity.is_item() && entity.position == pos)
    }

    /// Builds the AI path cost grid.
    ///
    /// Walkable cells cost 1 and impassable cells 0. Cells under a blocking
    /// entity get [`CROWD_PATH_PENALTY`] added.
    pub fn cost_grid(&self) -> CostGrid {
        let mut grid = CostGrid::new(self.width, self.height);
        for pos in self.walkable_positions() {
            grid.set_cost(pos, 1);
        }
        for entity in self.entities.iter().filter(|e| e.blocks_movement) {
            grid.add_penalty(entity.position, CROWD_PATH_PENALTY);
        }
        grid
    }
}

/// The dungeon: the active floor plus everything left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// The floor being simulated
    pub current: GameMap,
    /// Abandoned floors, shallowest first; never simulated
    pub archive: Vec<GameMap>,
    /// Settings used to build each new floor
    pub generation: GenerationConfig,
}

impl World {
    /// Builds the first floor and places `player` on it.
    pub fn new(
        generation: GenerationConfig,
        player: Entity,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<Self> {
        let current = Self::build_floor(&generation, 1, player, prefabs, rng)?;
        Ok(Self {
            current,
            archive: Vec::new(),
            generation,
        })
    }

    pub fn depth(&self) -> u32 {
        self.current.depth
    }

    /// Replaces the active floor with a freshly generated deeper one.
    ///
    /// The player is carried over; everything else stays on the archived map.
    pub fn descend(
        &mut self,
        player_id: EntityId,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<()> {
        let player = self
            .current
            .remove_entity(player_id)
            .ok_or(CairnError::EntityNotFound(player_id))?;
        let depth = self.current.depth + 1;

        match Self::build_floor(&self.generation, depth, player.clone(), prefabs, rng) {
            Ok(next) => {
                let previous = std::mem::replace(&mut self.current, next);
                self.archive.push(previous);
                log::info!("Descended to floor {}", depth);
                Ok(())
            }
            Err(error) => {
                self.current.add_entity(player);
                Err(error)
            }
        }
    }

    /// Generates a floor, retrying failed attempts, and seats the player.
    fn build_floor(
        generation: &GenerationConfig,
        depth: u32,
        mut player: Entity,
        prefabs: &Prefabs,
        rng: &mut GameRng,
    ) -> CairnResult<GameMap> {
        let generator = generation.kind.generator();
        let attempts = generation.max_generation_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let outcome = generator
                .generate(generation, depth, prefabs, rng)
                .and_then(|floor| generator.validate(&floor, generation).map(|()| floor));
            match outcome {
                Ok(floor) => {
                    let GeneratedFloor {
                        mut map,
                        player_start,
                        ..
                    } = floor;
                    player.position = player_start;
                    map.add_entity(player);
                    log::info!(
                        "Generated floor {} with {} ({} entities)",
                        depth,
                        generator.generator_type(),
                        map.entities.len()
                    );
                    return Ok(map);
                }
                Err(error) => {
                    log::warn!(
                        "{} attempt {}/{} failed for floor {}: {}",
                        generator.generator_type(),
                        attempt,
                        attempts,
                        depth,
                        error
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CairnError::GenerationFailed(format!("No attempt made for floor {}", depth))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Actor, Fighter, Item};
    use uuid::Uuid;

    fn open_map() -> GameMap {
        let mut map = GameMap::new(10, 10, 1);
        for y in 1..9 {
            for x in 1..9 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        map
    }

    #[test]
    fn test_tile_templates() {
        assert!(TileType::Floor.is_walkable());
        assert!(!TileType::Wall.is_walkable());
        assert!(!TileType::Wall.is_transparent());
        assert!(TileType::DownStairs.is_walkable());
        assert_eq!(TileType::DownStairs.tile().light.glyph, '>');
    }

    #[test]
    fn test_set_tile_out_of_bounds_fails() {
        let mut map = GameMap::new(3, 3, 1);
        assert!(map.set_tile(Position::new(3, 0), TileType::Floor).is_err());
    }

    #[test]
    fn test_explored_accumulates_visible() {
        let mut map = open_map();
        map.update_fov(Position::new(1, 1), 2);
        assert!(map.is_visible(Position::new(2, 2)));
        assert!(!map.is_visible(Position::new(8, 8)));

        map.update_fov(Position::new(8, 8), 2);
        assert!(!map.is_visible(Position::new(2, 2)));
        assert!(map.is_explored(Position::new(2, 2)));
        assert!(map.is_explored(Position::new(8, 8)));
    }

    #[test]
    fn test_entity_queries() {
        let mut map = open_map();
        let mut orc = Entity::actor(
            Uuid::from_u128(1),
            "orc",
            'o',
            Color::WHITE,
            Actor::new(Fighter::new(10, 0, 3)).with_ai(crate::game::Ai::hostile()),
        );
        orc.position = Position::new(3, 3);
        let mut potion = Entity::item(Uuid::from_u128(2), "potion", '!', Color::WHITE, Item::default());
        potion.position = Position::new(3, 3);
        map.add_entity(orc);
        map.add_entity(potion);

        let spot = Position::new(3, 3);
        assert!(map.blocking_entity_at(spot).is_some());
        assert!(map.actor_at(spot).is_some());
        assert_eq!(map.items_at(spot).count(), 1);

        let grid = map.cost_grid();
        assert_eq!(grid.cost(spot), 1 + CROWD_PATH_PENALTY);
        assert_eq!(grid.cost(Position::new(0, 0)), 0);

        let removed = map.remove_entity(Uuid::from_u128(1)).unwrap();
        assert_eq!(removed.name, "orc");
        assert!(map.actor_at(spot).is_none());
    }
}

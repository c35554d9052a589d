//! # Display Snapshot
//!
//! Per-cell lighting state and visible entities, captured from a game state.

use crate::config;
use crate::game::{Color, EntityId, GameState, Message, Position, RenderOrder};
use crate::rendering::StatusReadout;
use crate::CairnResult;
use serde::{Deserialize, Serialize};

/// Colour of cells the player has never seen.
pub const SHROUD: Color = Color::new(0, 0, 0);

/// How much the player knows about a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellVisibility {
    /// In view now; drawn with the light graphic
    Visible,
    /// Seen before; drawn with the dark graphic
    Explored,
    /// Never seen
    Shroud,
}

/// One map cell as it should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellView {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
    pub visibility: CellVisibility,
}

impl CellView {
    fn shroud() -> Self {
        Self {
            glyph: ' ',
            fg: SHROUD,
            bg: SHROUD,
            visibility: CellVisibility::Shroud,
        }
    }
}

/// An entity standing on a visible cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub color: Color,
    pub position: Position,
    pub render_order: RenderOrder,
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub width: i32,
    pub height: i32,
    /// Row-major cell views
    pub cells: Vec<CellView>,
    /// Visible entities, lowest render order first
    pub entities: Vec<EntityView>,
    /// Newest messages, oldest first
    pub messages: Vec<Message>,
    pub status: StatusReadout,
}

impl RenderSnapshot {
    /// Captures the active floor as the player perceives it.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{CellVisibility, GameConfig, GameState, RenderSnapshot};
    ///
    /// let state = GameState::new_game(GameConfig::for_testing(2)).unwrap();
    /// let snapshot = RenderSnapshot::capture(&state).unwrap();
    /// let player = state.player_position().unwrap();
    /// assert_eq!(snapshot.cell(player).unwrap().visibility, CellVisibility::Visible);
    /// assert!(snapshot.entities.iter().any(|e| e.id == state.player_id));
    /// ```
    pub fn capture(state: &GameState) -> CairnResult<Self> {
        let map = state.map();
        let mut cells = Vec::with_capacity((map.width * map.height).max(0) as usize);
        for y in 0..map.height {
            for x in 0..map.width {
                let pos = Position::new(x, y);
                let view = match map.tile(pos) {
                    Some(tile) if map.is_visible(pos) => {
                        let graphic = tile.tile().light;
                        CellView {
                            glyph: graphic.glyph,
                            fg: graphic.fg,
                            bg: graphic.bg,
                            visibility: CellVisibility::Visible,
                        }
                    }
                    Some(tile) if map.is_explored(pos) => {
                        let graphic = tile.tile().dark;
                        CellView {
                            glyph: graphic.glyph,
                            fg: graphic.fg,
                            bg: graphic.bg,
                            visibility: CellVisibility::Explored,
                        }
                    }
                    _ => CellView::shroud(),
                };
                cells.push(view);
            }
        }

        let mut entities: Vec<EntityView> = map
            .entities
            .iter()
            .filter(|entity| map.is_visible(entity.position))
            .map(|entity| EntityView {
                id: entity.id,
                name: entity.name.clone(),
                glyph: entity.glyph,
                color: entity.color,
                position: entity.position,
                render_order: entity.render_order,
            })
            .collect();
        entities.sort_by_key(|entity| entity.render_order);

        Ok(Self {
            width: map.width,
            height: map.height,
            cells,
            entities,
            messages: state
                .message_log
                .recent(config::SNAPSHOT_MESSAGE_COUNT)
                .to_vec(),
            status: StatusReadout::from_state(state)?,
        })
    }

    pub fn cell(&self, pos: Position) -> Option<&CellView> {
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return None;
        }
        self.cells.get((pos.y * self.width + pos.x) as usize)
    }

    /// Plain-text frame: the map with entities drawn on top.
    pub fn to_ascii(&self) -> String {
        let mut rows: Vec<Vec<char>> = self
            .cells
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|cell| cell.glyph).collect())
            .collect();

        // Later entries have higher render order and win the cell.
        for entity in &self.entities {
            if let Some(cell) = rows
                .get_mut(entity.position.y as usize)
                .and_then(|row| row.get_mut(entity.position.x as usize))
            {
                *cell = entity.glyph;
            }
        }

        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{seeded_rng, GameMap, PrefabId, Prefabs, TileType};

    fn lit_room() -> GameState {
        let mut map = GameMap::new(20, 5, 1);
        for x in 1..19 {
            for y in 1..4 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        let prefabs = Prefabs::standard();
        let mut rng = seeded_rng(6);
        let mut player = prefabs.spawn_player(&mut rng).unwrap();
        player.position = Position::new(2, 2);
        let player_id = player.id;
        map.add_entity(player);
        GameState::from_map(map, player_id, 6).unwrap()
    }

    #[test]
    fn test_visibility_states() {
        let mut state = lit_room();
        let snapshot = RenderSnapshot::capture(&state).unwrap();
        assert_eq!(
            snapshot.cell(Position::new(3, 2)).unwrap().visibility,
            CellVisibility::Visible
        );
        assert_eq!(
            snapshot.cell(Position::new(17, 2)).unwrap().visibility,
            CellVisibility::Shroud
        );

        state.entity_mut(state.player_id).unwrap().position = Position::new(16, 2);
        state.update_fov();
        let snapshot = RenderSnapshot::capture(&state).unwrap();
        let remembered = snapshot.cell(Position::new(2, 2)).unwrap();
        assert_eq!(remembered.visibility, CellVisibility::Explored);
        assert_eq!(remembered.fg, TileType::Floor.tile().dark.fg);
    }

    #[test]
    fn test_entities_sorted_and_hidden_when_unseen() {
        let mut state = lit_room();
        state.spawn(PrefabId::HealthPotion, Position::new(4, 2)).unwrap();
        state.spawn(PrefabId::Orc, Position::new(5, 2)).unwrap();
        state.spawn(PrefabId::Orc, Position::new(17, 2)).unwrap();
        let snapshot = RenderSnapshot::capture(&state).unwrap();

        assert_eq!(snapshot.entities.len(), 3);
        assert_eq!(snapshot.entities[0].render_order, RenderOrder::Item);
        assert!(snapshot
            .entities
            .iter()
            .all(|entity| entity.position != Position::new(17, 2)));
    }

    #[test]
    fn test_ascii_dump() {
        let state = lit_room();
        let ascii = RenderSnapshot::capture(&state).unwrap().to_ascii();
        let rows: Vec<&str> = ascii.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].chars().nth(2), Some('@'));
        assert_eq!(rows[2].chars().nth(1), Some('.'));
        assert_eq!(rows[0].chars().nth(2), Some('#'));
    }
}

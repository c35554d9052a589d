//! # User Interface Elements
//!
//! Status readouts, the hp bar and inventory listings.

use crate::game::GameState;
use crate::CairnResult;
use serde::{Deserialize, Serialize};

/// Player vitals and progress shown beside the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReadout {
    pub hp: i32,
    pub max_hp: i32,
    pub level: u32,
    pub xp: u32,
    /// Experience needed for the next level
    pub xp_to_next: u32,
    pub depth: u32,
    pub turn: u64,
    pub power: i32,
    pub defense: i32,
}

impl StatusReadout {
    pub fn from_state(state: &GameState) -> CairnResult<Self> {
        let player = state.actor(state.player_id)?;
        Ok(Self {
            hp: player.fighter.hp(),
            max_hp: player.fighter.max_hp(),
            level: player.level.current_level,
            xp: player.level.current_xp,
            xp_to_next: player.level.experience_to_next_level(),
            depth: state.world.depth(),
            turn: state.turn_number,
            power: player.power(),
            defense: player.defense(),
        })
    }

    /// A text hp bar `width` cells wide.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::StatusReadout;
    ///
    /// let status = StatusReadout {
    ///     hp: 15, max_hp: 30, level: 1, xp: 0, xp_to_next: 350,
    ///     depth: 1, turn: 0, power: 5, defense: 2,
    /// };
    /// assert_eq!(status.hp_bar(10), "HP: 15/30 [#####     ]");
    /// ```
    pub fn hp_bar(&self, width: usize) -> String {
        let filled = if self.max_hp > 0 {
            (self.hp.max(0) as usize * width) / self.max_hp as usize
        } else {
            0
        };
        format!(
            "HP: {}/{} [{}{}]",
            self.hp,
            self.max_hp,
            "#".repeat(filled.min(width)),
            " ".repeat(width - filled.min(width))
        )
    }

    /// Multi-line summary for the status panel.
    pub fn lines(&self) -> Vec<String> {
        vec![
            self.hp_bar(20),
            format!("Level {}  XP {}/{}", self.level, self.xp, self.xp_to_next),
            format!("Power {}  Defense {}", self.power, self.defense),
            format!("Dungeon level {}  Turn {}", self.depth, self.turn),
        ]
    }
}

/// Numbered inventory lines, marking equipped items.
pub fn inventory_lines(state: &GameState) -> CairnResult<Vec<String>> {
    let player = state.actor(state.player_id)?;
    if player.inventory.items.is_empty() {
        return Ok(vec!["Inventory is empty.".to_string()]);
    }
    Ok(player
        .inventory
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            if player.equipment.is_equipped(item.id) {
                format!("{}) {} (E)", index, item.name)
            } else {
                format!("{}) {}", index, item.name)
            }
        })
        .collect())
}

/// Numbered spellbook lines.
pub fn spell_lines(state: &GameState) -> CairnResult<Vec<String>> {
    let player = state.actor(state.player_id)?;
    Ok(player
        .spellbook
        .spells
        .iter()
        .enumerate()
        .map(|(index, spell)| format!("{}) {}", index, spell.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EquipAction, Action, GameConfig, PrefabId, Position};

    #[test]
    fn test_status_from_new_game() {
        let state = GameState::new_game(GameConfig::for_testing(1)).unwrap();
        let status = StatusReadout::from_state(&state).unwrap();
        assert_eq!((status.hp, status.max_hp), (30, 30));
        assert_eq!(status.depth, 1);
        assert_eq!(status.lines().len(), 4);
        assert!(status.lines()[0].starts_with("HP: 30/30 [####"));
    }

    #[test]
    fn test_hp_bar_empty_when_dead() {
        let status = StatusReadout {
            hp: 0,
            max_hp: 30,
            level: 1,
            xp: 0,
            xp_to_next: 350,
            depth: 1,
            turn: 3,
            power: 5,
            defense: 2,
        };
        assert_eq!(status.hp_bar(4), "HP: 0/30 [    ]");
    }

    #[test]
    fn test_inventory_marks_equipped() {
        let mut state = GameState::new_game(GameConfig::for_testing(1)).unwrap();
        assert_eq!(inventory_lines(&state).unwrap(), vec!["Inventory is empty."]);

        let dagger = state
            .prefabs
            .spawn(PrefabId::Dagger, Position::origin(), &mut state.rng)
            .unwrap();
        let player = state.player_id;
        state.actor_mut(player).unwrap().inventory.items.push(dagger);
        EquipAction {
            actor: player,
            item_index: 0,
        }
        .perform(&mut state)
        .unwrap();
        assert_eq!(inventory_lines(&state).unwrap(), vec!["0) dagger (E)"]);
        assert_eq!(spell_lines(&state).unwrap(), vec!["0) Minor heal"]);
    }
}

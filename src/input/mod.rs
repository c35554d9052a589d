//! # Input Module
//!
//! Turns player intents into game actions.
//!
//! Intents are discrete and device independent: whatever reads keys or text
//! produces a [`PlayerIntent`], and [`InputHandler`] maps it onto a
//! [`ConcreteAction`]. Effects that need a tile first open a targeting
//! sub-mode; the next confirmed tile completes the action.

pub mod commands;

pub use commands::*;

use crate::game::{
    BumpAction, CastAction, ConcreteAction, ConsumeAction, DescendAction, Direction, DropAction,
    EquipAction, GameState, PickUpAction, Position, TargetMode, WaitAction,
};
use crate::CairnResult;
use crate::EntityId;

/// Prompt shown when an effect is waiting for a tile.
pub const TARGET_PROMPT: &str = "Select a target location.";

/// Player input types that can be processed by the input handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerIntent {
    /// Step or attack in a direction
    Move(Direction),
    Wait,
    PickUp,
    Drop(usize),
    /// Use an inventory item
    Use(usize),
    /// Equip or unequip an inventory item
    Equip(usize),
    Cast(usize),
    Descend,
    /// Pick the tile for the pending targeted effect
    ConfirmTarget(Position),
    /// Leave the targeting sub-mode
    Cancel,
    /// Describe what stands on a tile; takes no time
    LookAt(Position),
}

/// Where a targeted effect comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Inventory index of a consumable
    Item(usize),
    /// Spellbook index
    Spell(usize),
}

/// A targeted effect waiting for the player to choose a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTargeting {
    pub actor: EntityId,
    pub source: TargetSource,
    pub mode: TargetMode,
}

impl PendingTargeting {
    /// Builds the action that uses the effect on `target`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{ConcreteAction, PendingTargeting, Position, TargetMode, TargetSource};
    /// use uuid::Uuid;
    ///
    /// let pending = PendingTargeting {
    ///     actor: Uuid::nil(),
    ///     source: TargetSource::Item(2),
    ///     mode: TargetMode::Single,
    /// };
    /// match pending.confirm(Position::new(4, 4)) {
    ///     ConcreteAction::Consume(consume) => {
    ///         assert_eq!(consume.item_index, 2);
    ///         assert_eq!(consume.target, Some(Position::new(4, 4)));
    ///     }
    ///     other => panic!("unexpected {:?}", other),
    /// }
    /// ```
    pub fn confirm(&self, target: Position) -> ConcreteAction {
        match self.source {
            TargetSource::Item(item_index) => ConcreteAction::Consume(ConsumeAction {
                actor: self.actor,
                item_index,
                target: Some(target),
            }),
            TargetSource::Spell(spell_index) => ConcreteAction::Cast(CastAction {
                actor: self.actor,
                spell_index,
                target: Some(target),
            }),
        }
    }

    /// Tiles the effect would touch if confirmed at `target`.
    pub fn affected_area(&self, target: Position) -> Vec<Position> {
        match self.mode {
            TargetMode::Single => vec![target],
            TargetMode::Area { radius } => ((target.y - radius)..=(target.y + radius))
                .flat_map(|y| ((target.x - radius)..=(target.x + radius)).map(move |x| Position::new(x, y)))
                .filter(|pos| pos.euclidean_distance(target) <= radius as f64)
                .collect(),
        }
    }
}

/// What an intent resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResolution {
    /// Perform this action
    Act(ConcreteAction),
    /// Targeting started; the next intent should confirm a tile
    NeedsTarget,
    /// Targeting was abandoned
    Cancelled,
    /// Nothing happens in the dungeon; show this text instead
    Described(String),
    /// The intent makes no sense right now
    Invalid(String),
}

/// Input handler for processing player intents.
///
/// Holds the targeting sub-mode between intents.
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    targeting: Option<PendingTargeting>,
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::InputHandler;
    ///
    /// let input_handler = InputHandler::new();
    /// assert!(input_handler.targeting().is_none());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// The targeted effect waiting for a tile, if any.
    pub fn targeting(&self) -> Option<&PendingTargeting> {
        self.targeting.as_ref()
    }

    /// Converts an intent into an action for the player of `game_state`.
    pub fn resolve(
        &mut self,
        intent: PlayerIntent,
        game_state: &GameState,
    ) -> CairnResult<InputResolution> {
        let actor = game_state.player_id;

        // Looking around leaves a pending target selection untouched.
        if let PlayerIntent::LookAt(pos) = intent {
            return Ok(InputResolution::Described(game_state.look_at(pos)));
        }

        if let Some(pending) = self.targeting.take() {
            match intent {
                PlayerIntent::ConfirmTarget(target) => {
                    return Ok(InputResolution::Act(pending.confirm(target)));
                }
                PlayerIntent::Cancel => return Ok(InputResolution::Cancelled),
                _ => log::debug!("Targeting abandoned for {:?}", intent),
            }
        }

        let action = match intent {
            PlayerIntent::Move(direction) => ConcreteAction::Bump(BumpAction { actor, direction }),
            PlayerIntent::Wait => ConcreteAction::Wait(WaitAction { actor }),
            PlayerIntent::PickUp => ConcreteAction::PickUp(PickUpAction { actor }),
            PlayerIntent::Drop(item_index) => ConcreteAction::Drop(DropAction { actor, item_index }),
            PlayerIntent::Equip(item_index) => {
                ConcreteAction::Equip(EquipAction { actor, item_index })
            }
            PlayerIntent::Descend => ConcreteAction::Descend(DescendAction { actor }),
            PlayerIntent::Use(item_index) => {
                let player = game_state.actor(actor)?;
                let mode = player
                    .inventory
                    .get(item_index)
                    .and_then(|item| item.as_item())
                    .and_then(|item| item.consumable)
                    .and_then(|effect| effect.targeting());
                if let Some(mode) = mode {
                    return Ok(self.start_targeting(actor, TargetSource::Item(item_index), mode));
                }
                ConcreteAction::Consume(ConsumeAction {
                    actor,
                    item_index,
                    target: None,
                })
            }
            PlayerIntent::Cast(spell_index) => {
                let player = game_state.actor(actor)?;
                let mode = player
                    .spellbook
                    .spells
                    .get(spell_index)
                    .and_then(|spell| spell.effect.targeting());
                if let Some(mode) = mode {
                    return Ok(self.start_targeting(actor, TargetSource::Spell(spell_index), mode));
                }
                ConcreteAction::Cast(CastAction {
                    actor,
                    spell_index,
                    target: None,
                })
            }
            PlayerIntent::ConfirmTarget(_) => {
                return Ok(InputResolution::Invalid(
                    "There is nothing to target.".to_string(),
                ))
            }
            PlayerIntent::Cancel => return Ok(InputResolution::Cancelled),
            PlayerIntent::LookAt(pos) => {
                return Ok(InputResolution::Described(game_state.look_at(pos)))
            }
        };
        Ok(InputResolution::Act(action))
    }

    fn start_targeting(
        &mut self,
        actor: EntityId,
        source: TargetSource,
        mode: TargetMode,
    ) -> InputResolution {
        self.targeting = Some(PendingTargeting {
            actor,
            source,
            mode,
        });
        InputResolution::NeedsTarget
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{seeded_rng, GameMap, PrefabId, Prefabs, TileType};

    fn state_with(items: &[PrefabId]) -> GameState {
        let mut map = GameMap::new(8, 8, 1);
        for y in 1..7 {
            for x in 1..7 {
                map.set_tile(Position::new(x, y), TileType::Floor).unwrap();
            }
        }
        let prefabs = Prefabs::standard();
        let mut rng = seeded_rng(2);
        let mut player = prefabs.spawn_player(&mut rng).unwrap();
        player.position = Position::new(3, 3);
        if let Some(actor) = player.as_actor_mut() {
            for id in items {
                let item = prefabs.spawn(*id, Position::origin(), &mut rng).unwrap();
                actor.inventory.items.push(item);
            }
        }
        let player_id = player.id;
        map.add_entity(player);
        GameState::from_map(map, player_id, 2).unwrap()
    }

    #[test]
    fn test_move_becomes_bump() {
        let state = state_with(&[]);
        let mut handler = InputHandler::new();
        let resolution = handler
            .resolve(PlayerIntent::Move(Direction::East), &state)
            .unwrap();
        assert_eq!(
            resolution,
            InputResolution::Act(ConcreteAction::Bump(BumpAction {
                actor: state.player_id,
                direction: Direction::East,
            }))
        );
    }

    #[test]
    fn test_untargeted_item_acts_immediately() {
        let state = state_with(&[PrefabId::HealthPotion]);
        let mut handler = InputHandler::new();
        let resolution = handler.resolve(PlayerIntent::Use(0), &state).unwrap();
        assert!(matches!(
            resolution,
            InputResolution::Act(ConcreteAction::Consume(ConsumeAction { target: None, .. }))
        ));
        assert!(handler.targeting().is_none());
    }

    #[test]
    fn test_targeted_item_waits_for_tile() {
        let state = state_with(&[PrefabId::HealthPotion, PrefabId::FireballScroll]);
        let mut handler = InputHandler::new();
        assert_eq!(
            handler.resolve(PlayerIntent::Use(1), &state).unwrap(),
            InputResolution::NeedsTarget
        );
        assert_eq!(
            handler.targeting().map(|pending| pending.mode),
            Some(TargetMode::Area { radius: 3 })
        );

        let target = Position::new(5, 5);
        let resolution = handler
            .resolve(PlayerIntent::ConfirmTarget(target), &state)
            .unwrap();
        assert_eq!(
            resolution,
            InputResolution::Act(ConcreteAction::Consume(ConsumeAction {
                actor: state.player_id,
                item_index: 1,
                target: Some(target),
            }))
        );
        assert!(handler.targeting().is_none());
    }

    #[test]
    fn test_cancel_and_stray_confirm() {
        let state = state_with(&[PrefabId::ConfusionScroll]);
        let mut handler = InputHandler::new();
        handler.resolve(PlayerIntent::Use(0), &state).unwrap();
        assert_eq!(
            handler.resolve(PlayerIntent::Cancel, &state).unwrap(),
            InputResolution::Cancelled
        );
        assert!(matches!(
            handler
                .resolve(PlayerIntent::ConfirmTarget(Position::new(1, 1)), &state)
                .unwrap(),
            InputResolution::Invalid(_)
        ));
    }

    #[test]
    fn test_look_at_describes_without_acting() {
        let mut state = state_with(&[PrefabId::FireballScroll]);
        state.spawn(PrefabId::Orc, Position::new(4, 3)).unwrap();
        state.update_fov();
        let ticks = state.ticker.ticks();
        let mut handler = InputHandler::new();

        assert_eq!(
            handler
                .resolve(PlayerIntent::LookAt(Position::new(4, 3)), &state)
                .unwrap(),
            InputResolution::Described("orc".to_string())
        );
        assert_eq!(
            handler
                .resolve(PlayerIntent::LookAt(Position::new(40, 40)), &state)
                .unwrap(),
            InputResolution::Described("You cannot see that.".to_string())
        );

        handler.resolve(PlayerIntent::Use(0), &state).unwrap();
        handler
            .resolve(PlayerIntent::LookAt(Position::new(5, 5)), &state)
            .unwrap();
        assert!(handler.targeting().is_some());
        assert_eq!(state.ticker.ticks(), ticks);
        assert_eq!(state.turn_number, 0);
    }

    #[test]
    fn test_area_footprint() {
        let pending = PendingTargeting {
            actor: uuid::Uuid::nil(),
            source: TargetSource::Spell(0),
            mode: TargetMode::Area { radius: 1 },
        };
        let area = pending.affected_area(Position::new(2, 2));
        assert_eq!(area.len(), 5);
        assert!(area.contains(&Position::new(2, 1)));
        assert!(!area.contains(&Position::new(1, 1)));
    }
}

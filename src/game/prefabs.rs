//! # Prefab Registry
//!
//! Read-only entity templates, cloned by value on spawn.

use crate::game::{
    new_entity_id, Actor, Ai, Color, Effect, Entity, EntityKind, EquipmentSlot, Equippable,
    Fighter, Item, Level, Position, Spell, StatBonus,
};
use crate::{config, CairnError, CairnResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identifiers for every template in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrefabId {
    Player,
    Orc,
    Troll,
    HealthPotion,
    LightningScroll,
    ConfusionScroll,
    FireballScroll,
    Dagger,
    LeatherArmor,
}

/// Template registry populated once at startup.
#[derive(Debug, Clone)]
pub struct Prefabs {
    templates: BTreeMap<PrefabId, Entity>,
}

impl Default for Prefabs {
    fn default() -> Self {
        Self::standard()
    }
}

impl Prefabs {
    /// Builds the standard set of templates.
    pub fn standard() -> Self {
        let mut templates = BTreeMap::new();
        let nil = Uuid::nil();

        templates.insert(
            PrefabId::Player,
            Entity::actor(
                nil,
                "Player",
                '@',
                Color::WHITE,
                Actor::new(Fighter::new(30, 2, 5))
                    .with_ai(Ai::Player)
                    .with_inventory(config::PLAYER_INVENTORY_CAPACITY)
                    .with_level(Level::progressing(200))
                    .with_speed(10),
            ),
        );
        templates.insert(
            PrefabId::Orc,
            Entity::actor(
                nil,
                "orc",
                'o',
                Color::new(63, 127, 63),
                Actor::new(Fighter::new(10, 0, 3))
                    .with_ai(Ai::hostile())
                    .with_level(Level::worth(35))
                    .with_speed(10),
            ),
        );
        templates.insert(
            PrefabId::Troll,
            Entity::actor(
                nil,
                "troll",
                'T',
                Color::new(0, 127, 0),
                Actor::new(Fighter::new(16, 1, 4))
                    .with_ai(Ai::hostile())
                    .with_level(Level::worth(100))
                    .with_speed(11),
            ),
        );

        let consumable = |effect| Item {
            consumable: Some(effect),
            equippable: None,
        };
        templates.insert(
            PrefabId::HealthPotion,
            Entity::item(
                nil,
                "health potion",
                '!',
                Color::new(127, 0, 255),
                consumable(Effect::Healing { amount: 10 }),
            ),
        );
        templates.insert(
            PrefabId::LightningScroll,
            Entity::item(
                nil,
                "scroll of lightning",
                '~',
                Color::new(255, 255, 0),
                consumable(Effect::Lightning {
                    damage: 20,
                    max_range: 5,
                }),
            ),
        );
        templates.insert(
            PrefabId::ConfusionScroll,
            Entity::item(
                nil,
                "scroll of confusion",
                '~',
                Color::new(207, 63, 255),
                consumable(Effect::Confusion { turns: 10 }),
            ),
        );
        templates.insert(
            PrefabId::FireballScroll,
            Entity::item(
                nil,
                "scroll of fireball",
                '~',
                Color::new(255, 0, 0),
                consumable(Effect::Fireball {
                    damage: 12,
                    radius: 3,
                }),
            ),
        );

        let gear = |slot, bonus| Item {
            consumable: None,
            equippable: Some(Equippable { slot, bonus }),
        };
        templates.insert(
            PrefabId::Dagger,
            Entity::item(
                nil,
                "dagger",
                '/',
                Color::new(0, 191, 255),
                gear(
                    EquipmentSlot::Weapon,
                    StatBonus {
                        power: 1,
                        ..StatBonus::default()
                    },
                ),
            ),
        );
        templates.insert(
            PrefabId::LeatherArmor,
            Entity::item(
                nil,
                "leather armor",
                '[',
                Color::new(139, 69, 19),
                gear(
                    EquipmentSlot::BodyArmor,
                    StatBonus {
                        defense: 1,
                        ..StatBonus::default()
                    },
                ),
            ),
        );

        Self { templates }
    }

    pub fn template(&self, id: PrefabId) -> Option<&Entity> {
        self.templates.get(&id)
    }

    /// Clones a template under a fresh id at `position`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{seeded_rng, Position, PrefabId, Prefabs};
    ///
    /// let prefabs = Prefabs::standard();
    /// let mut rng = seeded_rng(1);
    /// let orc = prefabs.spawn(PrefabId::Orc, Position::new(4, 2), &mut rng).unwrap();
    /// assert_eq!(orc.name, "orc");
    /// assert_eq!(orc.position, Position::new(4, 2));
    /// assert!(!orc.id.is_nil());
    /// ```
    pub fn spawn<R: Rng + ?Sized>(&self, id: PrefabId, position: Position, rng: &mut R) -> CairnResult<Entity> {
        let template = self
            .template(id)
            .ok_or_else(|| CairnError::InvalidState(format!("Missing prefab {:?}", id)))?;
        Ok(template.spawn_copy(new_entity_id(rng), position))
    }

    /// Spawns the player, who starts out knowing Minor heal.
    pub fn spawn_player<R: Rng + ?Sized>(&self, rng: &mut R) -> CairnResult<Entity> {
        let mut player = self.spawn(PrefabId::Player, Position::origin(), rng)?;
        if let EntityKind::Actor(actor) = &mut player.kind {
            actor.spellbook.learn(minor_heal());
        }
        Ok(player)
    }
}

/// The starting healing spell.
pub fn minor_heal() -> Spell {
    Spell {
        name: "Minor heal".to_string(),
        effect: Effect::Healing { amount: 5 },
    }
}

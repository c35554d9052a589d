//! # Action System
//!
//! Every change to maps and entities goes through an [`Action`].
//!
//! Actions are small value types carrying the id of the acting entity and
//! whatever parameters they need. Performing one against a [`GameState`]
//! either succeeds with a list of [`GameEvent`]s, or fails:
//!
//! - [`ActionError::Impossible`] means the attempt was rejected. Nothing
//!   changed and no turn was spent.
//! - [`ActionError::Fatal`] means the game state is broken and play must stop.

use crate::game::{
    capitalize, resolve_melee, Ai, AttackOutcome, Direction, Effect, EntityId, EquipmentSlot,
    GameState, MessageKind, Position, RngDice,
};
use crate::{CairnError, CairnResult};
use serde::{Deserialize, Serialize};

/// Something that happened while performing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Human-readable text for the message log
    Message { text: String, kind: MessageKind },
    EntityMoved {
        entity_id: EntityId,
        from: Position,
        to: Position,
    },
    EntityDamaged {
        entity_id: EntityId,
        damage: i32,
        source: Option<EntityId>,
    },
    EntityHealed {
        entity_id: EntityId,
        amount: i32,
    },
    EntityDied {
        entity_id: EntityId,
        killer: Option<EntityId>,
    },
    ItemPickedUp {
        actor: EntityId,
        item: EntityId,
    },
    ItemDropped {
        actor: EntityId,
        item: EntityId,
    },
    ItemConsumed {
        actor: EntityId,
        item: EntityId,
    },
    ItemEquipped {
        actor: EntityId,
        item: EntityId,
        slot: EquipmentSlot,
    },
    ItemUnequipped {
        actor: EntityId,
        item: EntityId,
    },
    ExperienceGained {
        entity_id: EntityId,
        amount: u32,
    },
    FloorDescended {
        depth: u32,
    },
}

impl GameEvent {
    pub fn message(text: impl Into<String>, kind: MessageKind) -> Self {
        GameEvent::Message {
            text: text.into(),
            kind,
        }
    }
}

/// Why an action did not happen.
#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    /// Rejected without side effects; the actor keeps its turn
    #[error("{reason}")]
    Impossible { reason: String },

    /// The game state is inconsistent
    #[error(transparent)]
    Fatal(#[from] CairnError),
}

impl ActionError {
    pub fn impossible(reason: impl Into<String>) -> Self {
        ActionError::Impossible {
            reason: reason.into(),
        }
    }

    pub fn is_impossible(&self) -> bool {
        matches!(self, ActionError::Impossible { .. })
    }
}

/// Outcome of performing an action.
pub type ActionResult = Result<Vec<GameEvent>, ActionError>;

/// A single attempt by one entity to change the game.
pub trait Action {
    /// The entity performing the action.
    fn actor(&self) -> EntityId;

    /// Short name used in logs.
    fn action_type(&self) -> &'static str;

    /// Applies the action to `state`.
    fn perform(&self, state: &mut GameState) -> ActionResult;
}

/// Does nothing for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitAction {
    pub actor: EntityId,
}

impl Action for WaitAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "wait"
    }

    fn perform(&self, _state: &mut GameState) -> ActionResult {
        Ok(Vec::new())
    }
}

/// Steps one tile in a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAction {
    pub actor: EntityId,
    pub direction: Direction,
}

impl Action for MoveAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "move"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let from = state.entity(self.actor)?.position;
        let to = from + self.direction.to_delta();

        let map = state.map();
        if !map.is_walkable(to) || map.blocking_entity_at(to).is_some() {
            return Err(ActionError::impossible("That way is blocked."));
        }

        state.entity_mut(self.actor)?.position = to;
        Ok(vec![GameEvent::EntityMoved {
            entity_id: self.actor,
            from,
            to,
        }])
    }
}

/// Attacks a living actor in the given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeleeAction {
    pub actor: EntityId,
    pub direction: Direction,
}

impl Action for MeleeAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "melee"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let origin = state.entity(self.actor)?.position;
        let target_position = origin + self.direction.to_delta();
        let target_id = state
            .map()
            .actor_at(target_position)
            .map(|entity| entity.id)
            .ok_or_else(|| ActionError::impossible("There is nothing to attack."))?;

        let map = &state.world.current;
        let attacker = map
            .entity(self.actor)
            .ok_or(CairnError::EntityNotFound(self.actor))?;
        let defender = map
            .entity(target_id)
            .ok_or(CairnError::EntityNotFound(target_id))?;
        let attacker_name = capitalize(&attacker.name);
        let defender_name = defender.name.clone();
        let result = match (attacker.as_actor(), defender.as_actor()) {
            (Some(a), Some(d)) => resolve_melee(a, d, &mut RngDice(&mut state.rng)),
            _ => {
                return Err(CairnError::InvalidState(format!(
                    "{} cannot fight {}",
                    attacker_name, defender_name
                ))
                .into())
            }
        };

        let description = format!("{} attacks {}", attacker_name, defender_name);
        let text = match result.outcome {
            AttackOutcome::Miss => format!("{} but misses.", description),
            AttackOutcome::Critical if result.damage > 0 => format!(
                "{} critically hits {} for {} hit points!",
                attacker_name, defender_name, result.damage
            ),
            _ if result.damage > 0 => format!("{} for {} hit points.", description, result.damage),
            _ => format!("{} but does no damage.", description),
        };

        let mut events = vec![GameEvent::message(text, attack_kind(state, self.actor))];
        if result.damage > 0 {
            events.extend(apply_damage(state, target_id, result.damage, Some(self.actor))?);
        }
        Ok(events)
    }
}

/// Attacks whatever stands in the way, otherwise moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BumpAction {
    pub actor: EntityId,
    pub direction: Direction,
}

impl Action for BumpAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "bump"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let target = state.entity(self.actor)?.position + self.direction.to_delta();
        if state.map().actor_at(target).is_some() {
            MeleeAction {
                actor: self.actor,
                direction: self.direction,
            }
            .perform(state)
        } else {
            MoveAction {
                actor: self.actor,
                direction: self.direction,
            }
            .perform(state)
        }
    }
}

/// Picks up the first item on the actor's tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickUpAction {
    pub actor: EntityId,
}

impl Action for PickUpAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "pickup"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let position = state.entity(self.actor)?.position;
        let item_id = state
            .map()
            .items_at(position)
            .next()
            .map(|item| item.id)
            .ok_or_else(|| ActionError::impossible("There is nothing here to pick up."))?;

        if state.actor(self.actor)?.inventory.is_full() {
            return Err(ActionError::impossible("Your inventory is full."));
        }

        let item = state
            .map_mut()
            .remove_entity(item_id)
            .ok_or(CairnError::EntityNotFound(item_id))?;
        let text = format!("You pick up the {}.", item.name);
        state.actor_mut(self.actor)?.inventory.items.push(item);

        Ok(vec![
            GameEvent::message(text, MessageKind::Normal),
            GameEvent::ItemPickedUp {
                actor: self.actor,
                item: item_id,
            },
        ])
    }
}

/// Drops an inventory item onto the actor's tile, unequipping it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropAction {
    pub actor: EntityId,
    pub item_index: usize,
}

impl Action for DropAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "drop"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let position = state.entity(self.actor)?.position;
        let owner = state.actor_mut(self.actor)?;
        let (item_id, name) = owner
            .inventory
            .get(self.item_index)
            .map(|item| (item.id, item.name.clone()))
            .ok_or_else(|| ActionError::impossible("You do not have that item."))?;

        let mut events = Vec::new();
        if owner.equipment.unequip(item_id).is_some() {
            events.push(GameEvent::message(
                format!("You remove the {}.", name),
                MessageKind::Normal,
            ));
            events.push(GameEvent::ItemUnequipped {
                actor: self.actor,
                item: item_id,
            });
        }

        let mut item = owner
            .inventory
            .take(self.item_index)
            .ok_or(CairnError::EntityNotFound(item_id))?;
        item.position = position;
        state.map_mut().add_entity(item);

        events.push(GameEvent::message(
            format!("You dropped the {}.", name),
            MessageKind::Normal,
        ));
        events.push(GameEvent::ItemDropped {
            actor: self.actor,
            item: item_id,
        });
        Ok(events)
    }
}

/// Equips an inventory item, or takes it off if already worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipAction {
    pub actor: EntityId,
    pub item_index: usize,
}

impl Action for EquipAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "equip"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let owner = state.actor_mut(self.actor)?;
        let (item_id, name, equippable) = owner
            .inventory
            .get(self.item_index)
            .map(|item| {
                (
                    item.id,
                    item.name.clone(),
                    item.as_item().and_then(|i| i.equippable),
                )
            })
            .ok_or_else(|| ActionError::impossible("You do not have that item."))?;
        let equippable = equippable
            .ok_or_else(|| ActionError::impossible("You cannot equip this item."))?;

        let mut events = Vec::new();
        if owner.equipment.is_equipped(item_id) {
            owner.equipment.unequip(item_id);
            events.push(GameEvent::message(
                format!("You remove the {}.", name),
                MessageKind::Normal,
            ));
            events.push(GameEvent::ItemUnequipped {
                actor: self.actor,
                item: item_id,
            });
            return Ok(events);
        }

        if let Some(previous) = owner.equipment.equip(equippable.slot, item_id) {
            let previous_name = owner
                .inventory
                .index_of(previous)
                .and_then(|index| owner.inventory.get(index))
                .map(|item| item.name.clone())
                .unwrap_or_default();
            events.push(GameEvent::message(
                format!("You remove the {}.", previous_name),
                MessageKind::Normal,
            ));
            events.push(GameEvent::ItemUnequipped {
                actor: self.actor,
                item: previous,
            });
        }
        events.push(GameEvent::message(
            format!("You equip the {}.", name),
            MessageKind::Normal,
        ));
        events.push(GameEvent::ItemEquipped {
            actor: self.actor,
            item: item_id,
            slot: equippable.slot,
        });
        Ok(events)
    }
}

/// Uses a consumable item. The item is only spent if the effect succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeAction {
    pub actor: EntityId,
    pub item_index: usize,
    /// Chosen tile for targeted effects
    pub target: Option<Position>,
}

impl Action for ConsumeAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "consume"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let (item_id, name, effect) = state
            .actor(self.actor)?
            .inventory
            .get(self.item_index)
            .map(|item| {
                (
                    item.id,
                    item.name.clone(),
                    item.as_item().and_then(|i| i.consumable),
                )
            })
            .ok_or_else(|| ActionError::impossible("You do not have that item."))?;
        let effect =
            effect.ok_or_else(|| ActionError::impossible(format!("The {} cannot be used.", name)))?;

        let mut events = apply_effect(state, self.actor, effect, EffectSource::Item(&name), self.target)?;

        let owner = state.actor_mut(self.actor)?;
        if let Some(index) = owner.inventory.index_of(item_id) {
            owner.equipment.unequip(item_id);
            owner.inventory.take(index);
        }
        events.push(GameEvent::ItemConsumed {
            actor: self.actor,
            item: item_id,
        });
        Ok(events)
    }
}

/// Casts a known spell. Spells are never used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastAction {
    pub actor: EntityId,
    pub spell_index: usize,
    pub target: Option<Position>,
}

impl Action for CastAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "cast"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        let spell = state
            .actor(self.actor)?
            .spellbook
            .spells
            .get(self.spell_index)
            .cloned()
            .ok_or_else(|| ActionError::impossible("You do not know that spell."))?;
        apply_effect(
            state,
            self.actor,
            spell.effect,
            EffectSource::Spell(&spell.name),
            self.target,
        )
    }
}

/// Takes the down staircase under the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescendAction {
    pub actor: EntityId,
}

impl Action for DescendAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn action_type(&self) -> &'static str {
        "descend"
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        if self.actor != state.player_id {
            return Err(ActionError::impossible("Only the player can take the stairs."));
        }
        let position = state.entity(self.actor)?.position;
        if position != state.map().downstairs {
            return Err(ActionError::impossible("There are no stairs here."));
        }
        Ok(state.descend_floor()?)
    }
}

/// Closed set of every action, so actions can be stored and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcreteAction {
    Wait(WaitAction),
    Move(MoveAction),
    Bump(BumpAction),
    Melee(MeleeAction),
    PickUp(PickUpAction),
    Drop(DropAction),
    Equip(EquipAction),
    Consume(ConsumeAction),
    Cast(CastAction),
    Descend(DescendAction),
}

impl ConcreteAction {
    fn inner(&self) -> &dyn Action {
        match self {
            ConcreteAction::Wait(action) => action,
            ConcreteAction::Move(action) => action,
            ConcreteAction::Bump(action) => action,
            ConcreteAction::Melee(action) => action,
            ConcreteAction::PickUp(action) => action,
            ConcreteAction::Drop(action) => action,
            ConcreteAction::Equip(action) => action,
            ConcreteAction::Consume(action) => action,
            ConcreteAction::Cast(action) => action,
            ConcreteAction::Descend(action) => action,
        }
    }
}

impl Action for ConcreteAction {
    fn actor(&self) -> EntityId {
        self.inner().actor()
    }

    fn action_type(&self) -> &'static str {
        self.inner().action_type()
    }

    fn perform(&self, state: &mut GameState) -> ActionResult {
        self.inner().perform(state)
    }
}

fn attack_kind(state: &GameState, attacker: EntityId) -> MessageKind {
    if attacker == state.player_id {
        MessageKind::PlayerAttack
    } else {
        MessageKind::EnemyAttack
    }
}

/// Damages `target`, handling death and experience for the killer.
pub(crate) fn apply_damage(
    state: &mut GameState,
    target: EntityId,
    amount: i32,
    source: Option<EntityId>,
) -> CairnResult<Vec<GameEvent>> {
    let is_player = target == state.player_id;
    let entity = state.entity_mut(target)?;
    let name = entity.name.clone();
    let actor = entity
        .as_actor_mut()
        .ok_or_else(|| CairnError::InvalidState(format!("{} cannot take damage", name)))?;

    let damage = actor.fighter.take_damage(amount);
    let dead = actor.fighter.is_dead();
    let xp = actor.level.xp_given;

    let mut events = vec![GameEvent::EntityDamaged {
        entity_id: target,
        damage,
        source,
    }];
    if dead && entity.is_alive() {
        let kind = if is_player {
            MessageKind::PlayerDeath
        } else {
            MessageKind::EnemyDeath
        };
        events.push(GameEvent::message(entity.die(is_player), kind));
        events.push(GameEvent::EntityDied {
            entity_id: target,
            killer: source,
        });
        if let Some(killer) = source {
            events.extend(award_experience(state, killer, xp));
        }
    }
    Ok(events)
}

fn award_experience(state: &mut GameState, recipient: EntityId, xp: u32) -> Vec<GameEvent> {
    let Ok(actor) = state.actor_mut(recipient) else {
        return Vec::new();
    };
    if !actor.level.add_experience(xp) {
        return Vec::new();
    }

    let mut events = vec![
        GameEvent::ExperienceGained {
            entity_id: recipient,
            amount: xp,
        },
        GameEvent::message(format!("You gain {} experience points.", xp), MessageKind::Normal),
    ];
    if actor.level.requires_level_up() {
        events.push(GameEvent::message("You feel more experienced.", MessageKind::Normal));
    }
    events
}

enum EffectSource<'a> {
    Item(&'a str),
    Spell(&'a str),
}

fn apply_effect(
    state: &mut GameState,
    caster: EntityId,
    effect: Effect,
    source: EffectSource<'_>,
    target: Option<Position>,
) -> ActionResult {
    let kind = attack_kind(state, caster);
    match effect {
        Effect::Healing { amount } => {
            let recovered = state.actor_mut(caster)?.fighter.heal(amount);
            if recovered == 0 {
                return Err(ActionError::impossible("You are already at full health."));
            }
            let text = match source {
                EffectSource::Item(name) => {
                    format!("You consume the {} and recover {} hit points.", name, recovered)
                }
                EffectSource::Spell(name) => {
                    format!("You cast {} and recover {} hit points.", name, recovered)
                }
            };
            Ok(vec![
                GameEvent::message(text, MessageKind::HealthRecovered),
                GameEvent::EntityHealed {
                    entity_id: caster,
                    amount: recovered,
                },
            ])
        }
        Effect::Lightning { damage, max_range } => {
            let origin = state.entity(caster)?.position;
            let map = state.map();
            let mut closest = None;
            let mut closest_distance = max_range as f64 + 1.0;
            for entity in map.actors() {
                if entity.id == caster || !map.is_visible(entity.position) {
                    continue;
                }
                let distance = origin.euclidean_distance(entity.position);
                if distance < closest_distance {
                    closest = Some((entity.id, entity.name.clone()));
                    closest_distance = distance;
                }
            }
            let (target_id, name) = closest
                .ok_or_else(|| ActionError::impossible("No enemy is close enough to strike."))?;

            let mut events = vec![GameEvent::message(
                format!(
                    "A bolt of lightning strikes the {} with a loud thunder, dealing {} damage.",
                    name, damage
                ),
                kind,
            )];
            events.extend(apply_damage(state, target_id, damage, Some(caster))?);
            Ok(events)
        }
        Effect::Confusion { turns } => {
            let target = visible_target(state, target)?;
            let (target_id, name) = state
                .map()
                .actor_at(target)
                .map(|entity| (entity.id, entity.name.clone()))
                .ok_or_else(|| ActionError::impossible("You must select an enemy to target."))?;
            if target_id == caster {
                return Err(ActionError::impossible("Why would you want to do that?"));
            }

            let actor = state.actor_mut(target_id)?;
            if let Some(previous) = actor.ai.take() {
                actor.ai = Some(Ai::confused(previous, turns));
            }
            Ok(vec![GameEvent::message(
                format!(
                    "The eyes of the {} look vacant as they start to stumble around.",
                    name
                ),
                MessageKind::StatusEffectApplied,
            )])
        }
        Effect::Fireball { damage, radius } => {
            let target = visible_target(state, target)?;
            let victims: Vec<(EntityId, String)> = state
                .map()
                .actors()
                .filter(|entity| entity.position.euclidean_distance(target) <= radius as f64)
                .map(|entity| (entity.id, entity.name.clone()))
                .collect();
            if victims.is_empty() {
                return Err(ActionError::impossible("There are no targets in the radius."));
            }

            let mut events = Vec::new();
            for (victim, name) in victims {
                events.push(GameEvent::message(
                    format!(
                        "The {} is engulfed in a fiery explosion, taking {} damage.",
                        name, damage
                    ),
                    kind,
                ));
                events.extend(apply_damage(state, victim, damage, Some(caster))?);
            }
            Ok(events)
        }
    }
}

fn visible_target(state: &GameState, target: Option<Position>) -> Result<Position, ActionError> {
    let target = target.ok_or_else(|| ActionError::impossible("You must select a target."))?;
    if !state.map().is_visible(target) {
        return Err(ActionError::impossible(
            "You cannot target an area that you cannot see.",
        ));
    }
    Ok(target)
}

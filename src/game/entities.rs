//! # Entity Model
//!
//! Actors and items built by composition.
//!
//! Every entity shares an identity block (id, name, position, glyph, colour,
//! movement blocking, render order) and carries exactly one kind: an [`Actor`]
//! owning its fighter, skills, inventory, equipment, level, energy, spellbook
//! and AI, or an [`Item`] with an optional single-use effect and an optional
//! equippable descriptor.
//!
//! Equipment bonuses are computed on the owning [`Actor`] from the items in
//! its own inventory, so no component ever needs a pointer back to its owner.

use crate::game::{Ai, Color, EntityId, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Draw priority. Lower values are drawn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderOrder {
    Corpse,
    Item,
    Actor,
}

/// A game object placed on a map or held in an inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub position: Position,
    pub glyph: char,
    pub color: Color,
    pub blocks_movement: bool,
    pub render_order: RenderOrder,
    pub kind: EntityKind,
}

/// The two entity variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Actor(Box<Actor>),
    Item(Item),
}

impl Entity {
    /// Creates a movement-blocking actor entity.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{Actor, Color, Entity, Fighter, Position};
    /// use uuid::Uuid;
    ///
    /// let orc = Entity::actor(Uuid::nil(), "orc", 'o', Color::new(63, 127, 63), Actor::new(Fighter::new(10, 0, 3)));
    /// assert!(orc.blocks_movement);
    /// assert_eq!(orc.position, Position::origin());
    /// ```
    pub fn actor(id: EntityId, name: &str, glyph: char, color: Color, actor: Actor) -> Self {
        Self {
            id,
            name: name.to_string(),
            position: Position::origin(),
            glyph,
            color,
            blocks_movement: true,
            render_order: RenderOrder::Actor,
            kind: EntityKind::Actor(Box::new(actor)),
        }
    }

    /// Creates a non-blocking item entity.
    pub fn item(id: EntityId, name: &str, glyph: char, color: Color, item: Item) -> Self {
        Self {
            id,
            name: name.to_string(),
            position: Position::origin(),
            glyph,
            color,
            blocks_movement: false,
            render_order: RenderOrder::Item,
            kind: EntityKind::Item(item),
        }
    }

    /// Clones this entity under a fresh id at the given position.
    pub fn spawn_copy(&self, id: EntityId, position: Position) -> Entity {
        let mut copy = self.clone();
        copy.id = id;
        copy.position = position;
        copy
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match &self.kind {
            EntityKind::Actor(actor) => Some(actor),
            EntityKind::Item(_) => None,
        }
    }

    pub fn as_actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            EntityKind::Actor(actor) => Some(actor),
            EntityKind::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match &self.kind {
            EntityKind::Item(item) => Some(item),
            EntityKind::Actor(_) => None,
        }
    }

    pub fn is_actor(&self) -> bool {
        matches!(self.kind, EntityKind::Actor(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self.kind, EntityKind::Item(_))
    }

    /// An actor is alive while it still has an AI.
    pub fn is_alive(&self) -> bool {
        self.as_actor().map(|actor| actor.ai.is_some()).unwrap_or(false)
    }

    /// Applies the permanent death transition and returns the death message.
    ///
    /// The entity stays on its map as non-blocking scenery.
    pub fn die(&mut self, is_player: bool) -> String {
        let message = if is_player {
            "You died!".to_string()
        } else {
            format!("{} is dead!", capitalize(&self.name))
        };

        self.glyph = '%';
        self.color = Color::CORPSE;
        self.blocks_movement = false;
        self.render_order = RenderOrder::Corpse;
        self.name = format!("remains of {}", self.name);
        if let Some(actor) = self.as_actor_mut() {
            actor.ai = None;
        }

        message
    }
}

/// Upper-cases the first character of a name for sentence starts.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A living, acting entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub fighter: Fighter,
    pub skills: Skills,
    pub inventory: Inventory,
    pub equipment: Equipment,
    pub level: Level,
    pub energy: Energy,
    pub spellbook: Spellbook,
    pub ai: Option<Ai>,
}

impl Actor {
    /// Creates an actor with default components around the given fighter.
    ///
    /// The actor starts without an AI; prefabs attach one.
    pub fn new(fighter: Fighter) -> Self {
        Self {
            fighter,
            skills: Skills::default(),
            inventory: Inventory::new(0),
            equipment: Equipment::default(),
            level: Level::default(),
            energy: Energy::default(),
            spellbook: Spellbook::new(26),
            ai: None,
        }
    }

    pub fn with_ai(mut self, ai: Ai) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_inventory(mut self, capacity: usize) -> Self {
        self.inventory = Inventory::new(capacity);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.energy = Energy::new(speed);
        self
    }

    pub fn with_skills(mut self, skills: Skills) -> Self {
        self.skills = skills;
        self
    }

    /// Sums the bonuses of every equipped item held in the inventory.
    pub fn equipment_bonus(&self) -> StatBonus {
        self.inventory
            .items
            .iter()
            .filter(|item| self.equipment.is_equipped(item.id))
            .filter_map(|item| item.as_item().and_then(|i| i.equippable.as_ref()))
            .fold(StatBonus::default(), |total, equippable| total + equippable.bonus)
    }

    pub fn power(&self) -> i32 {
        self.fighter.base_power + self.equipment_bonus().power
    }

    pub fn defense(&self) -> i32 {
        self.fighter.base_defense + self.equipment_bonus().defense
    }

    pub fn armor(&self) -> i32 {
        self.fighter.base_armor + self.equipment_bonus().armor
    }

    pub fn accuracy(&self) -> i32 {
        self.fighter.base_accuracy + self.equipment_bonus().accuracy
    }

    pub fn evasion(&self) -> i32 {
        self.fighter.base_evasion + self.equipment_bonus().evasion
    }

    pub fn fighting(&self) -> i32 {
        self.skills.fighting + self.equipment_bonus().fighting
    }

    pub fn shielding(&self) -> i32 {
        self.skills.shielding + self.equipment_bonus().shielding
    }

    pub fn conjuring(&self) -> i32 {
        self.skills.conjuring + self.equipment_bonus().conjuring
    }

    pub fn archery(&self) -> i32 {
        self.skills.archery + self.equipment_bonus().archery
    }
}

/// Hit points and base combat attributes.
///
/// `hp` is private so every write goes through a clamp into `0..=max_hp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    hp: i32,
    max_hp: i32,
    pub base_defense: i32,
    pub base_power: i32,
    pub base_armor: i32,
    pub base_accuracy: i32,
    pub base_evasion: i32,
}

impl Fighter {
    /// Creates a fighter at full health.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::Fighter;
    ///
    /// let mut fighter = Fighter::new(30, 2, 5);
    /// assert_eq!(fighter.take_damage(45), 30);
    /// assert_eq!(fighter.hp(), 0);
    /// assert_eq!(fighter.heal(10), 10);
    /// ```
    pub fn new(hp: i32, defense: i32, power: i32) -> Self {
        let max_hp = hp.max(1);
        Self {
            hp: max_hp,
            max_hp,
            base_defense: defense,
            base_power: power,
            base_armor: 0,
            base_accuracy: 0,
            base_evasion: 0,
        }
    }

    pub fn with_armor(mut self, armor: i32) -> Self {
        self.base_armor = armor;
        self
    }

    pub fn with_accuracy(mut self, accuracy: i32) -> Self {
        self.base_accuracy = accuracy;
        self
    }

    pub fn with_evasion(mut self, evasion: i32) -> Self {
        self.base_evasion = evasion;
        self
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }

    /// Sets hp, clamped into `0..=max_hp`.
    pub fn set_hp(&mut self, value: i32) {
        self.hp = value.clamp(0, self.max_hp);
    }

    /// Removes hp and returns the amount actually lost. Negative amounts count as zero.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.set_hp(self.hp - amount.max(0));
        before - self.hp
    }

    /// Restores hp and returns the amount actually recovered.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.hp == self.max_hp {
            return 0;
        }
        let before = self.hp;
        self.set_hp(self.hp + amount.max(0));
        self.hp - before
    }

    /// Changes max hp (never below 1) and re-clamps hp.
    pub fn modify_max_hp(&mut self, delta: i32) {
        self.max_hp = (self.max_hp + delta).max(1);
        self.set_hp(self.hp);
    }

    pub fn increase_base_power(&mut self, amount: i32) {
        self.base_power += amount;
    }
}

/// Trained skills, before equipment bonuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub fighting: i32,
    pub shielding: i32,
    pub conjuring: i32,
    pub archery: i32,
}

/// Flat stat modifiers granted by an equipped item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonus {
    pub power: i32,
    pub defense: i32,
    pub armor: i32,
    pub accuracy: i32,
    pub evasion: i32,
    pub fighting: i32,
    pub shielding: i32,
    pub conjuring: i32,
    pub archery: i32,
}

impl std::ops::Add for StatBonus {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            power: self.power + other.power,
            defense: self.defense + other.defense,
            armor: self.armor + other.armor,
            accuracy: self.accuracy + other.accuracy,
            evasion: self.evasion + other.evasion,
            fighting: self.fighting + other.fighting,
            shielding: self.shielding + other.shielding,
            conjuring: self.conjuring + other.conjuring,
            archery: self.archery + other.archery,
        }
    }
}

/// Equipment slots an item can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    BodyArmor,
}

/// Describes how an item is worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipmentSlot,
    pub bonus: StatBonus,
}

/// How an effect picks its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    /// A single visible tile holding an actor
    Single,
    /// Every actor within `radius` of a visible tile
    Area { radius: i32 },
}

/// Single-use item effects and spell effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Healing { amount: i32 },
    Lightning { damage: i32, max_range: i32 },
    Confusion { turns: u32 },
    Fireball { damage: i32, radius: i32 },
}

impl Effect {
    /// Returns the targeting sub-mode this effect needs, if any.
    pub fn targeting(&self) -> Option<TargetMode> {
        match self {
            Effect::Healing { .. } | Effect::Lightning { .. } => None,
            Effect::Confusion { .. } => Some(TargetMode::Single),
            Effect::Fireball { radius, .. } => Some(TargetMode::Area { radius: *radius }),
        }
    }
}

/// Item component data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub consumable: Option<Effect>,
    pub equippable: Option<Equippable>,
}

/// A bounded list of held item entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub capacity: usize,
    pub items: Vec<Entity>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.items.get(index)
    }

    /// Removes and returns the item at `index`.
    pub fn take(&mut self, index: usize) -> Option<Entity> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }
}

/// Map from slot to the id of the equipped inventory item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, EntityId>,
}

impl Equipment {
    pub fn item_in(&self, slot: EquipmentSlot) -> Option<EntityId> {
        self.slots.get(&slot).copied()
    }

    pub fn is_equipped(&self, id: EntityId) -> bool {
        self.slots.values().any(|equipped| *equipped == id)
    }

    /// Puts an item in a slot, returning the id it displaced.
    pub fn equip(&mut self, slot: EquipmentSlot, id: EntityId) -> Option<EntityId> {
        self.slots.insert(slot, id)
    }

    /// Empties whichever slot holds `id`.
    pub fn unequip(&mut self, id: EntityId) -> Option<EquipmentSlot> {
        let slot = self
            .slots
            .iter()
            .find(|(_, equipped)| **equipped == id)
            .map(|(slot, _)| *slot)?;
        self.slots.remove(&slot);
        Some(slot)
    }
}

/// Experience and level progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub current_level: u32,
    pub current_xp: u32,
    pub level_up_base: u32,
    pub level_up_factor: u32,
    pub xp_given: u32,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            current_level: 1,
            current_xp: 0,
            level_up_base: 0,
            level_up_factor: 150,
            xp_given: 0,
        }
    }
}

impl Level {
    /// A level that grants experience to the killer.
    pub fn worth(xp_given: u32) -> Self {
        Self {
            xp_given,
            ..Self::default()
        }
    }

    /// A level that can accumulate experience.
    pub fn progressing(level_up_base: u32) -> Self {
        Self {
            level_up_base,
            ..Self::default()
        }
    }

    pub fn experience_to_next_level(&self) -> u32 {
        self.level_up_base + self.current_level * self.level_up_factor
    }

    pub fn requires_level_up(&self) -> bool {
        self.can_gain_experience() && self.current_xp >= self.experience_to_next_level()
    }

    pub fn can_gain_experience(&self) -> bool {
        self.level_up_base > 0
    }

    /// Adds experience, returning whether any was gained.
    pub fn add_experience(&mut self, xp: u32) -> bool {
        if xp == 0 || !self.can_gain_experience() {
            return false;
        }
        self.current_xp += xp;
        true
    }

    pub fn increase_level(&mut self) {
        self.current_xp = self.current_xp.saturating_sub(self.experience_to_next_level());
        self.current_level += 1;
    }
}

/// Speed component used when scheduling the next turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Energy {
    pub speed: u32,
}

impl Default for Energy {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Energy {
    pub fn new(speed: u32) -> Self {
        Self { speed }
    }

    /// Rolls the delay until this actor's next turn.
    ///
    /// Half of the time the base speed is used as is; otherwise it is nudged
    /// by -1, 0 or +1. The delay never drops below one tick.
    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let jitter: i64 = if rng.gen_bool(0.5) {
            rng.gen_range(-1..=1)
        } else {
            0
        };
        (self.speed as i64 + jitter).max(1) as u64
    }
}

/// A castable spell. Casting never consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spellbook {
    pub capacity: usize,
    pub spells: Vec<Spell>,
}

impl Spellbook {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            spells: Vec::new(),
        }
    }

    /// Learns a spell if there is room, returning whether it was added.
    pub fn learn(&mut self, spell: Spell) -> bool {
        if self.spells.len() >= self.capacity {
            return false;
        }
        self.spells.push(spell);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::seeded_rng;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn dagger(id: EntityId) -> Entity {
        Entity::item(
            id,
            "dagger",
            '/',
            Color::new(0, 191, 255),
            Item {
                consumable: None,
                equippable: Some(Equippable {
                    slot: EquipmentSlot::Weapon,
                    bonus: StatBonus {
                        power: 1,
                        ..StatBonus::default()
                    },
                }),
            },
        )
    }

    #[test]
    fn test_fighter_heal_reports_recovered_amount() {
        let mut fighter = Fighter::new(30, 2, 5);
        assert_eq!(fighter.heal(5), 0);
        fighter.take_damage(8);
        assert_eq!(fighter.heal(5), 5);
        assert_eq!(fighter.heal(5), 3);
        assert_eq!(fighter.hp(), 30);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut fighter = Fighter::new(10, 0, 3);
        assert_eq!(fighter.take_damage(-4), 0);
        assert_eq!(fighter.hp(), 10);
    }

    #[test]
    fn test_modify_max_hp_keeps_hp_in_range() {
        let mut fighter = Fighter::new(10, 0, 3);
        fighter.modify_max_hp(-6);
        assert_eq!(fighter.max_hp(), 4);
        assert_eq!(fighter.hp(), 4);
    }

    #[test]
    fn test_equipment_bonus_only_counts_equipped_items() {
        let mut actor = Actor::new(Fighter::new(30, 2, 5)).with_inventory(4);
        let id = Uuid::from_u128(1);
        actor.inventory.items.push(dagger(id));
        assert_eq!(actor.power(), 5);

        assert_eq!(actor.equipment.equip(EquipmentSlot::Weapon, id), None);
        assert_eq!(actor.power(), 6);

        assert_eq!(actor.equipment.unequip(id), Some(EquipmentSlot::Weapon));
        assert_eq!(actor.power(), 5);
    }

    #[test]
    fn test_death_transition() {
        let mut orc = Entity::actor(
            Uuid::from_u128(2),
            "orc",
            'o',
            Color::new(63, 127, 63),
            Actor::new(Fighter::new(10, 0, 3)).with_ai(Ai::hostile()),
        );
        assert!(orc.is_alive());

        let message = orc.die(false);
        assert_eq!(message, "Orc is dead!");
        assert_eq!(orc.name, "remains of orc");
        assert_eq!(orc.glyph, '%');
        assert!(!orc.blocks_movement);
        assert!(!orc.is_alive());
        assert_eq!(orc.render_order, RenderOrder::Corpse);
    }

    #[test]
    fn test_level_thresholds() {
        let mut level = Level::progressing(200);
        assert_eq!(level.experience_to_next_level(), 350);
        assert!(level.add_experience(400));
        assert!(level.requires_level_up());
        level.increase_level();
        assert_eq!(level.current_level, 2);
        assert_eq!(level.current_xp, 50);

        let mut monster = Level::worth(35);
        assert!(!monster.add_experience(100));
        assert!(!monster.requires_level_up());
    }

    #[test]
    fn test_energy_delay_stays_near_speed() {
        let mut rng = seeded_rng(99);
        let energy = Energy::new(10);
        for _ in 0..200 {
            let delay = energy.next_delay(&mut rng);
            assert!((9..=11).contains(&delay));
        }
        assert_eq!(Energy::new(0).next_delay(&mut rng), 1);
    }

    #[test]
    fn test_spellbook_capacity() {
        let mut book = Spellbook::new(1);
        let heal = Spell {
            name: "Minor heal".to_string(),
            effect: Effect::Healing { amount: 5 },
        };
        assert!(book.learn(heal.clone()));
        assert!(!book.learn(heal));
    }

    proptest! {
        #[test]
        fn test_hp_always_within_bounds(ops in prop::collection::vec((any::<bool>(), -50i32..50), 0..40)) {
            let mut fighter = Fighter::new(30, 0, 0);
            for (is_damage, amount) in ops {
                if is_damage {
                    fighter.take_damage(amount);
                } else {
                    fighter.heal(amount);
                }
                prop_assert!(fighter.hp() >= 0);
                prop_assert!(fighter.hp() <= fighter.max_hp());
            }
        }
    }
}

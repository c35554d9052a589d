//! # Game State Module
//!
//! Central game state and the turn loop that drives it.
//!
//! [`GameState`] owns the world, the scheduler, the message log and the one
//! RNG every random decision draws from. The player acts through
//! [`GameState::play_turn`]; everything else acts when the [`Ticker`] reaches
//! its turn. The whole state serializes to JSON, RNG stream included, so a
//! restored game continues exactly where it was saved.

use crate::game::{
    seeded_rng, Action, ActionError, Actor, Ai, AiContext, AiStep, ConcreteAction, Entity,
    EntityId, GameEvent, GameMap, GameRng, MessageKind, MessageLog, Position, PrefabId, Prefabs,
    Ticker, World,
};
use crate::generation::{GenerationConfig, GeneratorKind};
use crate::{config, CairnError, CairnResult};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Greeting shown when a new game starts.
pub const WELCOME_MESSAGE: &str = "Hello and welcome, adventurer, to yet another dungeon!";

/// Settings for starting a new game.
///
/// Missing fields in a JSON config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for the game RNG
    pub seed: u64,
    /// Player sight radius
    pub fov_radius: i32,
    pub generation: GenerationConfig,
}

impl GameConfig {
    /// Creates the standard configuration for `seed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::GameConfig;
    ///
    /// let config = GameConfig::new(5);
    /// assert_eq!(config.seed, 5);
    /// assert_eq!(config.fov_radius, 8);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fov_radius: config::DEFAULT_FOV_RADIUS,
            generation: GenerationConfig::new(seed),
        }
    }

    /// Smaller floors for fast tests.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            generation: GenerationConfig::for_testing(seed),
            ..Self::new(seed)
        }
    }

    pub fn with_kind(mut self, kind: GeneratorKind) -> Self {
        self.generation.kind = kind;
        self
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> CairnResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Game statistics tracking player progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Monsters the player killed
    pub enemies_defeated: u32,
    pub items_collected: u32,
    /// Damage the player inflicted
    pub damage_dealt: u64,
    /// Damage the player suffered
    pub damage_taken: u64,
    pub experience_gained: u64,
    /// Deepest floor reached
    pub max_depth_reached: u32,
    /// Steps taken by the player
    pub steps_taken: u64,
}

impl GameStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates statistics based on a game event.
    pub fn update_from_event(&mut self, event: &GameEvent, player_id: EntityId) {
        match event {
            GameEvent::EntityMoved { entity_id, .. } if *entity_id == player_id => {
                self.steps_taken += 1;
            }
            GameEvent::EntityDamaged {
                entity_id,
                damage,
                source,
            } => {
                if *entity_id == player_id {
                    self.damage_taken += *damage as u64;
                } else if *source == Some(player_id) {
                    self.damage_dealt += *damage as u64;
                }
            }
            GameEvent::EntityDied { entity_id, killer }
                if *killer == Some(player_id) && *entity_id != player_id =>
            {
                self.enemies_defeated += 1;
            }
            GameEvent::ItemPickedUp { actor, .. } if *actor == player_id => {
                self.items_collected += 1;
            }
            GameEvent::ExperienceGained { entity_id, amount } if *entity_id == player_id => {
                self.experience_gained += *amount as u64;
            }
            GameEvent::FloorDescended { depth } => {
                self.max_depth_reached = self.max_depth_reached.max(*depth);
            }
            _ => {}
        }
    }
}

/// Whether the session is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    PlayerDied,
}

/// What became of a player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The action happened and everyone else caught up
    Performed,
    /// The action was refused; no time passed
    Rejected(String),
    /// The player is dead
    GameOver,
}

/// Stat raised when the player levels up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelUpChoice {
    /// More maximum hit points
    Constitution,
    /// More attack power
    Strength,
}

/// Central game state containing all game data and systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// The dungeon: active floor plus archived ones
    pub world: World,
    /// The player entity ID
    pub player_id: EntityId,
    pub ticker: Ticker,
    /// Actors still due on the tick being processed, in bucket order
    pending: VecDeque<EntityId>,
    pub message_log: MessageLog,
    /// Source of every random decision after setup
    pub rng: GameRng,
    /// Player actions performed so far
    pub turn_number: u64,
    pub fov_radius: i32,
    pub statistics: GameStatistics,
    pub completion_state: GameCompletionState,
    /// Seed the game was started from
    pub rng_seed: u64,
    /// Rebuilt on load
    #[serde(skip)]
    pub prefabs: Prefabs,
}

impl GameState {
    /// Starts a new game: first floor, player, welcome message.
    ///
    /// # Examples
    ///
    /// ```
    /// use cairn::{GameConfig, GameState};
    ///
    /// let state = GameState::new_game(GameConfig::for_testing(1)).unwrap();
    /// assert_eq!(state.world.depth(), 1);
    /// assert!(!state.is_game_over());
    /// assert_eq!(state.message_log.len(), 1);
    /// ```
    pub fn new_game(config: GameConfig) -> CairnResult<Self> {
        let prefabs = Prefabs::standard();
        let mut rng = seeded_rng(config.seed);
        let player = prefabs.spawn_player(&mut rng)?;
        let player_id = player.id;
        let world = World::new(config.generation, player, &prefabs, &mut rng)?;

        let mut state = Self::assemble(world, player_id, rng, prefabs, config.seed, config.fov_radius)?;
        state.message_log.add(WELCOME_MESSAGE, MessageKind::Welcome);
        log::info!("New game started with seed {}", config.seed);
        Ok(state)
    }

    /// Wraps a hand-built map, typically for tests and scripted scenarios.
    ///
    /// The player must already stand on `map`.
    pub fn from_map(map: GameMap, player_id: EntityId, seed: u64) -> CairnResult<Self> {
        let world = World {
            current: map,
            archive: Vec::new(),
            generation: GenerationConfig::new(seed),
        };
        Self::assemble(
            world,
            player_id,
            seeded_rng(seed),
            Prefabs::standard(),
            seed,
            config::DEFAULT_FOV_RADIUS,
        )
    }

    fn assemble(
        world: World,
        player_id: EntityId,
        rng: GameRng,
        prefabs: Prefabs,
        seed: u64,
        fov_radius: i32,
    ) -> CairnResult<Self> {
        let depth = world.depth();
        let mut state = Self {
            world,
            player_id,
            ticker: Ticker::new(),
            pending: VecDeque::new(),
            message_log: MessageLog::new(),
            rng,
            turn_number: 0,
            fov_radius,
            statistics: GameStatistics {
                max_depth_reached: depth,
                ..GameStatistics::default()
            },
            completion_state: GameCompletionState::Playing,
            rng_seed: seed,
            prefabs,
        };
        state.validate()?;

        state.ticker.schedule_turn(player_id, 0);
        state.schedule_floor_actors();
        state.update_fov();
        state.run_until_player_turn()?;
        Ok(state)
    }

    /// Checks the invariants a loaded or assembled state relies on.
    pub fn validate(&self) -> CairnResult<()> {
        let player = self.entity(self.player_id)?;
        if !player.is_actor() {
            return Err(CairnError::InvalidState(format!(
                "Player {} is not an actor",
                player.name
            )));
        }
        Ok(())
    }

    pub fn map(&self) -> &GameMap {
        &self.world.current
    }

    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.world.current
    }

    /// Looks an entity up on the active floor.
    pub fn entity(&self, id: EntityId) -> CairnResult<&Entity> {
        self.world
            .current
            .entity(id)
            .ok_or(CairnError::EntityNotFound(id))
    }

    pub fn entity_mut(&mut self, id: EntityId) -> CairnResult<&mut Entity> {
        self.world
            .current
            .entity_mut(id)
            .ok_or(CairnError::EntityNotFound(id))
    }

    pub fn actor(&self, id: EntityId) -> CairnResult<&Actor> {
        let entity = self.entity(id)?;
        entity
            .as_actor()
            .ok_or_else(|| CairnError::InvalidState(format!("{} is not an actor", entity.name)))
    }

    pub fn actor_mut(&mut self, id: EntityId) -> CairnResult<&mut Actor> {
        let entity = self.entity_mut(id)?;
        let name = entity.name.clone();
        entity
            .as_actor_mut()
            .ok_or_else(|| CairnError::InvalidState(format!("{} is not an actor", name)))
    }

    pub fn player(&self) -> CairnResult<&Entity> {
        self.entity(self.player_id)
    }

    pub fn player_position(&self) -> CairnResult<Position> {
        Ok(self.player()?.position)
    }

    pub fn is_game_over(&self) -> bool {
        self.completion_state != GameCompletionState::Playing
    }

    /// Recomputes the player's field of view on the active floor.
    pub fn update_fov(&mut self) {
        if let Some(origin) = self.world.current.entity(self.player_id).map(|e| e.position) {
            let radius = self.fov_radius;
            self.world.current.update_fov(origin, radius);
        }
    }

    /// Spawns a prefab on the active floor and schedules it if it can act.
    pub fn spawn(&mut self, prefab: PrefabId, position: Position) -> CairnResult<EntityId> {
        let entity = self.prefabs.spawn(prefab, position, &mut self.rng)?;
        let id = entity.id;
        let energy = entity.as_actor().map(|actor| actor.energy);
        let alive = entity.is_alive();
        self.world.current.add_entity(entity);

        if let (Some(energy), true) = (energy, alive) {
            let delay = energy.next_delay(&mut self.rng);
            self.ticker.schedule_turn(id, delay);
        }
        Ok(id)
    }

    /// Schedules every living non-player actor on the active floor.
    fn schedule_floor_actors(&mut self) {
        let actors: Vec<_> = self
            .world
            .current
            .actors()
            .filter(|entity| entity.id != self.player_id)
            .filter_map(|entity| entity.as_actor().map(|actor| (entity.id, actor.energy)))
            .collect();

        for (id, energy) in actors {
            let delay = energy.next_delay(&mut self.rng);
            self.ticker.schedule_turn(id, delay);
        }
        log::debug!("Scheduled {} actors on floor {}", self.ticker.len(), self.world.depth());
    }

    /// Performs one player action and lets the world catch up.
    ///
    /// An impossible action is logged and costs nothing. Fatal errors are
    /// returned as is.
    pub fn play_turn(&mut self, action: ConcreteAction) -> CairnResult<TurnOutcome> {
        if self.is_game_over() {
            return Ok(TurnOutcome::GameOver);
        }
        if action.actor() != self.player_id {
            return Err(CairnError::InvalidAction(format!(
                "{} action does not belong to the player",
                action.action_type()
            )));
        }

        match action.perform(self) {
            Ok(events) => {
                self.record_events(&events);
                self.turn_number += 1;
                self.finish_player_turn()?;
                if self.is_game_over() {
                    Ok(TurnOutcome::GameOver)
                } else {
                    Ok(TurnOutcome::Performed)
                }
            }
            Err(ActionError::Impossible { reason }) => {
                self.message_log.add(reason.clone(), MessageKind::Impossible);
                Ok(TurnOutcome::Rejected(reason))
            }
            Err(ActionError::Fatal(error)) => Err(error),
        }
    }

    fn finish_player_turn(&mut self) -> CairnResult<()> {
        self.update_fov();
        if self.is_game_over() {
            return Ok(());
        }
        let energy = self.actor(self.player_id)?.energy;
        let delay = energy.next_delay(&mut self.rng);
        self.ticker.schedule_turn(self.player_id, delay);
        self.run_until_player_turn()
    }

    /// Hands turns to other actors until the player is due or dead.
    fn run_until_player_turn(&mut self) -> CairnResult<()> {
        while !self.is_game_over() {
            let Some(id) = self.pending.pop_front() else {
                if !self.ticker.is_scheduled(self.player_id) {
                    return Err(CairnError::InvalidState(
                        "The player is not scheduled to act".to_string(),
                    ));
                }
                self.pending = self.ticker.next_turn().into();
                if self.pending.is_empty() {
                    self.ticker.advance();
                } else {
                    log::trace!("Tick {}: {} due", self.ticker.ticks(), self.pending.len());
                }
                continue;
            };

            if id == self.player_id {
                return Ok(());
            }
            self.take_ai_turn(id)?;
        }
        Ok(())
    }

    /// Lets the AI of `id` decide and perform one action.
    fn take_ai_turn(&mut self, id: EntityId) -> CairnResult<()> {
        let Some(entity) = self.world.current.entity_mut(id) else {
            log::debug!("Dropping turn for {}, no longer on this floor", id);
            return Ok(());
        };
        if !entity.is_alive() {
            log::trace!("Skipping turn for dead {}", entity.name);
            return Ok(());
        }
        let position = entity.position;
        let name = entity.name.clone();
        let Some(mut ai) = entity.as_actor_mut().and_then(|actor| actor.ai.take()) else {
            return Ok(());
        };

        let player_position = self.player_position()?;
        let step = {
            let ctx = AiContext {
                actor: id,
                position,
                player_position,
                map: &self.world.current,
            };
            ai.next_step(&ctx, &mut self.rng)
        };

        match step {
            AiStep::Revert => {
                let restored = ai.clone().into_previous().unwrap_or(ai);
                self.actor_mut(id)?.ai = Some(restored);
                self.message_log.add(
                    format!("The {} seems to come to their senses.", name),
                    MessageKind::StatusEffectApplied,
                );
            }
            AiStep::Act(action) => {
                self.actor_mut(id)?.ai = Some(ai);
                match action.perform(self) {
                    Ok(events) => self.record_events(&events),
                    Err(ActionError::Impossible { reason }) => {
                        log::debug!("{} could not {}: {}", name, action.action_type(), reason);
                    }
                    Err(ActionError::Fatal(error)) => return Err(error),
                }
            }
        }

        if let Some(actor) = self
            .world
            .current
            .entity(id)
            .filter(|entity| entity.is_alive())
            .and_then(Entity::as_actor)
        {
            let energy = actor.energy;
            let delay = energy.next_delay(&mut self.rng);
            self.ticker.schedule_turn(id, delay);
        }
        Ok(())
    }

    fn record_events(&mut self, events: &[GameEvent]) {
        for event in events {
            self.statistics.update_from_event(event, self.player_id);
            match event {
                GameEvent::Message { text, kind } => self.message_log.add(text.clone(), *kind),
                GameEvent::EntityDied { entity_id, .. } if *entity_id == self.player_id => {
                    log::info!("Player died on floor {}", self.world.depth());
                    self.completion_state = GameCompletionState::PlayerDied;
                }
                GameEvent::EntityDied { entity_id, .. } => {
                    self.ticker.unschedule(*entity_id);
                    self.pending.retain(|id| id != entity_id);
                }
                _ => {}
            }
        }
    }

    /// Moves the player to a newly generated floor below.
    pub fn descend_floor(&mut self) -> CairnResult<Vec<GameEvent>> {
        self.world
            .descend(self.player_id, &self.prefabs, &mut self.rng)?;
        self.schedule_floor_actors();
        self.update_fov();
        Ok(vec![
            GameEvent::message("You descend the staircase.", MessageKind::Descend),
            GameEvent::FloorDescended {
                depth: self.world.depth(),
            },
        ])
    }

    /// Raises a stat after enough experience. This takes no game time.
    pub fn apply_level_up(&mut self, choice: LevelUpChoice) -> CairnResult<()> {
        let player = self.actor_mut(self.player_id)?;
        if !player.level.requires_level_up() {
            return Err(CairnError::InvalidAction(
                "No level up is pending".to_string(),
            ));
        }

        let text = match choice {
            LevelUpChoice::Constitution => {
                player.fighter.modify_max_hp(config::LEVEL_UP_HP_BONUS);
                player.fighter.heal(config::LEVEL_UP_HP_BONUS);
                "Your health improves!"
            }
            LevelUpChoice::Strength => {
                player.fighter.increase_base_power(config::LEVEL_UP_POWER_BONUS);
                "You feel stronger!"
            }
        };
        player.level.increase_level();
        let level = player.level.current_level;
        self.message_log.add(text, MessageKind::Normal);
        log::info!("Player reached level {} via {:?}", level, choice);
        Ok(())
    }

    /// Describes what the player sees at `pos`.
    pub fn look_at(&self, pos: Position) -> String {
        let map = self.map();
        if !map.is_visible(pos) {
            return "You cannot see that.".to_string();
        }
        map.entities
            .iter()
            .filter(|entity| entity.position == pos)
            .map(|entity| entity.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Saves the game state to JSON.
    pub fn save_to_json(&self) -> CairnResult<String> {
        serde_json::to_string_pretty(self).map_err(CairnError::from)
    }

    /// Loads game state from JSON.
    pub fn load_from_json(json: &str) -> CairnResult<Self> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> CairnResult<()> {
        std::fs::write(path.as_ref(), self.save_to_json()?)?;
        log::info!("Saved game to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> CairnResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let state = Self::load_from_json(&json)?;
        log::info!("Loaded game from {}", path.as_ref().display());
        Ok(state)
    }

    /// The AI attached to `id`, if it is a living actor.
    pub fn ai_of(&self, id: EntityId) -> Option<&Ai> {
        self.world
            .current
            .entity(id)
            .and_then(Entity::as_actor)
            .and_then(|actor| actor.ai.as_ref())
    }
}

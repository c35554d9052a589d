//! # Cairn Roguelike Core
//!
//! The turn-scheduling, combat-resolution and procedural-dungeon core of a
//! turn-based roguelike.
//!
//! ## Architecture Overview
//!
//! Cairn is organised around a single authoritative [`GameState`]:
//!
//! - **Entity Model**: actors and items composed from optional components
//! - **Combat Resolver**: pure melee outcome computation driven by dice
//! - **Ticker**: an exact-tick bucket scheduler interleaving actor turns
//! - **AI**: hostile and confused behaviours that emit actions
//! - **Action Layer**: the only legal way to mutate maps and entities
//! - **Generation System**: rectangular-room and cellular-automata floors
//!
//! Presentation is kept outside the core. The [`rendering`] module only
//! produces snapshots and the [`input`] module only produces intents.

pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod utils;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use utils::*;

// Explicit re-exports for commonly used types
pub use game::{
    // From actions
    Action,
    ActionError,
    ActionResult,
    ConcreteAction,
    GameEvent,
    // From ai
    Ai,
    // From combat
    AttackOutcome,
    AttackResult,
    // From entities
    Actor,
    Entity,
    EntityId,
    EntityKind,
    // From messages
    MessageKind,
    // From state
    GameCompletionState,
    GameConfig,
    GameState,
    TurnOutcome,
    // From ticker
    Ticker,
    // From world
    GameMap,
    World,
    // Core types
    Direction,
    Position,
};

pub use generation::{
    CellularAutomataGenerator, GenerationConfig, Generator, GeneratorKind, Room,
    RoomCorridorGenerator,
};

/// Core error type for the Cairn engine.
#[derive(thiserror::Error, Debug)]
pub enum CairnError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// An entity id did not resolve on the active map
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
}

/// Result type used throughout the Cairn codebase.
pub type CairnResult<T> = Result<T, CairnError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_MAP_WIDTH: i32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_MAP_HEIGHT: i32 = 43;

    /// Smallest side of a rectangular room
    pub const ROOM_MIN_SIZE: i32 = 6;

    /// Largest side of a rectangular room
    pub const ROOM_MAX_SIZE: i32 = 10;

    /// Room placement attempts per floor
    pub const MAX_ROOMS: u32 = 30;

    /// Player sight radius
    pub const DEFAULT_FOV_RADIUS: i32 = 8;

    /// Percentage of cells seeded as wall by the cave generator
    pub const CAVE_WALL_PERCENT: u32 = 40;

    /// Minimum reachable fraction of a cave map
    pub const CAVE_MIN_OPEN_FRACTION: f64 = 0.45;

    /// Attempts before generation gives up
    pub const MAX_GENERATION_ATTEMPTS: u32 = 5;

    /// Starting inventory capacity for the player
    pub const PLAYER_INVENTORY_CAPACITY: usize = 26;

    /// Max hp gained from a Constitution level-up
    pub const LEVEL_UP_HP_BONUS: i32 = 20;

    /// Power gained from a Strength level-up
    pub const LEVEL_UP_POWER_BONUS: i32 = 1;

    /// Messages kept in a render snapshot
    pub const SNAPSHOT_MESSAGE_COUNT: usize = 5;

    /// Lines a message log keeps before dropping the oldest
    pub const MESSAGE_HISTORY_LIMIT: usize = 256;
}

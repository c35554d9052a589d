//! # Utilities Module
//!
//! The cost-grid pathfinder shared by the AI.

pub mod pathfinding;

pub use self::pathfinding::*;

//! # Rendering Module
//!
//! The render boundary: read-only snapshots of a game for presentation.
//!
//! Nothing here draws to a screen. A [`RenderSnapshot`] captures what the
//! player can see and remember, which a front end is free to paint however it
//! likes. The headless driver prints [`RenderSnapshot::to_ascii`] and the
//! readouts from [`ui`].

pub mod display;
pub mod ui;

pub use display::*;
pub use ui::*;

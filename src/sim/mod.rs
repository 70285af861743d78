//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Wall-clock time enters through a single injected `now` argument
//! - No rendering or platform dependencies

pub mod entity;
pub mod grid;
pub mod level;
pub mod player;
pub mod state;
pub mod tick;

pub use entity::{Entity, EntityKind};
pub use grid::{Tile, TileGrid};
pub use level::{LevelLayout, Theme, generate_level};
pub use state::{FloatingText, Particle, Phase, Player, PowerTier, Session};
pub use tick::{TickInput, tick};

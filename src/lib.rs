//! Side Runner - a tile-based side-scrolling platformer runtime
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, tile collision, level
//!   generation, session state machine)
//! - `frame`: Read-only per-frame snapshot consumed by a presentation layer

pub mod frame;
pub mod sim;

pub use frame::FrameSnapshot;
pub use sim::{Session, TickInput, tick};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz; one tick = one frame)
    pub const TICK_RATE: u32 = 60;
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// One terrain cell in pixels
    pub const TILE_SIZE: f32 = 32.0;
    /// Level height in tiles; the viewport is exactly this tall
    pub const GRID_HEIGHT: usize = 12;
    /// Viewport dimensions in pixels
    pub const VIEW_WIDTH: f32 = 600.0;
    pub const VIEW_HEIGHT: f32 = 384.0; // GRID_HEIGHT * TILE_SIZE exactly

    /// Player horizontal movement (pixels per tick)
    pub const WALK_SPEED: f32 = 4.0;
    pub const RUN_SPEED: f32 = 6.0;
    pub const WALK_ACCEL: f32 = 0.2;
    pub const RUN_ACCEL: f32 = 0.4;
    pub const FRICTION: f32 = 0.15;

    /// Player vertical movement
    pub const GRAVITY: f32 = 0.5;
    pub const JUMP_IMPULSE: f32 = -10.0;
    pub const MAX_FALL_SPEED: f32 = 12.0;
    /// Releasing jump early clamps upward velocity to this
    pub const JUMP_CUTOFF: f32 = -3.0;
    /// Upward bounce applied after stomping an enemy
    pub const STOMP_BOUNCE: f32 = -6.0;

    /// Underwater physics (weaker pull, low terminal velocity)
    pub const WATER_GRAVITY: f32 = 0.15;
    pub const WATER_MAX_FALL: f32 = 2.0;

    /// Player hitbox width; height is one tile (two above Small)
    pub const PLAYER_WIDTH: f32 = TILE_SIZE - 4.0;

    /// Entity physics
    pub const ENTITY_GRAVITY: f32 = 0.3;
    pub const ENTITY_MAX_FALL: f32 = 8.0;
    pub const SHELL_KICK_SPEED: f32 = 8.0;
    /// Stars maintain a constant upward bounce
    pub const STAR_BOUNCE: f32 = -5.0;
    pub const FIREBALL_SPEED: f32 = 8.0;
    pub const MAX_FIREBALLS: usize = 2;

    /// Timers, all in ticks
    pub const STOMP_TICKS: u32 = 30;
    pub const DEATH_TICKS: u32 = 180;
    pub const HURT_INVINCIBILITY_TICKS: u32 = 120;
    pub const STAR_TICKS: u32 = 600;
    pub const WORLD_INTRO_TICKS: u32 = 180;

    /// Per-level countdown in seconds of wall-clock time
    pub const LEVEL_TIME: i32 = 400;

    /// Entities further than this outside the viewport are despawned
    pub const DESPAWN_MARGIN: f32 = 100.0;
}

/// Column/row index of the tile containing pixel coordinate `p`
#[inline]
pub fn tile_coord(p: f32) -> i32 {
    (p / consts::TILE_SIZE).floor() as i32
}

//! Session state and core simulation types
//!
//! The session owns every piece of mutable game state and is passed
//! explicitly into each subsystem call; there are no ambient globals.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::grid::TileGrid;
use super::level::{LevelLayout, Theme, generate_level};
use crate::consts::*;

/// Meta-state of the game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the start command
    Title,
    /// Timed "WORLD x-y" card before play begins
    WorldIntro,
    /// The primary simulation tick
    Playing,
    Paused,
    /// Completion hold + auto-walk off the right edge
    LevelComplete,
    GameOver,
    Victory,
}

/// Player upgrade tier; affects hitbox height and damage tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerTier {
    Small,
    Big,
    Fire,
}

/// Singleton player state. Power tier and lives persist across level loads;
/// position and velocity reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub power: PowerTier,
    pub on_ground: bool,
    pub facing_right: bool,
    pub invincibility: u32,
    pub star: u32,
    pub anim_frame: u8,
    pub anim_timer: u8,
    pub dead: bool,
    pub death_timer: u32,
    /// Latch for edge-triggered jumping
    pub jump_was_held: bool,
    /// Latch for edge-triggered fireball throws
    pub fire_was_held: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            power: PowerTier::Small,
            on_ground: false,
            facing_right: true,
            invincibility: 0,
            star: 0,
            anim_frame: 0,
            anim_timer: 0,
            dead: false,
            death_timer: 0,
            jump_was_held: false,
            fire_was_held: false,
        }
    }
}

impl Player {
    /// Current hitbox size; height doubles above Small
    pub fn hitbox(&self) -> Vec2 {
        let height = if self.power == PowerTier::Small {
            TILE_SIZE
        } else {
            TILE_SIZE * 2.0
        };
        Vec2::new(PLAYER_WIDTH, height)
    }
}

/// Short-lived visual debris (brick chunks, enemy pops, fireworks)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [u8; 3],
    pub life: u32,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, color: [u8; 3]) -> Self {
        Self {
            pos,
            vel,
            color,
            life: 60,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
        self.vel.y += 0.3;
        self.life = self.life.saturating_sub(1);
    }
}

/// Rising score/bonus label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub text: String,
    pub pos: Vec2,
    pub life: u32,
}

impl FloatingText {
    pub fn new(text: impl Into<String>, pos: Vec2) -> Self {
        Self {
            text: text.into(),
            pos,
            life: 60,
        }
    }

    pub fn update(&mut self) {
        self.pos.y -= 1.0;
        self.life = self.life.saturating_sub(1);
    }
}

/// Complete game session (deterministic given seed, inputs and clock samples)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: Phase,
    pub world: u32,
    pub level: u32,
    pub lives: u32,
    pub coins: u32,
    pub score: u64,
    /// Seconds left on the level clock
    pub time_remaining: i32,
    /// Wall-clock sample at the last countdown decrement
    pub last_time_update: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Horizontal scroll offset in pixels
    pub camera_x: f32,

    pub theme: Theme,
    pub grid: TileGrid,
    pub flag_pole_x: Option<i32>,
    pub axe: Option<(i32, i32)>,

    pub player: Player,
    pub entities: Vec<Entity>,
    pub particles: Vec<Particle>,
    pub floating_texts: Vec<FloatingText>,

    pub flag_descending: bool,
    pub flag_y: f32,
    pub level_complete_timer: u32,
    pub world_intro_timer: u32,
    pub victory_timer: u32,
}

impl Session {
    /// Create a fresh session on the title screen
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = generate_level(1, 1, &mut rng);
        let mut session = Self {
            seed,
            rng,
            phase: Phase::Title,
            world: 1,
            level: 1,
            lives: 3,
            coins: 0,
            score: 0,
            time_remaining: LEVEL_TIME,
            last_time_update: 0.0,
            time_ticks: 0,
            camera_x: 0.0,
            theme: layout.theme,
            grid: layout.grid,
            flag_pole_x: layout.flag_pole_x,
            axe: layout.axe,
            player: Player::default(),
            entities: layout.entities,
            particles: Vec::new(),
            floating_texts: Vec::new(),
            flag_descending: false,
            flag_y: 0.0,
            level_complete_timer: 0,
            world_intro_timer: 0,
            victory_timer: 0,
        };
        session.reset_player_spawn();
        session
    }

    /// Generate and install the level for (world, level), resetting the
    /// per-level state. Player power tier and session totals persist.
    pub fn load_level(&mut self, world: u32, level: u32, now: f64) {
        self.world = world;
        self.level = level;

        let layout: LevelLayout = generate_level(world, level, &mut self.rng);
        assert_eq!(
            layout.grid.height(),
            GRID_HEIGHT,
            "generated level height must match the viewport"
        );
        self.theme = layout.theme;
        self.grid = layout.grid;
        self.flag_pole_x = layout.flag_pole_x;
        self.axe = layout.axe;
        self.entities = layout.entities;
        self.particles.clear();
        self.floating_texts.clear();

        self.reset_player_spawn();
        self.camera_x = 0.0;
        self.time_remaining = LEVEL_TIME;
        self.last_time_update = now;
        self.flag_descending = false;
        self.flag_y = 0.0;
        self.level_complete_timer = 0;

        log::info!("loaded level {world}-{level} ({:?})", self.theme);
    }

    /// Put the player at the fixed spawn offset, standing on the ground
    /// strip, with velocity and per-life flags cleared.
    fn reset_player_spawn(&mut self) {
        self.player.pos = Vec2::new(TILE_SIZE * 3.0, (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE);
        if self.player.power != PowerTier::Small {
            self.player.pos.y -= TILE_SIZE;
        }
        self.player.vel = Vec2::ZERO;
        self.player.on_ground = false;
        self.player.dead = false;
        self.player.death_timer = 0;
        self.player.invincibility = 0;
        self.player.star = 0;
    }

    /// Full reset back to world 1-1 with starting totals
    pub fn reset(&mut self, now: f64) {
        self.world = 1;
        self.level = 1;
        self.lives = 3;
        self.coins = 0;
        self.score = 0;
        self.player.power = PowerTier::Small;
        self.load_level(1, 1, now);
    }

    /// Credit one coin; wraps at 100 into an extra life
    pub fn collect_coin(&mut self) {
        self.coins += 1;
        self.score += 200;
        if self.coins >= 100 {
            self.coins = 0;
            self.lives += 1;
            let pos = self.player.pos - Vec2::new(0.0, 30.0);
            self.floating_texts.push(FloatingText::new("1UP!", pos));
            log::info!("coin wrap: extra life, now {}", self.lives);
        }
    }

    /// Start the death animation: upward pop, then a fixed countdown
    pub fn kill_player(&mut self) {
        if self.player.dead {
            return;
        }
        log::info!("player died at x={:.0}", self.player.pos.x);
        self.player.dead = true;
        self.player.death_timer = 0;
        self.player.vel = Vec2::new(0.0, -8.0);
    }

    /// Death countdown elapsed: burn a life, reload or end the run
    pub fn lose_life(&mut self, now: f64) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            log::info!("game over with score {}", self.score);
            self.phase = Phase::GameOver;
        } else {
            self.load_level(self.world, self.level, now);
        }
    }

    /// Hostile contact that is not a stomp
    pub fn damage_player(&mut self) {
        if self.player.invincibility > 0 || self.player.star > 0 {
            return;
        }
        if self.player.power == PowerTier::Small {
            self.kill_player();
        } else {
            self.player.power = PowerTier::Small;
            self.player.invincibility = HURT_INVINCIBILITY_TICKS;
        }
    }

    /// Destroy an enemy outright (star contact, fireball, kicked shell)
    pub fn destroy_enemy(&mut self, index: usize) {
        let entity = &mut self.entities[index];
        entity.dead = true;
        let (pos, size) = (entity.pos, entity.size);
        self.score += 200;
        self.floating_texts.push(FloatingText::new("+200", pos));
        for _ in 0..6 {
            let p = pos
                + Vec2::new(
                    self.rng.random_range(0.0..size.x),
                    self.rng.random_range(0.0..size.y),
                );
            let vel = Vec2::new(
                self.rng.random_range(-3.0..3.0),
                self.rng.random_range(-8.0..-2.0),
            );
            self.particles.push(Particle::new(p, vel, [255, 255, 255]));
        }
    }

    /// World-Level HUD label, e.g. "1-1"
    pub fn world_label(&self) -> String {
        format!("{}-{}", self.world, self.level)
    }
}

//! Dynamic actors: enemies, pickups, projectiles
//!
//! Entities are owned exclusively by the session and carry no references to
//! each other; interactions are resolved by spatial query each tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::TileGrid;
use crate::consts::{
    ENTITY_GRAVITY, ENTITY_MAX_FALL, FIREBALL_SPEED, STAR_BOUNCE, STOMP_TICKS, TILE_SIZE,
};
use crate::tile_coord;

/// Closed set of entity kinds; behavior dispatch is exhaustive over this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Goomba,
    Koopa,
    Bowser,
    Mushroom,
    FireFlower,
    Star,
    Coin,
    Fireball,
}

impl EntityKind {
    /// Contact with these damages the player (unless stomped away)
    pub fn is_hostile(self) -> bool {
        matches!(self, EntityKind::Goomba | EntityKind::Koopa | EntityKind::Bowser)
    }

    /// Consumed on contact, applying a power-up effect
    pub fn is_pickup(self) -> bool {
        matches!(
            self,
            EntityKind::Mushroom | EntityKind::FireFlower | EntityKind::Star
        )
    }

    /// Ground patrollers that turn around at cliff edges
    pub fn is_walker(self) -> bool {
        matches!(self, EntityKind::Goomba | EntityKind::Koopa)
    }
}

/// A single dynamic actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    /// Inactive entities no longer collide with the player
    pub active: bool,
    pub dead: bool,
    pub stomped: bool,
    pub stomp_timer: u32,
    pub in_shell: bool,
    pub emerging: bool,
    pub emerge_target_y: f32,
}

impl Entity {
    pub fn new(kind: EntityKind, pos: Vec2) -> Self {
        let (size, vel) = match kind {
            EntityKind::Goomba | EntityKind::Koopa => {
                (Vec2::splat(TILE_SIZE), Vec2::new(-1.0, 0.0))
            }
            EntityKind::Bowser => (Vec2::splat(TILE_SIZE * 2.0), Vec2::new(-1.0, 0.0)),
            EntityKind::Mushroom | EntityKind::FireFlower | EntityKind::Star => {
                (Vec2::splat(TILE_SIZE), Vec2::new(2.0, 0.0))
            }
            EntityKind::Fireball => (Vec2::splat(12.0), Vec2::ZERO),
            EntityKind::Coin => (Vec2::splat(TILE_SIZE), Vec2::ZERO),
        };
        Self {
            kind,
            pos,
            vel,
            size,
            active: true,
            dead: false,
            stomped: false,
            stomp_timer: 0,
            in_shell: false,
            emerging: false,
            emerge_target_y: 0.0,
        }
    }

    /// Coin popped out of a hit block: rises, falls back, auto-collects.
    pub fn block_coin(block_x: f32, block_y: f32) -> Self {
        let mut coin = Entity::new(
            EntityKind::Coin,
            Vec2::new(block_x + TILE_SIZE / 2.0 - 6.0, block_y),
        );
        coin.vel.y = -10.0;
        coin
    }

    /// Pickup rising out of a hit block
    pub fn emerging_pickup(kind: EntityKind, block_x: f32, block_y: f32) -> Self {
        debug_assert!(kind.is_pickup());
        let mut pickup = Entity::new(kind, Vec2::new(block_x, block_y));
        pickup.emerging = true;
        pickup.emerge_target_y = block_y - TILE_SIZE * 2.0;
        pickup
    }

    /// Projectile launched from the player at Fire tier
    pub fn fireball(pos: Vec2, facing_right: bool) -> Self {
        let mut ball = Entity::new(EntityKind::Fireball, pos);
        ball.vel.x = if facing_right {
            FIREBALL_SPEED
        } else {
            -FIREBALL_SPEED
        };
        ball
    }

    /// Mark as stomped: frozen in place, counting down to removal
    pub fn stomp_flatten(&mut self) {
        self.stomped = true;
        self.stomp_timer = STOMP_TICKS;
        self.active = false;
    }

    /// Axis-aligned overlap against an arbitrary box
    pub fn overlaps(&self, pos: Vec2, size: Vec2) -> bool {
        pos.x < self.pos.x + self.size.x
            && pos.x + size.x > self.pos.x
            && pos.y < self.pos.y + self.size.y
            && pos.y + size.y > self.pos.y
    }

    /// Advance one tick. Returns true when a rising coin reached its apex
    /// and was consumed (the session credits the coin).
    pub fn step(&mut self, grid: &TileGrid) -> bool {
        if self.stomped {
            self.stomp_timer = self.stomp_timer.saturating_sub(1);
            if self.stomp_timer == 0 {
                self.dead = true;
            }
            return false;
        }

        if self.emerging {
            self.pos.y -= 1.0;
            if self.pos.y <= self.emerge_target_y {
                self.emerging = false;
            }
            return false;
        }

        // Gravity; coins at rest are exempt so placed coins hang in the air
        if self.kind != EntityKind::Coin || self.vel.y != 0.0 {
            self.vel.y = (self.vel.y + ENTITY_GRAVITY).min(ENTITY_MAX_FALL);
        }

        if self.kind == EntityKind::Star {
            self.vel.y = STAR_BOUNCE;
        }

        // A rising coin keeps rising under its own light gravity and is
        // consumed the moment its velocity turns downward
        if self.kind == EntityKind::Coin && self.vel.y < 0.0 {
            self.pos.y += self.vel.y;
            self.vel.y += 0.5;
            if self.vel.y >= 0.0 {
                self.dead = true;
                return true;
            }
            return false;
        }

        self.pos.x += self.vel.x;
        self.resolve_tile_collision(grid);
        self.pos.y += self.vel.y;

        false
    }

    fn resolve_tile_collision(&mut self, grid: &TileGrid) {
        // A solid tile ahead reverses horizontal direction
        let check_x = if self.vel.x > 0.0 {
            tile_coord(self.pos.x + self.size.x)
        } else {
            tile_coord(self.pos.x)
        };
        let check_y = tile_coord(self.pos.y + self.size.y / 2.0);
        if grid.solid(check_x, check_y) {
            self.vel.x = -self.vel.x;
        }

        // A solid tile below clamps to the tile boundary
        let ground_y = tile_coord(self.pos.y + self.size.y);
        let ground_x = tile_coord(self.pos.x + self.size.x / 2.0);
        if grid.solid(ground_x, ground_y) {
            self.pos.y = ground_y as f32 * TILE_SIZE - self.size.y;
            self.vel.y = 0.0;
        }

        // Walking enemies probe ahead-and-below and turn back at cliffs
        if self.kind.is_walker() && !self.in_shell {
            let ahead_x = if self.vel.x > 0.0 {
                tile_coord(self.pos.x + self.size.x + 4.0)
            } else {
                tile_coord(self.pos.x - 4.0)
            };
            let below_y = tile_coord(self.pos.y + self.size.y + 4.0);
            if !grid.solid(ahead_x, below_y) {
                self.vel.x = -self.vel.x;
            }
        }
    }
}

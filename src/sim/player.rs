//! Player movement, tile collision and block interactions
//!
//! Horizontal and vertical collision are two independent move-and-resolve
//! passes per tick. Landing clamps the player exactly to the tile boundary;
//! there is never residual penetration or a one-pixel gap.

use glam::Vec2;
use rand::Rng;

use super::entity::{Entity, EntityKind};
use super::grid::Tile;
use super::state::{FloatingText, Particle, PowerTier, Session};
use super::tick::TickInput;
use crate::consts::*;
use crate::tile_coord;

impl Session {
    /// Advance player physics for one Playing tick
    pub(crate) fn update_player(&mut self, input: &TickInput) {
        // Horizontal: accelerate toward the speed cap, or decelerate to rest
        let accel = if input.run_or_fire { RUN_ACCEL } else { WALK_ACCEL };
        let max_speed = if input.run_or_fire { RUN_SPEED } else { WALK_SPEED };

        // Crouching on the ground suppresses directional control
        let steering = !(input.crouch && self.player.on_ground);

        if steering && input.left && !input.right {
            self.player.vel.x = (self.player.vel.x - accel).max(-max_speed);
            self.player.facing_right = false;
        } else if steering && input.right && !input.left {
            self.player.vel.x = (self.player.vel.x + accel).min(max_speed);
            self.player.facing_right = true;
        } else if self.player.vel.x > 0.0 {
            self.player.vel.x = (self.player.vel.x - FRICTION).max(0.0);
        } else if self.player.vel.x < 0.0 {
            self.player.vel.x = (self.player.vel.x + FRICTION).min(0.0);
        }

        // Jump is edge-triggered and only fires from the ground
        if input.jump && self.player.on_ground && !self.player.jump_was_held {
            self.player.vel.y = JUMP_IMPULSE;
            self.player.on_ground = false;
            self.player.jump_was_held = true;
        }

        // Releasing jump early clamps ascent for variable jump height
        if !input.jump && self.player.vel.y < JUMP_CUTOFF {
            self.player.vel.y = JUMP_CUTOFF;
        }

        // Gravity, weaker underwater
        if self.theme == super::level::Theme::Underwater {
            self.player.vel.y = (self.player.vel.y + WATER_GRAVITY).min(WATER_MAX_FALL);
        } else {
            self.player.vel.y = (self.player.vel.y + GRAVITY).min(MAX_FALL_SPEED);
        }

        self.player.pos.x += self.player.vel.x;
        self.resolve_player_horizontal();

        // The level edge and the camera's trailing edge both block movement
        if self.player.pos.x < 0.0 {
            self.player.pos.x = 0.0;
        }
        if self.player.pos.x < self.camera_x && self.camera_x > 0.0 {
            self.player.pos.x = self.camera_x;
        }

        self.player.pos.y += self.player.vel.y;
        self.resolve_player_vertical();

        // Falling below the level is fatal
        if self.player.pos.y > GRID_HEIGHT as f32 * TILE_SIZE + 50.0 {
            self.kill_player();
        }
    }

    fn resolve_player_horizontal(&mut self) {
        let size = self.player.hitbox();
        let start_ty = tile_coord(self.player.pos.y);
        let end_ty = tile_coord(self.player.pos.y + size.y - 1.0).min(GRID_HEIGHT as i32 - 1);

        if self.player.vel.x > 0.0 {
            let tile_x = tile_coord(self.player.pos.x + size.x);
            for ty in start_ty..=end_ty {
                if self.grid.solid(tile_x, ty) {
                    self.player.pos.x = tile_x as f32 * TILE_SIZE - size.x - 1.0;
                    self.player.vel.x = 0.0;
                    break;
                }
            }
        } else if self.player.vel.x < 0.0 {
            let tile_x = tile_coord(self.player.pos.x);
            for ty in start_ty..=end_ty {
                if self.grid.solid(tile_x, ty) {
                    self.player.pos.x = (tile_x + 1) as f32 * TILE_SIZE + 1.0;
                    self.player.vel.x = 0.0;
                    break;
                }
            }
        }
    }

    fn resolve_player_vertical(&mut self) {
        let size = self.player.hitbox();
        self.player.on_ground = false;

        let start_tx = tile_coord(self.player.pos.x + 2.0);
        let end_tx = tile_coord(self.player.pos.x + size.x - 2.0);

        if self.player.vel.y > 0.0 {
            let tile_y = tile_coord(self.player.pos.y + size.y);
            for tx in start_tx..=end_tx {
                if self.grid.solid(tx, tile_y) {
                    // Pixel-exact alignment to the tile boundary
                    self.player.pos.y = tile_y as f32 * TILE_SIZE - size.y;
                    self.player.vel.y = 0.0;
                    self.player.on_ground = true;
                    break;
                }
            }
        } else if self.player.vel.y < 0.0 {
            let tile_y = tile_coord(self.player.pos.y);
            for tx in start_tx..=end_tx {
                if self.grid.solid(tx, tile_y) {
                    self.player.pos.y = (tile_y + 1) as f32 * TILE_SIZE;
                    self.player.vel.y = 0.0;
                    self.hit_block(tx, tile_y);
                    break;
                }
            }
        }
    }

    /// Head-bump on a tile from below
    fn hit_block(&mut self, tx: i32, ty: i32) {
        let block_x = tx as f32 * TILE_SIZE;
        let block_y = ty as f32 * TILE_SIZE;

        match self.grid.tile_at(tx, ty) {
            Tile::Question => {
                // Becomes permanently inert; a second hit never re-triggers
                self.grid.set_tile(tx, ty, Tile::Used);
                if self.rng.random::<f32>() < 0.25 && self.player.power == PowerTier::Small {
                    self.spawn_powerup(block_x, block_y);
                } else {
                    self.entities
                        .push(Entity::block_coin(block_x, block_y - TILE_SIZE));
                }
                self.score += 100;
            }
            Tile::Brick if self.player.power != PowerTier::Small => {
                self.grid.set_tile(tx, ty, Tile::Air);
                self.spawn_brick_debris(block_x, block_y);
                self.score += 50;
            }
            _ => {}
        }
    }

    fn spawn_powerup(&mut self, block_x: f32, block_y: f32) {
        let kind = if self.player.power == PowerTier::Small {
            EntityKind::Mushroom
        } else if self.rng.random::<f32>() < 0.33 {
            EntityKind::Star
        } else {
            EntityKind::FireFlower
        };
        self.entities
            .push(Entity::emerging_pickup(kind, block_x, block_y));
    }

    fn spawn_brick_debris(&mut self, x: f32, y: f32) {
        for i in 0..4 {
            let px = x + (i % 2) as f32 * TILE_SIZE / 2.0;
            let py = y + (i / 2) as f32 * TILE_SIZE / 2.0;
            let vel_x = if i % 2 == 0 { -3.0 } else { 3.0 };
            let vel_y = if i < 2 { -8.0 } else { -5.0 };
            self.particles
                .push(Particle::new(Vec2::new(px, py), Vec2::new(vel_x, vel_y), [200, 76, 12]));
        }
    }

    /// Consume a touched pickup and apply its effect
    pub(crate) fn collect_powerup(&mut self, index: usize) {
        let entity = &mut self.entities[index];
        entity.dead = true;
        let (kind, pos) = (entity.kind, entity.pos);

        match kind {
            EntityKind::Mushroom => {
                if self.player.power == PowerTier::Small {
                    self.player.power = PowerTier::Big;
                    self.player.pos.y -= TILE_SIZE;
                }
            }
            EntityKind::FireFlower => {
                if self.player.power == PowerTier::Small {
                    self.player.pos.y -= TILE_SIZE;
                }
                self.player.power = PowerTier::Fire;
            }
            EntityKind::Star => {
                self.player.star = STAR_TICKS;
            }
            _ => unreachable!("collect_powerup called on non-pickup"),
        }
        self.score += 1000;
        self.floating_texts.push(FloatingText::new("+1000", pos));
    }

    /// Downward contact defeat; behavior depends on the enemy kind
    pub(crate) fn stomp_enemy(&mut self, index: usize) {
        let facing_right = self.player.facing_right;
        let entity = &mut self.entities[index];
        let pos = entity.pos;

        match entity.kind {
            EntityKind::Koopa => {
                if entity.in_shell {
                    // Launch the shell in the player's facing direction
                    entity.vel.x = if facing_right {
                        SHELL_KICK_SPEED
                    } else {
                        -SHELL_KICK_SPEED
                    };
                } else {
                    entity.in_shell = true;
                    entity.vel.x = 0.0;
                }
            }
            _ => entity.stomp_flatten(),
        }
        self.score += 100;
        self.floating_texts.push(FloatingText::new("+100", pos));
        self.player.vel.y = STOMP_BOUNCE;
    }

    /// Throw a fireball if the player is at Fire tier and under the cap
    pub(crate) fn shoot_fireball(&mut self) {
        if self.player.power != PowerTier::Fire || self.player.dead {
            return;
        }
        let live = self
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Fireball)
            .count();
        if live >= MAX_FIREBALLS {
            return;
        }
        let offset = if self.player.facing_right {
            TILE_SIZE
        } else {
            -8.0
        };
        let pos = Vec2::new(
            self.player.pos.x + offset,
            self.player.pos.y + TILE_SIZE / 2.0,
        );
        self.entities
            .push(Entity::fireball(pos, self.player.facing_right));
    }
}

//! Fixed-timestep session update
//!
//! `tick` is the single entry point that advances a [`Session`] by one step.
//! It is a pure function of the session state, the sampled input and the
//! injected wall-clock reading, so replaying the same sequence reproduces
//! the same run bit for bit.

use glam::Vec2;
use rand::Rng;

use super::entity::EntityKind;
use super::grid::Tile;
use super::state::{FloatingText, Particle, Phase, Session};
use crate::consts::*;

/// One tick's worth of sampled input.
///
/// Movement fields are level-triggered (held), the rest are discrete events
/// consumed by the tick they arrive in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    /// Held: run. Edge: throw a fireball at Fire tier.
    pub run_or_fire: bool,
    pub crouch: bool,
    pub pause: bool,
    pub confirm: bool,
    pub back_to_title: bool,
}

impl TickInput {
    /// Synthesized input for unattended demo runs: confirm through menus,
    /// hold run-right, hop periodically or when stuck against a wall.
    pub fn autopilot(session: &Session, tick_count: u64) -> Self {
        match session.phase {
            Phase::Title | Phase::GameOver | Phase::Victory => Self {
                confirm: tick_count % 30 == 0,
                ..Default::default()
            },
            Phase::Playing => {
                let stuck = session.player.on_ground && session.player.vel.x.abs() < 0.5;
                Self {
                    right: true,
                    run_or_fire: true,
                    jump: session.player.on_ground && (stuck || tick_count % 48 < 3),
                    ..Default::default()
                }
            }
            _ => Self::default(),
        }
    }
}

/// Advance the session by one fixed step. `now` is a monotonic wall-clock
/// sample in seconds, used only for the once-per-second level countdown.
pub fn tick(session: &mut Session, input: &TickInput, now: f64) {
    match session.phase {
        Phase::Title => {
            if input.confirm {
                session.reset(now);
                session.phase = Phase::WorldIntro;
                session.world_intro_timer = 0;
                log::info!("run started, seed {}", session.seed);
            }
        }
        Phase::WorldIntro => {
            session.world_intro_timer += 1;
            if session.world_intro_timer >= WORLD_INTRO_TICKS {
                session.phase = Phase::Playing;
                session.last_time_update = now;
            }
        }
        Phase::Playing => tick_playing(session, input, now),
        Phase::Paused => {
            if input.pause || input.confirm {
                session.phase = Phase::Playing;
            } else if input.back_to_title {
                session.phase = Phase::Title;
            }
        }
        Phase::LevelComplete => tick_level_complete(session, now),
        Phase::GameOver => {
            if input.confirm {
                session.phase = Phase::Title;
            }
        }
        Phase::Victory => {
            session.victory_timer += 1;
            if session.victory_timer % 20 == 0 {
                spawn_firework(session);
            }
            for p in &mut session.particles {
                p.update();
            }
            session.particles.retain(|p| p.life > 0);
            if input.confirm {
                session.phase = Phase::Title;
            }
        }
    }
}

fn tick_playing(session: &mut Session, input: &TickInput, now: f64) {
    if input.pause {
        session.phase = Phase::Paused;
        return;
    }
    if input.back_to_title {
        session.phase = Phase::Title;
        return;
    }

    session.time_ticks += 1;

    // Death animation runs the world down while input is ignored
    if session.player.dead {
        session.player.death_timer += 1;
        session.player.vel.y += GRAVITY * 0.5;
        session.player.pos.y += session.player.vel.y;
        update_transients(session);
        if session.player.death_timer >= DEATH_TICKS {
            session.lose_life(now);
        }
        return;
    }

    // Level clock counts wall-clock seconds, not ticks
    if now - session.last_time_update >= 1.0 {
        session.time_remaining -= 1;
        session.last_time_update = now;
        if session.time_remaining <= 0 {
            session.time_remaining = 0;
            log::info!("time expired on {}", session.world_label());
            session.kill_player();
            return;
        }
    }

    session.player.invincibility = session.player.invincibility.saturating_sub(1);
    session.player.star = session.player.star.saturating_sub(1);

    // Flag descent overrides player control until the bottom of the pole
    if session.flag_descending {
        update_flag_descent(session);
        update_transients(session);
        return;
    }

    // Edge-triggered latches, cleared on release
    if !input.jump {
        session.player.jump_was_held = false;
    }
    if input.run_or_fire && !session.player.fire_was_held {
        session.shoot_fireball();
    }
    session.player.fire_was_held = input.run_or_fire;

    session.update_player(input);
    update_player_animation(session, input);

    step_entities(session);
    resolve_player_contacts(session);
    resolve_entity_contacts(session);
    despawn_entities(session);

    update_transients(session);
    update_camera(session);
    check_flag_trigger(session);
    check_axe_trigger(session);
}

fn update_player_animation(session: &mut Session, input: &TickInput) {
    let walking = session.player.on_ground && (input.left != input.right);
    if walking {
        session.player.anim_timer += 1;
        if session.player.anim_timer >= 8 {
            session.player.anim_timer = 0;
            session.player.anim_frame = (session.player.anim_frame + 1) % 3;
        }
    } else {
        session.player.anim_frame = 0;
        session.player.anim_timer = 0;
    }
}

fn step_entities(session: &mut Session) {
    let grid = &session.grid;
    let mut coins_collected = 0u32;
    for entity in &mut session.entities {
        if entity.dead {
            continue;
        }
        // Fireballs bounce along the ground and shatter on walls
        if entity.kind == EntityKind::Fireball {
            let heading = entity.vel.x;
            entity.step(grid);
            if entity.vel.x != heading {
                entity.dead = true;
                continue;
            }
            if entity.vel.y == 0.0 {
                entity.vel.y = -4.0;
            }
            continue;
        }
        if entity.step(grid) {
            coins_collected += 1;
        }
    }
    for _ in 0..coins_collected {
        session.collect_coin();
    }
}

fn resolve_player_contacts(session: &mut Session) {
    // The mercy window suspends all entity contact, pickups included
    if session.player.invincibility > 0 {
        return;
    }
    let hitbox = session.player.hitbox();
    let player_pos = session.player.pos;
    let falling = session.player.vel.y > 0.0;

    for i in 0..session.entities.len() {
        let entity = &session.entities[i];
        if entity.dead || !entity.active || !entity.overlaps(player_pos, hitbox) {
            continue;
        }

        if entity.kind == EntityKind::Coin {
            session.entities[i].dead = true;
            session.collect_coin();
            continue;
        }
        if entity.kind.is_pickup() {
            session.collect_powerup(i);
            continue;
        }
        if !entity.kind.is_hostile() {
            continue;
        }

        // Star power destroys on contact
        if session.player.star > 0 {
            session.destroy_enemy(i);
            continue;
        }

        let entity = &session.entities[i];
        let from_above = falling && player_pos.y + hitbox.y - entity.pos.y < entity.size.y / 2.0;

        // Bowser cannot be stomped, only starred or shot. Any non-stomp
        // contact hurts, a resting shell included.
        if from_above && entity.kind != EntityKind::Bowser {
            session.stomp_enemy(i);
        } else {
            session.damage_player();
        }
    }
}

/// Kicked shells mow down other walkers; fireballs kill any hostile.
fn resolve_entity_contacts(session: &mut Session) {
    for i in 0..session.entities.len() {
        let attacker = &session.entities[i];
        if attacker.dead {
            continue;
        }
        let is_shell =
            attacker.in_shell && attacker.vel.x.abs() >= SHELL_KICK_SPEED - f32::EPSILON;
        let is_fireball = attacker.kind == EntityKind::Fireball;
        if !is_shell && !is_fireball {
            continue;
        }
        let (pos, size) = (attacker.pos, attacker.size);

        for j in 0..session.entities.len() {
            if j == i {
                continue;
            }
            let target = &session.entities[j];
            if target.dead || !target.active || !target.kind.is_hostile() {
                continue;
            }
            if is_shell && !target.kind.is_walker() {
                continue;
            }
            if target.overlaps(pos, size) {
                session.destroy_enemy(j);
                if is_fireball {
                    session.entities[i].dead = true;
                    break;
                }
            }
        }
    }
}

fn despawn_entities(session: &mut Session) {
    let camera_x = session.camera_x;
    session.entities.retain(|e| {
        !e.dead
            && e.pos.x > camera_x - DESPAWN_MARGIN
            && e.pos.x < camera_x + VIEW_WIDTH + DESPAWN_MARGIN
            && e.pos.y < GRID_HEIGHT as f32 * TILE_SIZE + DESPAWN_MARGIN
    });
}

fn update_transients(session: &mut Session) {
    for p in &mut session.particles {
        p.update();
    }
    session.particles.retain(|p| p.life > 0);
    for t in &mut session.floating_texts {
        t.update();
    }
    session.floating_texts.retain(|t| t.life > 0);
}

fn update_camera(session: &mut Session) {
    let level_right = session.grid.width() as f32 * TILE_SIZE;
    let target = (session.player.pos.x - 200.0).clamp(0.0, (level_right - VIEW_WIDTH).max(0.0));
    session.camera_x += (target - session.camera_x) * 0.1;
}

fn check_flag_trigger(session: &mut Session) {
    let Some(flag_x) = session.flag_pole_x else {
        return;
    };
    let player_tile = session.player.pos.x / TILE_SIZE;
    if (player_tile - flag_x as f32).abs() < 1.5 {
        session.flag_descending = true;
        session.flag_y = 2.0 * TILE_SIZE;
        let height = GRID_HEIGHT as f32 * TILE_SIZE - session.player.pos.y;
        let bonus = (height as u64 * 10).max(100);
        session.score += bonus;
        session
            .floating_texts
            .push(FloatingText::new(format!("+{bonus}"), session.player.pos));
        log::info!("flag reached on {}, bonus {bonus}", session.world_label());
    }
}

fn update_flag_descent(session: &mut Session) {
    session.flag_y += 3.0;
    let bottom = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
    // The player rides the pole down alongside the flag
    if session.player.pos.y < bottom {
        session.player.pos.y = (session.player.pos.y + 3.0).min(bottom);
    }
    session.player.vel = Vec2::ZERO;
    if session.flag_y >= bottom {
        session.phase = Phase::LevelComplete;
        session.level_complete_timer = 0;
    }
}

fn check_axe_trigger(session: &mut Session) {
    let Some((ax, ay)) = session.axe else {
        return;
    };
    let axe_pos = Vec2::new(ax as f32 * TILE_SIZE, ay as f32 * TILE_SIZE);
    let hitbox = session.player.hitbox();
    let p = session.player.pos;
    let touching = p.x < axe_pos.x + TILE_SIZE
        && p.x + hitbox.x > axe_pos.x
        && p.y < axe_pos.y + TILE_SIZE
        && p.y + hitbox.y > axe_pos.y;
    if !touching {
        return;
    }

    session.axe = None;
    session.score += 1000;
    session
        .floating_texts
        .push(FloatingText::new("+1000", axe_pos));

    // The bridge collapses and takes the boss with it
    let width = session.grid.width() as i32;
    for ty in 0..GRID_HEIGHT as i32 {
        for tx in 0..width {
            if session.grid.tile_at(tx, ty) == Tile::Bridge {
                session.grid.set_tile(tx, ty, Tile::Air);
            }
        }
    }
    for i in 0..session.entities.len() {
        if session.entities[i].kind == EntityKind::Bowser && !session.entities[i].dead {
            session.destroy_enemy(i);
        }
    }

    log::info!("castle cleared on {}", session.world_label());
    session.phase = Phase::LevelComplete;
    session.level_complete_timer = 0;
}

fn tick_level_complete(session: &mut Session, now: f64) {
    session.level_complete_timer += 1;
    update_transients(session);
    if session.level_complete_timer <= 60 {
        return;
    }
    // Auto-walk off the right edge of the view, then advance
    session.player.pos.x += 2.0;
    session.player.anim_timer += 1;
    if session.player.anim_timer >= 8 {
        session.player.anim_timer = 0;
        session.player.anim_frame = (session.player.anim_frame + 1) % 3;
    }
    if session.player.pos.x > session.camera_x + VIEW_WIDTH + 50.0 {
        advance_level(session, now);
    }
}

fn advance_level(session: &mut Session, now: f64) {
    let bonus = session.time_remaining.max(0) as u64 * 50;
    session.score += bonus;
    log::info!(
        "cleared {} with time bonus {bonus}, score {}",
        session.world_label(),
        session.score
    );

    let (mut world, mut level) = (session.world, session.level + 1);
    if level > 4 {
        level = 1;
        world += 1;
    }
    if world > 8 {
        session.phase = Phase::Victory;
        session.victory_timer = 0;
        log::info!("run complete, final score {}", session.score);
        return;
    }
    session.load_level(world, level, now);
    session.phase = Phase::WorldIntro;
    session.world_intro_timer = 0;
}

fn spawn_firework(session: &mut Session) {
    let center = Vec2::new(
        session.camera_x + session.rng.random_range(0.0..VIEW_WIDTH),
        session.rng.random_range(50.0..VIEW_HEIGHT / 2.0),
    );
    let color = [
        session.rng.random_range(128..=255),
        session.rng.random_range(128..=255),
        session.rng.random_range(128..=255),
    ];
    for _ in 0..12 {
        let vel = Vec2::new(
            session.rng.random_range(-3.0..3.0),
            session.rng.random_range(-3.0..3.0),
        );
        session.particles.push(Particle::new(center, vel, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Entity;
    use crate::sim::grid::TileGrid;
    use crate::sim::state::PowerTier;

    fn start_playing(seed: u64) -> Session {
        let mut session = Session::new(seed);
        tick(
            &mut session,
            &TickInput {
                confirm: true,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(session.phase, Phase::WorldIntro);
        for t in 0..WORLD_INTRO_TICKS {
            tick(&mut session, &TickInput::default(), t as f64 / 60.0);
        }
        assert_eq!(session.phase, Phase::Playing);
        session
    }

    /// Swap in a hand-built flat level so scenarios are terrain-independent
    fn flatten(session: &mut Session) {
        let mut grid = TileGrid::new(300);
        let h = GRID_HEIGHT as i32;
        for x in 0..300 {
            grid.set_tile(x, h - 1, Tile::Ground);
            grid.set_tile(x, h - 2, Tile::Ground);
        }
        session.grid = grid;
        session.entities.clear();
        session.flag_pole_x = None;
        session.axe = None;
        session.player.pos = Vec2::new(96.0, (h as f32 - 3.0) * TILE_SIZE);
        session.camera_x = 0.0;
    }

    #[test]
    fn test_title_confirm_enters_world_intro_then_playing() {
        let session = start_playing(7);
        assert_eq!(session.world, 1);
        assert_eq!(session.level, 1);
        assert_eq!(session.lives, 3);
    }

    #[test]
    fn test_same_seed_and_inputs_reproduce_identically() {
        let run = |seed| {
            let mut session = start_playing(seed);
            let input = TickInput {
                right: true,
                run_or_fire: true,
                jump: true,
                ..Default::default()
            };
            for t in 0..600u64 {
                tick(&mut session, &input, t as f64 / 60.0);
            }
            (
                session.player.pos,
                session.score,
                session.camera_x,
                session.entities.len(),
            )
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_run_right_travels_closed_form_distance() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let start_x = session.player.pos.x;
        let input = TickInput {
            right: true,
            run_or_fire: true,
            ..Default::default()
        };
        let ticks = 90i32;
        for _ in 0..ticks {
            tick(&mut session, &input, 0.0);
        }
        let ramp_ticks = (RUN_SPEED / RUN_ACCEL) as i32;
        let ramp: f32 = (1..=ramp_ticks).map(|t| t as f32 * RUN_ACCEL).sum();
        let expected = ramp + (ticks - ramp_ticks) as f32 * RUN_SPEED;
        assert!((session.player.pos.x - start_x - expected).abs() < 1e-2);
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut session, &pause, 0.0);
        assert_eq!(session.phase, Phase::Paused);

        let frozen = session.player.pos;
        for _ in 0..30 {
            tick(&mut session, &TickInput::default(), 0.0);
        }
        assert_eq!(session.player.pos, frozen);

        tick(&mut session, &pause, 0.0);
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn test_timer_expiry_kills_exactly_once() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.time_remaining = 1;
        session.last_time_update = 0.0;

        tick(&mut session, &TickInput::default(), 1.5);
        assert_eq!(session.time_remaining, 0);
        assert!(session.player.dead);

        // Death countdown proceeds; the clock does not go negative
        let lives_before = session.lives;
        for t in 0..DEATH_TICKS + 1 {
            tick(&mut session, &TickInput::default(), 2.0 + t as f64);
        }
        assert_eq!(session.lives, lives_before - 1);
        assert_eq!(session.phase, Phase::Playing);
    }

    #[test]
    fn test_death_burns_life_and_reloads() {
        let mut session = start_playing(3);
        flatten(&mut session);
        session.kill_player();
        for t in 0..DEATH_TICKS + 1 {
            tick(&mut session, &TickInput::default(), t as f64 / 60.0);
        }
        assert_eq!(session.lives, 2);
        assert_eq!(session.phase, Phase::Playing);
        // Fresh spawn on the reloaded level
        assert_eq!(session.player.pos.x, TILE_SIZE * 3.0);
        assert!(!session.player.dead);
    }

    #[test]
    fn test_last_life_death_is_game_over() {
        let mut session = start_playing(3);
        flatten(&mut session);
        session.lives = 1;
        session.kill_player();
        for t in 0..DEATH_TICKS + 1 {
            tick(&mut session, &TickInput::default(), t as f64 / 60.0);
        }
        assert_eq!(session.phase, Phase::GameOver);

        tick(
            &mut session,
            &TickInput {
                confirm: true,
                ..Default::default()
            },
            0.0,
        );
        assert_eq!(session.phase, Phase::Title);
    }

    #[test]
    fn test_stomp_defeats_goomba_and_bounces() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let ground_y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
        session.entities.push(Entity::new(
            EntityKind::Goomba,
            Vec2::new(session.player.pos.x, ground_y),
        ));
        // Falling so this tick's motion lands the player's feet in the top
        // half of the enemy's box
        session.player.pos.y = ground_y - 28.0;
        session.player.vel.y = 2.0;

        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.entities[0].stomped);
        assert!(session.player.vel.y < 0.0);
        assert_eq!(session.score, 100);
        assert!(!session.player.dead);
    }

    #[test]
    fn test_side_contact_damages_through_tiers() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.player.power = PowerTier::Big;
        let mut goomba = Entity::new(EntityKind::Goomba, session.player.pos);
        goomba.vel = Vec2::ZERO;
        session.entities.push(goomba);

        tick(&mut session, &TickInput::default(), 0.0);
        assert_eq!(session.player.power, PowerTier::Small);
        assert!(session.player.invincibility > 0);
        assert!(!session.player.dead);

        // Mercy window swallows continued contact
        tick(&mut session, &TickInput::default(), 0.0);
        assert!(!session.player.dead);

        session.player.invincibility = 0;
        session.entities[0].pos = session.player.pos;
        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.player.dead);
    }

    #[test]
    fn test_star_contact_destroys_enemy() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.player.star = STAR_TICKS;
        let mut koopa = Entity::new(EntityKind::Koopa, session.player.pos);
        koopa.vel = Vec2::ZERO;
        session.entities.push(koopa);

        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.entities.iter().all(|e| e.kind != EntityKind::Koopa));
        assert_eq!(session.score, 200);
        assert!(!session.player.dead);
    }

    #[test]
    fn test_kicked_shell_destroys_walker() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let ground_y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
        let mut shell = Entity::new(EntityKind::Koopa, Vec2::new(400.0, ground_y));
        shell.in_shell = true;
        shell.vel.x = SHELL_KICK_SPEED;
        session.entities.push(shell);
        let mut victim = Entity::new(EntityKind::Goomba, Vec2::new(430.0, ground_y));
        victim.vel.x = 0.0;
        session.entities.push(victim);
        // Keep the player well away from the collision
        session.player.pos.x = 96.0;

        tick(&mut session, &TickInput::default(), 0.0);
        let goombas = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Goomba)
            .count();
        assert_eq!(goombas, 0);
        // The shell itself survives the hit
        assert!(session.entities.iter().any(|e| e.in_shell));
    }

    #[test]
    fn test_fireball_kills_enemy_and_is_consumed() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let ground_y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
        session.player.power = PowerTier::Fire;
        session.player.pos = Vec2::new(400.0, ground_y);
        let mut goomba = Entity::new(EntityKind::Goomba, Vec2::new(450.0, ground_y));
        goomba.vel.x = 0.0;
        session.entities.push(goomba);

        let fire = TickInput {
            run_or_fire: true,
            ..Default::default()
        };
        tick(&mut session, &fire, 0.0);
        for _ in 0..20 {
            tick(&mut session, &TickInput::default(), 0.0);
        }
        assert!(session.entities.iter().all(|e| e.kind != EntityKind::Goomba));
        assert!(
            session
                .entities
                .iter()
                .all(|e| e.kind != EntityKind::Fireball)
        );
    }

    #[test]
    fn test_fireball_edge_triggered_not_autofire() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.player.power = PowerTier::Fire;
        let fire = TickInput {
            run_or_fire: true,
            ..Default::default()
        };
        tick(&mut session, &fire, 0.0);
        let after_press = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Fireball)
            .count();
        assert_eq!(after_press, 1);

        // Holding does not spawn more
        tick(&mut session, &fire, 0.0);
        let held = session
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Fireball)
            .count();
        assert_eq!(held, 1);
    }

    #[test]
    fn test_camera_follows_and_never_backtracks_past_zero() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let input = TickInput {
            right: true,
            run_or_fire: true,
            ..Default::default()
        };
        for _ in 0..300 {
            tick(&mut session, &input, 0.0);
            assert!(session.camera_x >= 0.0);
        }
        assert!(session.camera_x > 0.0);
        // Smoothed camera trails its moving target by a bounded lag
        let target = session.player.pos.x - 200.0;
        assert!(session.camera_x < target);
        assert!(target - session.camera_x < 100.0);
    }

    #[test]
    fn test_flag_descent_completes_level() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.flag_pole_x = Some(10);
        session.player.pos.x = 10.0 * TILE_SIZE;

        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.flag_descending);
        assert!(session.score > 0);

        for _ in 0..200 {
            tick(&mut session, &TickInput::default(), 0.0);
            if session.phase == Phase::LevelComplete {
                break;
            }
        }
        assert_eq!(session.phase, Phase::LevelComplete);
    }

    #[test]
    fn test_axe_contact_clears_castle() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let h = GRID_HEIGHT as i32;
        session.axe = Some((12, h - 5));
        for x in 8..12 {
            session.grid.set_tile(x, h - 4, Tile::Bridge);
        }
        session.entities.push(Entity::new(
            EntityKind::Bowser,
            Vec2::new(9.0 * TILE_SIZE, (h - 6) as f32 * TILE_SIZE),
        ));
        session.player.pos = Vec2::new(12.0 * TILE_SIZE, (h - 5) as f32 * TILE_SIZE);
        let score_before = session.score;

        tick(&mut session, &TickInput::default(), 0.0);
        assert_eq!(session.phase, Phase::LevelComplete);
        assert!(session.score >= score_before + 1000);
        assert!(session.axe.is_none());
        // Bridge gone, boss destroyed
        assert_eq!(session.grid.tile_at(9, h - 4), Tile::Air);
        assert!(
            session
                .entities
                .iter()
                .all(|e| e.kind != EntityKind::Bowser || e.dead)
        );
    }

    #[test]
    fn test_level_complete_advances_with_time_bonus() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.phase = Phase::LevelComplete;
        session.level_complete_timer = 0;
        session.time_remaining = 100;
        let score_before = session.score;

        for t in 0..2000u64 {
            tick(&mut session, &TickInput::default(), t as f64 / 60.0);
            if session.phase == Phase::WorldIntro {
                break;
            }
        }
        assert_eq!(session.phase, Phase::WorldIntro);
        assert_eq!(session.world, 1);
        assert_eq!(session.level, 2);
        assert_eq!(session.score, score_before + 100 * 50);
    }

    #[test]
    fn test_final_castle_clear_is_victory() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.world = 8;
        session.level = 4;
        session.phase = Phase::LevelComplete;
        session.level_complete_timer = 61;
        session.player.pos.x = session.camera_x + VIEW_WIDTH + 60.0;

        tick(&mut session, &TickInput::default(), 0.0);
        assert_eq!(session.phase, Phase::Victory);

        // Fireworks accumulate during the victory loop
        for _ in 0..40 {
            tick(&mut session, &TickInput::default(), 0.0);
        }
        assert!(!session.particles.is_empty());
    }

    #[test]
    fn test_despawn_culls_entities_behind_camera() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.camera_x = 2000.0;
        session.player.pos.x = 2200.0;
        session.entities.push(Entity::new(
            EntityKind::Goomba,
            Vec2::new(500.0, (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE),
        ));
        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_side_contact_with_resting_shell_damages() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let mut shell = Entity::new(EntityKind::Koopa, session.player.pos);
        shell.in_shell = true;
        shell.vel = Vec2::ZERO;
        session.entities.push(shell);

        tick(&mut session, &TickInput::default(), 0.0);
        // Small player: lethal, and the shell is not kicked
        assert!(session.player.dead);
        assert_eq!(session.entities[0].vel.x, 0.0);
    }

    #[test]
    fn test_coin_contact_collects() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session
            .entities
            .push(Entity::new(EntityKind::Coin, session.player.pos));

        tick(&mut session, &TickInput::default(), 0.0);
        assert_eq!(session.coins, 1);
        assert_eq!(session.score, 200);
        assert!(session.entities.iter().all(|e| e.kind != EntityKind::Coin));
    }

    #[test]
    fn test_despawn_culls_entities_ahead_of_camera() {
        let mut session = start_playing(1);
        flatten(&mut session);
        let ground_y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
        session.entities.push(Entity::new(
            EntityKind::Goomba,
            Vec2::new(session.camera_x + VIEW_WIDTH + DESPAWN_MARGIN + 50.0, ground_y),
        ));
        tick(&mut session, &TickInput::default(), 0.0);
        assert!(session.entities.is_empty());
    }

    #[test]
    fn test_mercy_window_suspends_all_entity_contact() {
        let mut session = start_playing(1);
        flatten(&mut session);
        session.player.invincibility = 100;
        let ground_y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;
        let mut goomba = Entity::new(
            EntityKind::Goomba,
            Vec2::new(session.player.pos.x, ground_y),
        );
        goomba.vel = Vec2::ZERO;
        session.entities.push(goomba);
        // A fall that would otherwise land a stomp
        session.player.pos.y = ground_y - 28.0;
        session.player.vel.y = 2.0;

        tick(&mut session, &TickInput::default(), 0.0);
        assert!(!session.entities[0].stomped);
        assert_eq!(session.score, 0);
        assert!(!session.player.dead);

        // Pickups are suspended too
        session
            .entities
            .push(Entity::new(EntityKind::Mushroom, session.player.pos));
        tick(&mut session, &TickInput::default(), 0.0);
        assert_eq!(session.player.power, PowerTier::Small);
        assert_eq!(session.score, 0);
    }

    #[test]
    fn test_autopilot_starts_a_run_from_title() {
        let mut session = Session::new(9);
        for t in 0..400u64 {
            let input = TickInput::autopilot(&session, t);
            tick(&mut session, &input, t as f64 / 60.0);
        }
        assert_eq!(session.phase, Phase::Playing);
    }
}

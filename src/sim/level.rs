//! Procedural level generation
//!
//! A (world, level) pair deterministically classifies into a theme, then the
//! theme synthesizes a tile grid and an entity spawn list from the session
//! RNG. Generation with a fixed seed is fully reproducible.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind};
use super::grid::{Tile, TileGrid};
use crate::consts::{GRID_HEIGHT, TILE_SIZE};

/// Themed level category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    Overworld,
    Underground,
    Castle,
    Underwater,
}

impl Theme {
    /// Fixed classification rules: level 4 is always a castle, level 2 of
    /// worlds 1/4 goes underground and of worlds 2/7 underwater.
    pub fn classify(world: u32, level: u32) -> Self {
        if level == 4 {
            Theme::Castle
        } else if level == 2 && (world == 1 || world == 4) {
            Theme::Underground
        } else if level == 2 && (world == 2 || world == 7) {
            Theme::Underwater
        } else {
            Theme::Overworld
        }
    }
}

/// Everything a freshly generated level consists of
#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub theme: Theme,
    pub grid: TileGrid,
    /// Flag pole column, if the theme has one
    pub flag_pole_x: Option<i32>,
    /// Axe tile cell ending castle levels
    pub axe: Option<(i32, i32)>,
    pub entities: Vec<Entity>,
}

/// Generate the full layout for (world >= 1, level 1..=4)
pub fn generate_level(world: u32, level: u32, rng: &mut Pcg32) -> LevelLayout {
    let theme = Theme::classify(world, level);
    let width = 200 + (world as usize - 1) * 20 + rng.random_range(0..=50);
    let mut grid = TileGrid::new(width);

    let (flag_pole_x, axe) = match theme {
        Theme::Overworld => (generate_overworld(&mut grid, world, rng), None),
        Theme::Underground => (generate_underground(&mut grid, rng), None),
        Theme::Underwater => (generate_underwater(&mut grid, rng), None),
        Theme::Castle => (None, Some(generate_castle(&mut grid, rng))),
    };

    if let Some(fx) = flag_pole_x {
        place_flag_pole(&mut grid, fx);
    }

    let entities = populate_enemies(&grid, theme, world, level, rng);

    debug_assert_eq!(grid.height(), GRID_HEIGHT);
    log::info!(
        "generated {theme:?} level {world}-{level}: {width} columns, {} entities",
        entities.len()
    );

    LevelLayout {
        theme,
        grid,
        flag_pole_x,
        axe,
        entities,
    }
}

fn generate_overworld(grid: &mut TileGrid, world: u32, rng: &mut Pcg32) -> Option<i32> {
    let width = grid.width() as i32;
    let h = GRID_HEIGHT as i32;

    // Solid ground strip across the bottom two rows
    for x in 0..width {
        grid.set_tile(x, h - 1, Tile::Ground);
        grid.set_tile(x, h - 2, Tile::Ground);
    }

    // Cut gaps into it
    let num_gaps = 3 + world as i32 + rng.random_range(0..=3);
    for i in 0..num_gaps {
        let gap_x = 30 + i * (width / (num_gaps + 1)) + rng.random_range(-10..=10);
        let gap_width = 2 + rng.random_range(0..=2 + world as i32 / 2);
        for x in gap_x..(gap_x + gap_width).min(width) {
            grid.set_tile(x, h - 1, Tile::Air);
            grid.set_tile(x, h - 2, Tile::Air);
        }
    }

    // Scatter platforms, brick rows and stair pyramids
    for i in 0..width / 15 {
        let x = 10 + i * 15 + rng.random_range(0..=8);
        let y = h - 5 - rng.random_range(0..=3);

        match rng.random_range(0..=3) {
            0 => {
                let length = 1 + rng.random_range(0..=4);
                for j in 0..length {
                    let tile = if rng.random::<f32>() < 0.33 {
                        Tile::Question
                    } else {
                        Tile::Brick
                    };
                    grid.set_tile(x + j, y, tile);
                }
            }
            1 => {
                let length = 3 + rng.random_range(0..=5);
                for j in 0..length {
                    grid.set_tile(x + j, y, Tile::Brick);
                }
            }
            2 => {
                let height = 2 + rng.random_range(0..=4);
                for step in 0..height {
                    for w in 0..=step {
                        grid.set_tile(x + w, h - 3 - step, Tile::Hard);
                    }
                }
            }
            _ => {}
        }
    }

    // Pipes
    for i in 0..width / 30 {
        let x = 20 + i * 30 + rng.random_range(0..=15);
        let pipe_height = 2 + rng.random_range(0..=3);
        add_pipe(grid, x, h - 2 - pipe_height, pipe_height);
    }

    // Castle block cluster at the tail with a two-tile entrance cut
    for y in (h - 6)..(h - 2) {
        for x in (width - 6)..(width - 1) {
            grid.set_tile(x, y, Tile::Castle);
        }
    }
    grid.set_tile(width - 4, h - 3, Tile::Air);
    grid.set_tile(width - 4, h - 4, Tile::Air);

    Some(width - 10)
}

fn generate_underground(grid: &mut TileGrid, rng: &mut Pcg32) -> Option<i32> {
    let width = grid.width() as i32;
    let h = GRID_HEIGHT as i32;

    // Solid ceiling and floor
    for x in 0..width {
        grid.set_tile(x, 0, Tile::Brick);
        grid.set_tile(x, 1, Tile::Brick);
        grid.set_tile(x, h - 1, Tile::Hard);
        grid.set_tile(x, h - 2, Tile::Hard);
    }

    // Platform clusters
    for i in 0..width / 20 {
        let x = 15 + i * 20 + rng.random_range(0..=10);
        let y = 4 + rng.random_range(0..=6);
        let length = 3 + rng.random_range(0..=6);
        for j in 0..length {
            let tile = if rng.random::<f32>() < 0.25 {
                Tile::Question
            } else {
                Tile::Brick
            };
            grid.set_tile(x + j, y, tile);
        }
    }

    add_pipe(grid, width - 15, h - 6, 4);

    Some(width - 8)
}

fn generate_castle(grid: &mut TileGrid, rng: &mut Pcg32) -> (i32, i32) {
    let width = grid.width() as i32;
    let h = GRID_HEIGHT as i32;

    // Floor segments alternating with lava pits
    for x in 0..width {
        if x % 20 < 15 || x > width - 30 {
            grid.set_tile(x, h - 1, Tile::Hard);
            grid.set_tile(x, h - 2, Tile::Hard);
        } else {
            grid.set_tile(x, h - 1, Tile::Lava);
        }
    }

    // Ceiling
    for x in 0..width {
        grid.set_tile(x, 0, Tile::Hard);
        grid.set_tile(x, 1, Tile::Hard);
    }

    // Brick platforms
    for i in 0..width / 25 {
        let x = 10 + i * 25;
        let y = 5 + rng.random_range(0..=4);
        let length = 4 + rng.random_range(0..=4);
        for j in 0..length {
            grid.set_tile(x + j, y, Tile::Brick);
        }
    }

    // Bridge over a lava trench near the end
    let bridge_start = width - 25;
    for x in bridge_start..(width - 5) {
        grid.set_tile(x, h - 4, Tile::Bridge);
        grid.set_tile(x, h - 3, Tile::Lava);
        grid.set_tile(x, h - 2, Tile::Lava);
        grid.set_tile(x, h - 1, Tile::Lava);
    }

    // The axe past the bridge ends the level on contact
    let axe = (width - 6, h - 5);
    grid.set_tile(axe.0, axe.1, Tile::Axe);

    // Solid floor after the bridge
    for x in (width - 5)..width {
        grid.set_tile(x, h - 1, Tile::Hard);
        grid.set_tile(x, h - 2, Tile::Hard);
    }

    axe
}

fn generate_underwater(grid: &mut TileGrid, rng: &mut Pcg32) -> Option<i32> {
    let width = grid.width() as i32;
    let h = GRID_HEIGHT as i32;

    // Sandy floor with per-column height jitter
    for x in 0..width {
        let jitter = if rng.random::<f32>() < 0.3 {
            rng.random_range(0..=1)
        } else {
            0
        };
        let floor_top = h - 2 - jitter;
        for y in floor_top..h {
            grid.set_tile(x, y, Tile::Ground);
        }
    }

    // Coral growths
    for i in 0..width / 10 {
        let x = 5 + i * 10 + rng.random_range(0..=5);
        let height = 1 + rng.random_range(0..=3);
        for step in 0..height {
            grid.set_tile(x, h - 3 - step, Tile::Coral);
        }
    }

    // Platforms
    for i in 0..width / 20 {
        let x = 15 + i * 20 + rng.random_range(0..=10);
        let y = 4 + rng.random_range(0..=6);
        let length = 3 + rng.random_range(0..=4);
        for j in 0..length {
            grid.set_tile(x + j, y, Tile::Hard);
        }
    }

    add_pipe(grid, width - 12, h - 6, 4);

    Some(width - 6)
}

/// Two-column pipe: top caps at row `y`, body down to `y + height - 1`
fn add_pipe(grid: &mut TileGrid, x: i32, y: i32, height: i32) {
    let width = grid.width() as i32;
    if x < 0 || x + 1 >= width || y < 0 || y + height >= GRID_HEIGHT as i32 {
        return;
    }
    grid.set_tile(x, y, Tile::PipeTl);
    grid.set_tile(x + 1, y, Tile::PipeTr);
    for row in 1..height {
        grid.set_tile(x, y + row, Tile::PipeBl);
        grid.set_tile(x + 1, y + row, Tile::PipeBr);
    }
}

/// Decorative pole column; non-solid, read by the presentation layer
fn place_flag_pole(grid: &mut TileGrid, fx: i32) {
    let h = GRID_HEIGHT as i32;
    grid.set_tile(fx, 2, Tile::FlagTop);
    for y in 3..(h - 3) {
        grid.set_tile(fx, y, Tile::FlagPole);
    }
}

/// Spawn walking enemies spread across the level, plus the castle boss
fn populate_enemies(
    grid: &TileGrid,
    theme: Theme,
    world: u32,
    level: u32,
    rng: &mut Pcg32,
) -> Vec<Entity> {
    let width = grid.width() as f32;
    let level_px = width * TILE_SIZE;
    let enemy_count = 5 + world * 2 + level;
    let mut entities = Vec::new();

    for i in 0..enemy_count {
        let x = 100.0 + i as f32 * (level_px / enemy_count as f32);
        let y = (GRID_HEIGHT as f32 - 3.0) * TILE_SIZE;

        // Buffer near the very start and very end stays empty
        if x < 200.0 || x > (width - 15.0) * TILE_SIZE {
            continue;
        }

        let kind = if rng.random::<f32>() < 0.67 {
            EntityKind::Goomba
        } else {
            EntityKind::Koopa
        };
        let mut enemy = Entity::new(kind, Vec2::new(x, y));
        enemy.vel.x = if rng.random::<f32>() < 0.5 { -1.0 } else { 1.0 };
        entities.push(enemy);
    }

    if theme == Theme::Castle {
        let boss_pos = Vec2::new(
            (width - 20.0) * TILE_SIZE,
            (GRID_HEIGHT as f32 - 6.0) * TILE_SIZE,
        );
        entities.push(Entity::new(EntityKind::Bowser, boss_pos));
    }

    entities
}

//! Level tile grid and per-tile solidity queries
//!
//! A pure lookup/mutation structure with O(1) access. Every coordinate
//! outside the grid is open air, which lets actors fall off level edges
//! and walk past the last column without special cases.

use serde::{Deserialize, Serialize};

use crate::consts::GRID_HEIGHT;

/// One terrain cell kind. Closed set; solidity is a fixed predicate over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Air,
    Ground,
    Brick,
    Question,
    Used,
    PipeTl,
    PipeTr,
    PipeBl,
    PipeBr,
    Hard,
    Castle,
    FlagPole,
    FlagTop,
    Lava,
    Bridge,
    Axe,
    Cloud,
    Bush,
    Hill,
    Water,
    Coral,
}

impl Tile {
    /// Whether actors collide with this tile
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            Tile::Ground
                | Tile::Brick
                | Tile::Question
                | Tile::Used
                | Tile::Hard
                | Tile::PipeTl
                | Tile::PipeTr
                | Tile::PipeBl
                | Tile::PipeBr
                | Tile::Bridge
                | Tile::Castle
        )
    }
}

/// The level's tile matrix: fixed height, per-level width.
///
/// Row 0 is the top of the viewport; row `GRID_HEIGHT - 1` the bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create an all-air grid `width` columns wide
    pub fn new(width: usize) -> Self {
        assert!(width > 0, "tile grid must have at least one column");
        Self {
            width,
            tiles: vec![Tile::Air; width * GRID_HEIGHT],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        GRID_HEIGHT
    }

    /// Tile at (tx, ty), or `Air` for any out-of-range coordinate
    pub fn tile_at(&self, tx: i32, ty: i32) -> Tile {
        if !self.in_bounds(tx, ty) {
            return Tile::Air;
        }
        self.tiles[ty as usize * self.width + tx as usize]
    }

    /// Set the tile at (tx, ty); out-of-range writes are ignored
    pub fn set_tile(&mut self, tx: i32, ty: i32, tile: Tile) {
        if self.in_bounds(tx, ty) {
            self.tiles[ty as usize * self.width + tx as usize] = tile;
        }
    }

    /// Whether the tile at (tx, ty) blocks movement. Off-grid is never solid.
    pub fn solid(&self, tx: i32, ty: i32) -> bool {
        self.tile_at(tx, ty).is_solid()
    }

    fn in_bounds(&self, tx: i32, ty: i32) -> bool {
        tx >= 0 && (tx as usize) < self.width && ty >= 0 && (ty as usize) < GRID_HEIGHT
    }

    /// Iterate one row left to right
    pub fn row(&self, ty: usize) -> &[Tile] {
        let start = ty * self.width;
        &self.tiles[start..start + self.width]
    }
}

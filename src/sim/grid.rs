//! Tile collision grid
//!
//! Static level geometry keyed by tile cell. Each cell holds a small stack of
//! layered tiles; only `Ground` tiles block movement and only `Resource`
//! tiles can be removed (picked up) at runtime.

use std::collections::{BTreeMap, HashMap};

use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::TILE_SIZE;
use crate::error::LevelError;

/// Tile category, mapped from the level map's tile type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Solid terrain
    Ground,
    /// Collectible firewall charge
    #[serde(alias = "mana")]
    Resource,
    Torch,
    Decoration,
    Background,
}

impl TileKind {
    pub fn is_solid(self) -> bool {
        matches!(self, TileKind::Ground)
    }
}

/// One tile on one layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    /// Sprite variant within the kind
    #[serde(default)]
    pub variant: u16,
}

impl Tile {
    pub const fn new(kind: TileKind) -> Self {
        Self { kind, variant: 0 }
    }
}

/// Tiles stacked in one cell, keyed by layer (lower draws first)
pub type TileStack = BTreeMap<u8, Tile>;

/// Extent of the grid in tile coordinates (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl GridBounds {
    fn single(cell: IVec2) -> Self {
        Self {
            left: cell.x,
            right: cell.x,
            top: cell.y,
            bottom: cell.y,
        }
    }

    fn include(&mut self, cell: IVec2) {
        self.left = self.left.min(cell.x);
        self.right = self.right.max(cell.x);
        self.top = self.top.min(cell.y);
        self.bottom = self.bottom.max(cell.y);
    }
}

/// On-disk map format
#[derive(Debug, Serialize, Deserialize)]
struct MapFile {
    #[serde(default = "default_tile_size")]
    tile_size: u32,
    tiles: Vec<TileRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TileRecord {
    x: i32,
    y: i32,
    #[serde(default)]
    layer: u8,
    kind: TileKind,
    #[serde(default)]
    variant: u16,
}

fn default_tile_size() -> u32 {
    TILE_SIZE as u32
}

/// Layered tile map with collision queries
#[derive(Debug, Clone, Default)]
pub struct TileGrid {
    cells: HashMap<IVec2, TileStack>,
    bounds: Option<GridBounds>,
}

impl TileGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON level map
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let file: MapFile = serde_json::from_str(json)?;
        if file.tile_size != TILE_SIZE as u32 {
            return Err(LevelError::TileSize {
                found: file.tile_size,
                expected: TILE_SIZE as u32,
            });
        }

        let mut grid = Self::new();
        for rec in file.tiles {
            grid.set(
                IVec2::new(rec.x, rec.y),
                rec.layer,
                Tile {
                    kind: rec.kind,
                    variant: rec.variant,
                },
            );
        }
        if grid.solid_count() == 0 {
            return Err(LevelError::NoGround);
        }
        Ok(grid)
    }

    /// Place a tile, replacing whatever was on that layer
    pub fn set(&mut self, cell: IVec2, layer: u8, tile: Tile) {
        self.cells.entry(cell).or_default().insert(layer, tile);
        match &mut self.bounds {
            Some(bounds) => bounds.include(cell),
            None => self.bounds = Some(GridBounds::single(cell)),
        }
    }

    /// Fill an inclusive rectangle of cells
    pub fn fill(&mut self, from: IVec2, to: IVec2, layer: u8, tile: Tile) {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            for x in from.x.min(to.x)..=from.x.max(to.x) {
                self.set(IVec2::new(x, y), layer, tile);
            }
        }
    }

    pub fn bounds(&self) -> Option<GridBounds> {
        self.bounds
    }

    /// Cell containing a world point
    pub fn cell_at(point: Vec2) -> IVec2 {
        (point / TILE_SIZE).floor().as_ivec2()
    }

    /// World rect covered by a cell
    pub fn cell_rect(cell: IVec2) -> Rect {
        Rect::new(
            cell.x as f32 * TILE_SIZE,
            cell.y as f32 * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        )
    }

    /// Layer mapping of the tile under a point, if any
    pub fn tile_at_point(&self, point: Vec2) -> Option<&TileStack> {
        self.cells.get(&Self::cell_at(point))
    }

    /// Rects of solid tiles overlapping the viewport (plus a one-tile apron),
    /// in row-major order
    pub fn blocking_rects(&self, viewport: &Rect) -> Vec<Rect> {
        let min = Self::cell_at(Vec2::new(viewport.left(), viewport.top())) - IVec2::ONE;
        let max = Self::cell_at(Vec2::new(viewport.right(), viewport.bottom())) + IVec2::ONE;

        let mut rects = Vec::new();
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                let cell = IVec2::new(x, y);
                let solid = self
                    .cells
                    .get(&cell)
                    .is_some_and(|stack| stack.values().any(|t| t.kind.is_solid()));
                if solid {
                    rects.push(Self::cell_rect(cell));
                }
            }
        }
        rects
    }

    /// Remove a collectible tile under `point`.
    ///
    /// Returns the centre of the collected cell.
    pub fn take_resource(&mut self, point: Vec2) -> Option<Vec2> {
        let cell = Self::cell_at(point);
        let stack = self.cells.get_mut(&cell)?;
        let layer = stack
            .iter()
            .find(|(_, t)| t.kind == TileKind::Resource)
            .map(|(layer, _)| *layer)?;
        stack.remove(&layer);
        if stack.is_empty() {
            self.cells.remove(&cell);
        }
        Some(Self::cell_rect(cell).center())
    }

    /// Number of collectible tiles left
    pub fn resource_count(&self) -> usize {
        self.count_kind(TileKind::Resource)
    }

    pub fn solid_count(&self) -> usize {
        self.count_kind(TileKind::Ground)
    }

    fn count_kind(&self, kind: TileKind) -> usize {
        self.cells
            .values()
            .flat_map(|stack| stack.values())
            .filter(|t| t.kind == kind)
            .count()
    }
}

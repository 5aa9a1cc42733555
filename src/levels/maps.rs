//! Built-in sector maps
//!
//! Maps are authored as inclusive tile spans. Ground sits on layer 0 and
//! everything drawn over it on layer 1.

use glam::IVec2;

use super::LevelId;
use crate::sim::grid::{Tile, TileGrid, TileKind};

const GROUND: Tile = Tile::new(TileKind::Ground);
const RESOURCE: Tile = Tile::new(TileKind::Resource);
const TORCH: Tile = Tile::new(TileKind::Torch);
const DECORATION: Tile = Tile::new(TileKind::Decoration);

/// Inclusive span `(x0, y0) ..= (x1, y1)`
type Span = (i32, i32, i32, i32);

struct MapSketch {
    ground: &'static [Span],
    resources: &'static [(i32, i32)],
    torches: &'static [(i32, i32)],
    decoration: &'static [Span],
}

const SECTOR1: MapSketch = MapSketch {
    ground: &[
        (0, 15, 69, 17),
        (0, 0, 2, 14),
        (67, 0, 69, 14),
        // Stairs up to the exit ledge
        (46, 12, 49, 14),
        (50, 9, 53, 14),
        (54, 6, 66, 14),
    ],
    resources: &[(38, 14), (39, 14)],
    torches: &[(10, 13), (30, 13), (60, 4)],
    decoration: &[(20, 14, 24, 14)],
};

const SECTOR2: MapSketch = MapSketch {
    ground: &[
        (20, 15, 60, 15),
        (3, 32, 77, 34),
        (0, 0, 2, 34),
        (78, 0, 80, 34),
        // Terminal ledge
        (56, 11, 62, 11),
        // Filter ledge and its step
        (44, 9, 48, 9),
        (40, 12, 42, 12),
    ],
    resources: &[(52, 14), (12, 31), (70, 31)],
    torches: &[(25, 13), (58, 9), (15, 30)],
    decoration: &[(30, 14, 33, 14)],
};

const SECTOR3: MapSketch = MapSketch {
    ground: &[
        (0, 33, 69, 35),
        (0, 0, 2, 32),
        (67, 0, 69, 32),
        (20, 28, 25, 28),
        (40, 28, 45, 28),
    ],
    resources: &[(15, 32), (22, 27), (43, 27)],
    torches: &[(10, 31), (60, 31)],
    decoration: &[(28, 32, 34, 32)],
};

const SECTOR4: MapSketch = MapSketch {
    ground: &[(0, 19, 59, 21), (0, 0, 2, 18), (57, 0, 59, 18)],
    resources: &[(20, 18)],
    torches: &[(8, 17), (50, 17)],
    decoration: &[],
};

fn span(grid: &mut TileGrid, (x0, y0, x1, y1): Span, layer: u8, tile: Tile) {
    grid.fill(IVec2::new(x0, y0), IVec2::new(x1, y1), layer, tile);
}

impl MapSketch {
    fn build(&self) -> TileGrid {
        let mut grid = TileGrid::new();
        for s in self.ground {
            span(&mut grid, *s, 0, GROUND);
        }
        for s in self.decoration {
            span(&mut grid, *s, 1, DECORATION);
        }
        for &(x, y) in self.torches {
            grid.set(IVec2::new(x, y), 1, TORCH);
        }
        for &(x, y) in self.resources {
            grid.set(IVec2::new(x, y), 1, RESOURCE);
        }
        grid
    }
}

pub(super) fn builtin(id: LevelId) -> TileGrid {
    match id {
        LevelId::Sector1 => SECTOR1.build(),
        LevelId::Sector2 => SECTOR2.build(),
        LevelId::Sector3 => SECTOR3.build(),
        LevelId::Sector4 => SECTOR4.build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TILE_SIZE;
    use glam::Vec2;

    #[test]
    fn test_every_map_has_ground_and_resources() {
        for id in LevelId::ALL {
            let grid = builtin(id);
            assert!(grid.solid_count() > 0, "{id}");
            assert!(grid.resource_count() > 0, "{id}");
        }
    }

    #[test]
    fn test_resources_are_not_buried() {
        for (id, sketch) in [
            (LevelId::Sector1, &SECTOR1),
            (LevelId::Sector2, &SECTOR2),
            (LevelId::Sector3, &SECTOR3),
            (LevelId::Sector4, &SECTOR4),
        ] {
            let grid = builtin(id);
            for &(x, y) in sketch.resources {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * TILE_SIZE;
                let stack = grid.tile_at_point(center).unwrap();
                assert!(stack.values().all(|t| !t.kind.is_solid()), "{id} ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_sector1_bounds() {
        let bounds = builtin(LevelId::Sector1).bounds().unwrap();
        assert_eq!((bounds.left, bounds.right, bounds.top, bounds.bottom), (0, 69, 0, 17));
    }
}

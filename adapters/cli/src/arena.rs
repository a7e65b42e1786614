//! Procedural arena standing in for the external map loader.

use anyhow::{ensure, Result};
use jinri_core::{MapLayout, TileCoord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Tile side length used by generated arenas.
pub const TILE_LENGTH: f32 = 32.0;

/// Builds a walled arena with scattered rocks and collectables.
///
/// Tiles are emitted layer by layer: floor decoration first, then terrain,
/// then collectables, each in row-major order.
pub fn generate(columns: u32, rows: u32, seed: u64) -> Result<MapLayout> {
    ensure!(
        columns >= 3 && rows >= 3,
        "arena must be at least 3x3 tiles, got {columns}x{rows}"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut layout = MapLayout::new(columns, rows, TILE_LENGTH);
    let width = i32::try_from(columns)?;
    let height = i32::try_from(rows)?;

    let cells: Vec<TileCoord> = (0..height)
        .flat_map(|row| (0..width).map(move |column| TileCoord::new(column, row)))
        .collect();

    for &cell in &cells {
        layout.push_decoration(cell);
    }

    let mut collectables = Vec::new();
    for &cell in &cells {
        let border = cell.column() == 0
            || cell.row() == 0
            || cell.column() == width - 1
            || cell.row() == height - 1;
        if border || rng.gen_bool(0.08) {
            layout.push_terrain(cell);
        } else if rng.gen_bool(0.02) {
            collectables.push(cell);
        }
    }

    for cell in collectables {
        layout.push_collectable(cell);
    }

    layout.validate()?;
    Ok(layout)
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that places the player and monsters on free
//! tiles.

use std::collections::BTreeSet;

use jinri_core::{ColliderView, Command, Event, Grid, TileCoord};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

const MAX_SPAWN_ATTEMPTS: usize = 4096;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    monster_count: usize,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration placing `monster_count` monsters per map.
    #[must_use]
    pub const fn new(monster_count: usize, rng_seed: u64) -> Self {
        Self {
            monster_count,
            rng_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(10, 0x6a69_6e72_6900_0001)
    }
}

/// Pure system that emits spawn commands when a map loads or the player asks
/// to be placed again.
#[derive(Debug)]
pub struct Spawning {
    monster_count: usize,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            monster_count: config.monster_count,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes world events and emits `SpawnPlayer`/`SpawnMonster` commands.
    ///
    /// `colliders` must reflect the world after the events were produced.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: Grid,
        colliders: &ColliderView,
        tile_length: f32,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::MapLoaded { .. } => {
                    let mut occupied: BTreeSet<TileCoord> =
                        colliders.obstructed_tiles(tile_length).collect();
                    let Some(player) = self.player_tile(grid, &occupied) else {
                        continue;
                    };
                    let _ = occupied.insert(player);
                    out.push(Command::SpawnPlayer { tile: player });

                    for _ in 0..self.monster_count {
                        let columns = 0..grid.columns();
                        let rows = 0..grid.rows();
                        let Some(tile) = self.free_tile(grid, columns, rows, &occupied) else {
                            break;
                        };
                        let _ = occupied.insert(tile);
                        out.push(Command::SpawnMonster { tile });
                    }
                    debug!(player = ?player, monsters = self.monster_count, "spawns queued");
                }
                Event::PlayerRespawnRequested => {
                    let occupied: BTreeSet<TileCoord> =
                        colliders.obstructed_tiles(tile_length).collect();
                    if let Some(tile) = self.player_tile(grid, &occupied) {
                        out.push(Command::SpawnPlayer { tile });
                    }
                }
                _ => {}
            }
        }
    }

    /// Player tiles keep one tile away from the map edge when the map allows.
    fn player_tile(&mut self, grid: Grid, occupied: &BTreeSet<TileCoord>) -> Option<TileCoord> {
        let columns = inner_range(grid.columns());
        let rows = inner_range(grid.rows());
        self.free_tile(grid, columns, rows, occupied)
    }

    fn free_tile(
        &mut self,
        grid: Grid,
        columns: std::ops::Range<u32>,
        rows: std::ops::Range<u32>,
        occupied: &BTreeSet<TileCoord>,
    ) -> Option<TileCoord> {
        if columns.is_empty() || rows.is_empty() {
            return None;
        }

        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let column = self.rng.gen_range(columns.clone());
            let row = self.rng.gen_range(rows.clone());
            let (Ok(column), Ok(row)) = (i32::try_from(column), i32::try_from(row)) else {
                continue;
            };
            let tile = TileCoord::new(column, row);
            if grid.contains(tile) && !occupied.contains(&tile) {
                return Some(tile);
            }
        }

        warn!(attempts = MAX_SPAWN_ATTEMPTS, "no free tile found for spawn");
        None
    }
}

fn inner_range(extent: u32) -> std::ops::Range<u32> {
    if extent > 2 {
        1..extent - 1
    } else {
        0..extent
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Flow-field pathfinding system that plans monster routes toward the player.
//!
//! Every re-path rebuilds a [`FlowField`] inside a square window around the
//! requesting monster. Static colliders and the planned routes of every other
//! monster count as obstacles, which keeps monsters from queueing on the same
//! corridor.

mod flow_field;

use std::collections::{BTreeMap, BTreeSet};

use jinri_core::{
    ColliderView, Command, Event, Grid, MonsterId, MonsterSnapshot, MonsterView, PlayerSnapshot,
    TileCoord, TileRect,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

pub use flow_field::{FlowField, OBSTACLE, UNVISITED};

const WANDER_RADIUS: i32 = 10;

/// Configuration parameters required to construct the pathfinding system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    sensing_range: u32,
    max_path_length: usize,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration.
    ///
    /// `sensing_range` is both the radius of the flow-field window and the
    /// distance at which monsters notice the player.
    #[must_use]
    pub const fn new(sensing_range: u32, max_path_length: usize, rng_seed: u64) -> Self {
        Self {
            sensing_range,
            max_path_length,
            rng_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(15, 250, 0x6a69_6e72_6900_0002)
    }
}

/// Computes single paths over a reusable flow field.
#[derive(Debug)]
pub struct Pathfinder {
    field: FlowField,
    radius: u32,
    max_path_length: usize,
}

impl Pathfinder {
    /// Creates a pathfinder whose window spans `radius` tiles on each side.
    #[must_use]
    pub fn new(grid: Grid, radius: u32, max_path_length: usize) -> Self {
        Self {
            field: FlowField::new(grid),
            radius,
            max_path_length,
        }
    }

    /// Field left behind by the last search.
    #[must_use]
    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// Plans a path from `start` to `goal` around `obstacles`.
    ///
    /// The returned waypoints exclude `start` and the goal tile itself; an empty
    /// path means the monster already stands next to, or on, the goal. Returns
    /// `None` when no route exists inside the window or the route is too long.
    pub fn find_path<I>(
        &mut self,
        start: TileCoord,
        goal: TileCoord,
        obstacles: I,
    ) -> Option<Vec<TileCoord>>
    where
        I: IntoIterator<Item = TileCoord>,
    {
        let grid = self.field.grid();
        let window = TileRect::around(start, self.radius, &grid)?;
        self.field.reload_obstacles(window, obstacles);
        self.field.flood_from(goal);

        let mut path = self.field.descend(start, self.max_path_length)?;
        let _ = path.pop();
        Some(path)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Tracker {
    last_player_tile: Option<TileCoord>,
}

/// Pure system that re-plans monster paths once per frame.
#[derive(Debug)]
pub struct Pathfinding {
    sensing_range: u32,
    max_path_length: usize,
    pathfinder: Option<Pathfinder>,
    trackers: BTreeMap<MonsterId, Tracker>,
    rng: ChaCha8Rng,
}

impl Pathfinding {
    /// Creates a new pathfinding system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            sensing_range: config.sensing_range,
            max_path_length: config.max_path_length,
            pathfinder: None,
            trackers: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes world events and views, emitting `SetMonsterPath` commands.
    ///
    /// Triggers are evaluated once per `TimeAdvanced`. Monsters reported by
    /// `MonstersCollided` are re-planned toward the player when they sense it.
    #[allow(clippy::too_many_arguments)]
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        monsters: &MonsterView,
        colliders: &ColliderView,
        grid: Grid,
        tile_length: f32,
        out: &mut Vec<Command>,
    ) {
        let mut ticked = false;
        let mut collided = BTreeSet::new();
        for event in events {
            match event {
                Event::MapLoaded { .. } => {
                    self.pathfinder = None;
                    self.trackers.clear();
                }
                Event::TimeAdvanced { .. } => ticked = true,
                Event::MonstersCollided { first, second } => {
                    let _ = collided.insert(*first);
                    let _ = collided.insert(*second);
                }
                _ => {}
            }
        }

        if !ticked && collided.is_empty() {
            return;
        }
        if !player.spawned {
            return;
        }

        let static_obstacles: Vec<TileCoord> = colliders.obstructed_tiles(tile_length).collect();
        let mut planned: BTreeMap<MonsterId, Vec<TileCoord>> = monsters
            .iter()
            .map(|monster| (monster.id, monster.path.clone()))
            .collect();
        let player_tile = player.target_tile;

        for monster in monsters.iter().filter(|monster| monster.alive) {
            let start = monster_tile(monster);
            let senses = within_range(start, player_tile, self.sensing_range);
            let tracker = self.trackers.entry(monster.id).or_default();
            let player_moved = tracker.last_player_tile != Some(player_tile);
            if ticked {
                tracker.last_player_tile = Some(player_tile);
            }

            let goal = if !senses {
                None
            } else if collided.contains(&monster.id) || (ticked && player_moved) {
                Some(player_tile)
            } else if ticked
                && planned.get(&monster.id).map_or(true, Vec::is_empty)
                && monster.anchor.column().abs_diff(player_tile.column()) > 1
                && monster.anchor.row().abs_diff(player_tile.row()) > 1
            {
                Some(self.wander_goal(monster.anchor, grid))
            } else {
                None
            };
            let Some(goal) = goal else {
                continue;
            };

            let obstacles: Vec<TileCoord> = planned
                .iter()
                .filter(|(id, _)| **id != monster.id)
                .flat_map(|(_, path)| path.iter().copied())
                .chain(static_obstacles.iter().copied())
                .collect();
            let path = self
                .pathfinder(grid)
                .find_path(start, goal, obstacles)
                .unwrap_or_else(|| {
                    trace!(monster = monster.id.get(), ?goal, "no path found");
                    Vec::new()
                });

            let _ = planned.insert(monster.id, path.clone());
            out.push(Command::SetMonsterPath {
                monster: monster.id,
                goal,
                path,
            });
        }
    }

    fn pathfinder(&mut self, grid: Grid) -> &mut Pathfinder {
        let radius = self.sensing_range;
        let max_path_length = self.max_path_length;
        let pathfinder = self
            .pathfinder
            .get_or_insert_with(|| Pathfinder::new(grid, radius, max_path_length));
        if pathfinder.field().grid() != grid {
            *pathfinder = Pathfinder::new(grid, radius, max_path_length);
        }
        pathfinder
    }

    /// Random goal near `anchor`; a zero offset is nudged by one tile.
    fn wander_goal(&mut self, anchor: TileCoord, grid: Grid) -> TileCoord {
        let mut delta = || {
            let value = self.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS);
            if value == 0 {
                1
            } else {
                value
            }
        };
        let columns = delta();
        let rows = delta();
        grid.clamp(anchor.offset(-columns, -rows))
    }
}

fn monster_tile(monster: &MonsterSnapshot) -> TileCoord {
    TileCoord::from_world(monster.position, 1.0)
}

fn within_range(a: TileCoord, b: TileCoord, range: u32) -> bool {
    a.column().abs_diff(b.column()) <= range && a.row().abs_diff(b.row()) <= range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_grid_path_matches_manhattan_distance() {
        let grid = Grid::new(10, 10);
        let mut pathfinder = Pathfinder::new(grid, 15, 250);

        let path = pathfinder
            .find_path(TileCoord::new(1, 1), TileCoord::new(5, 5), [])
            .unwrap();

        assert_eq!(path.len(), 7);
        let values: Vec<i32> = path
            .iter()
            .map(|tile| pathfinder.field().value(*tile).unwrap())
            .collect();
        assert!(values.windows(2).all(|pair| pair[0] > pair[1]));
        assert_eq!(values.last(), Some(&2));
    }

    #[test]
    fn unreachable_goal_yields_none() {
        let grid = Grid::new(5, 5);
        let mut pathfinder = Pathfinder::new(grid, 15, 250);
        let walls = (0..5).map(|row| TileCoord::new(2, row));

        assert_eq!(
            pathfinder.find_path(TileCoord::new(0, 0), TileCoord::new(4, 4), walls),
            None
        );
    }

    #[test]
    fn window_limits_the_search() {
        let grid = Grid::new(40, 1);
        let mut pathfinder = Pathfinder::new(grid, 3, 250);

        assert_eq!(
            pathfinder.find_path(TileCoord::new(0, 0), TileCoord::new(10, 0), []),
            None
        );
        assert_eq!(
            pathfinder
                .find_path(TileCoord::new(0, 0), TileCoord::new(3, 0), [])
                .map(|path| path.len()),
            Some(2)
        );
    }

    #[test]
    fn wander_goal_never_equals_the_anchor() {
        let mut system = Pathfinding::new(Config::new(15, 250, 3));
        let grid = Grid::new(64, 64);
        let anchor = TileCoord::new(32, 32);

        for _ in 0..200 {
            let goal = system.wander_goal(anchor, grid);
            assert_ne!(goal, anchor);
            assert!(grid.contains(goal));
            assert!(goal.column().abs_diff(32) <= 10);
            assert!(goal.row().abs_diff(32) <= 10);
        }
    }

    #[test]
    fn range_check_uses_both_axes() {
        let origin = TileCoord::new(10, 10);
        assert!(within_range(origin, TileCoord::new(25, 0), 15));
        assert!(!within_range(origin, TileCoord::new(26, 10), 15));
        assert!(!within_range(origin, TileCoord::new(10, 26), 15));
    }
}

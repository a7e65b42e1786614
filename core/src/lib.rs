#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Jinri simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Jinri's Adventure - The unknown ending";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the world's map with the provided tile and collider layout.
    LoadMap {
        /// Layout produced by the external map loader.
        layout: MapLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Places the player on the provided tile, cancelling any walk in progress.
    SpawnPlayer {
        /// Tile the player should occupy.
        tile: TileCoord,
    },
    /// Creates a new monster standing on the provided tile.
    SpawnMonster {
        /// Tile the monster should occupy.
        tile: TileCoord,
    },
    /// Requests that the player begin walking one tile in the given direction.
    MovePlayer {
        /// Direction of the attempted step.
        direction: Direction,
    },
    /// Requests that the player fire a projectile along its current facing.
    FirePlayerProjectile,
    /// Requests that a monster fire a projectile toward a fixed world point.
    FireMonsterProjectile {
        /// Monster that fires.
        monster: MonsterId,
        /// World position the projectile is aimed at when fired.
        target: Vec2,
    },
    /// Replaces the tile path a monster consumes.
    SetMonsterPath {
        /// Monster receiving the path.
        monster: MonsterId,
        /// Goal tile the path was computed toward.
        goal: TileCoord,
        /// Waypoints ordered from the first step onward, goal tile excluded.
        path: Vec<TileCoord>,
    },
    /// Asks the spawning system to place the player on a fresh tile.
    RequestPlayerRespawn,
    /// Restores destroyed terrain and collectables and heals every monster.
    ResetDestruction,
    /// Toggles the debug overlay exposed to the presentation layer.
    SetDebugOverlay {
        /// Whether the overlay should be shown.
        enabled: bool,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a new map was installed.
    MapLoaded {
        /// Number of tile columns in the map.
        columns: u32,
        /// Number of tile rows in the map.
        rows: u32,
    },
    /// Reports that a map layout failed validation and was ignored.
    MapRejected {
        /// Specific reason the layout was rejected.
        reason: MapError,
    },
    /// Confirms that the player was placed on a tile.
    PlayerSpawned {
        /// Tile the player now occupies.
        tile: TileCoord,
    },
    /// Asks listeners to choose a new spawn tile for the player.
    PlayerRespawnRequested,
    /// Confirms that a monster was created.
    MonsterSpawned {
        /// Identifier assigned to the monster.
        monster: MonsterId,
        /// Tile the monster occupies.
        tile: TileCoord,
    },
    /// Announces that the player started walking toward a neighbouring tile.
    PlayerStepStarted {
        /// Tile the player left.
        from: TileCoord,
        /// Tile the player walks toward.
        to: TileCoord,
        /// Direction of travel.
        direction: Direction,
    },
    /// Reports that the player's step was vetoed and abandoned.
    PlayerStepBlocked {
        /// Tile the player attempted to enter.
        target: TileCoord,
    },
    /// Confirms that the player finished a step.
    PlayerArrived {
        /// Tile the player now stands on.
        tile: TileCoord,
    },
    /// Confirms that a projectile entered the world.
    ProjectileFired {
        /// Entity that fired the projectile.
        owner: ProjectileOwner,
        /// World position the projectile started from.
        origin: Vec2,
    },
    /// Reports that a projectile left the world.
    ProjectileDespawned {
        /// Entity that fired the projectile.
        owner: ProjectileOwner,
        /// Why the projectile was removed.
        reason: DespawnReason,
    },
    /// Reports that a projectile destroyed a terrain tile.
    TerrainDestroyed {
        /// Collider that became inert.
        collider: ColliderId,
        /// Tile the collider covered.
        tile: TileCoord,
    },
    /// Reports that a monster lost health.
    MonsterDamaged {
        /// Monster that was hit.
        monster: MonsterId,
        /// Health remaining after the hit.
        health: i32,
    },
    /// Reports that a monster's health reached zero.
    MonsterDefeated {
        /// Monster that became inert.
        monster: MonsterId,
    },
    /// Reports that a monster consumed a waypoint.
    MonsterWaypointReached {
        /// Monster that advanced.
        monster: MonsterId,
        /// Waypoint that was reached.
        tile: TileCoord,
        /// Number of waypoints still queued.
        remaining: usize,
    },
    /// Confirms that a monster received a new path.
    MonsterPathAssigned {
        /// Monster that received the path.
        monster: MonsterId,
        /// Goal tile of the path.
        goal: TileCoord,
        /// Number of waypoints in the path.
        length: usize,
    },
    /// Reports that two monsters overlapped and were pushed back.
    MonstersCollided {
        /// Monster that detected the overlap.
        first: MonsterId,
        /// Monster it overlapped with.
        second: MonsterId,
    },
    /// Reports that the player lost health.
    PlayerDamaged {
        /// Health remaining after the hit.
        health: i32,
    },
    /// Reports that the player's health reached zero and the game ended.
    PlayerDefeated,
    /// Confirms that destroyed colliders were restored.
    DestructionReset {
        /// Number of colliders that left the inert state.
        restored: u32,
    },
    /// Confirms that the debug overlay flag changed.
    DebugOverlayChanged {
        /// Whether the overlay is now shown.
        enabled: bool,
    },
}

/// Unique identifier assigned to a collider by the registry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ColliderId(u32);

impl ColliderId {
    /// Creates a new collider identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a monster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonsterId(u32);

impl MonsterId {
    /// Creates a new monster identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Index of a tile within the layout's tile list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single tile expressed as column and row coordinates.
///
/// Coordinates are signed so that offsets may temporarily leave the grid
/// before callers clamp them with [`Grid::clamp`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    column: i32,
    row: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: i32, row: i32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Returns the coordinate shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, columns: i32, rows: i32) -> Self {
        Self::new(
            self.column.saturating_add(columns),
            self.row.saturating_add(rows),
        )
    }

    /// Returns the neighbouring coordinate one tile away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (columns, rows) = direction.delta();
        self.offset(columns, rows)
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }

    /// Converts a world-space point to the tile containing it.
    #[must_use]
    pub fn from_world(point: Vec2, tile_length: f32) -> Self {
        Self::new(
            (point.x / tile_length).round() as i32,
            (point.y / tile_length).round() as i32,
        )
    }

    /// Upper-left corner of the tile expressed in world units.
    #[must_use]
    pub fn to_world(self, tile_length: f32) -> Vec2 {
        Vec2::new(
            self.column as f32 * tile_length,
            self.row as f32 * tile_length,
        )
    }

    /// Tile position expressed in tile units.
    #[must_use]
    pub fn to_tile_units(self) -> Vec2 {
        Vec2::new(self.column as f32, self.row as f32)
    }
}

/// Fixed-size coordinate space that linearises tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    columns: u32,
    rows: u32,
}

impl Grid {
    /// Creates a grid with the provided dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.columns) * u64::from(self.rows);
        usize::try_from(count).unwrap_or(0)
    }

    /// Reports whether the coordinate lies within `[0, columns) × [0, rows)`.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.column() >= 0
            && tile.row() >= 0
            && i64::from(tile.column()) < i64::from(self.columns)
            && i64::from(tile.row()) < i64::from(self.rows)
    }

    /// Linear index `row * columns + column`, or `None` outside the grid.
    #[must_use]
    pub fn index(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }

        let column = usize::try_from(tile.column()).ok()?;
        let row = usize::try_from(tile.row()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Inverse of [`Grid::index`].
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<TileCoord> {
        if index >= self.cell_count() {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let column = i32::try_from(index % width).ok()?;
        let row = i32::try_from(index / width).ok()?;
        Some(TileCoord::new(column, row))
    }

    /// Clamps the coordinate onto the nearest cell of the grid.
    #[must_use]
    pub fn clamp(&self, tile: TileCoord) -> TileCoord {
        let max_column = i32::try_from(self.columns.saturating_sub(1)).unwrap_or(i32::MAX);
        let max_row = i32::try_from(self.rows.saturating_sub(1)).unwrap_or(i32::MAX);
        TileCoord::new(
            tile.column().clamp(0, max_column),
            tile.row().clamp(0, max_row),
        )
    }
}

/// Inclusive rectangle of tiles, used for bounded search windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    min: TileCoord,
    max: TileCoord,
}

impl TileRect {
    /// Square window of `radius` tiles around `center`, clamped to the grid.
    ///
    /// Returns `None` when the grid has no cells.
    #[must_use]
    pub fn around(center: TileCoord, radius: u32, grid: &Grid) -> Option<Self> {
        if grid.cell_count() == 0 {
            return None;
        }

        let radius = i32::try_from(radius).unwrap_or(i32::MAX);
        let min = grid.clamp(center.offset(-radius, -radius));
        let max = grid.clamp(center.offset(radius, radius));
        Some(Self { min, max })
    }

    /// Upper-left tile of the window.
    #[must_use]
    pub const fn min(&self) -> TileCoord {
        self.min
    }

    /// Lower-right tile of the window, inclusive.
    #[must_use]
    pub const fn max(&self) -> TileCoord {
        self.max
    }

    /// Reports whether the tile lies inside the window.
    #[must_use]
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.column() >= self.min.column()
            && tile.column() <= self.max.column()
            && tile.row() >= self.min.row()
            && tile.row() <= self.max.row()
    }

    /// Iterates the window's tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> {
        let min = self.min;
        let max = self.max;
        (min.row()..=max.row())
            .flat_map(move |row| (min.column()..=max.column()).map(move |column| (column, row)))
            .map(|(column, row)| TileCoord::new(column, row))
    }
}

/// Closed set of collider tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderKind {
    /// Destructible map terrain that blocks movement.
    Terrain,
    /// Collectable item that currently only blocks movement.
    Collectable,
    /// Collider owned by a monster.
    Monster,
    /// Collider owned by a live projectile.
    Projectile,
    /// Collider that follows the player's target tile.
    Player,
    /// Destroyed or consumed collider excluded from every query.
    Inert,
}

impl ColliderKind {
    /// Reports whether the collider is excluded from collision queries.
    #[must_use]
    pub const fn is_inert(self) -> bool {
        matches!(self, Self::Inert)
    }

    /// Reports whether the collider may be declared by a map layout.
    #[must_use]
    pub const fn is_map_kind(self) -> bool {
        matches!(self, Self::Terrain | Self::Collectable)
    }

    /// Reports whether an aligned collider of this kind obstructs monster paths.
    #[must_use]
    pub const fn obstructs_paths(self) -> bool {
        matches!(self, Self::Terrain | Self::Collectable | Self::Monster)
    }
}

/// Cardinal movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Tile delta `(columns, rows)` for a single step.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Unit velocity vector in world space (rows grow downward).
    #[must_use]
    pub fn unit(self) -> Vec2 {
        let (columns, rows) = self.delta();
        Vec2::new(columns as f32, rows as f32)
    }

    /// Reports whether travel happens along the horizontal axis.
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}

/// Facing state of the player: one of the eight idle/walking directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facing {
    /// Direction the player faces.
    pub direction: Direction,
    /// Whether the player is currently walking.
    pub walking: bool,
}

impl Facing {
    /// Idle facing toward `direction`.
    #[must_use]
    pub const fn idle(direction: Direction) -> Self {
        Self {
            direction,
            walking: false,
        }
    }

    /// Walking facing toward `direction`.
    #[must_use]
    pub const fn walking(direction: Direction) -> Self {
        Self {
            direction,
            walking: true,
        }
    }
}

impl Default for Facing {
    fn default() -> Self {
        Self::idle(Direction::South)
    }
}

/// Entity that fired a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectileOwner {
    /// Projectile fired by the player.
    Player,
    /// Projectile fired by the identified monster.
    Monster(MonsterId),
}

/// Reasons a projectile may be removed from the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DespawnReason {
    /// The projectile left the camera viewport.
    LeftViewport,
    /// The projectile travelled past its maximum range.
    OutOfRange,
    /// The projectile hit a collider.
    Hit,
    /// The monster that owned the projectile was defeated.
    OwnerDefeated,
}

/// Whether the game is still being played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// The simulation advances normally.
    #[default]
    Running,
    /// The player was defeated; the presentation layer shows the end state.
    Ended,
}

/// Tunable constants of the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Player walking speed in world units per second.
    pub speed: f32,
    /// Radius in tiles within which monsters sense the player.
    pub sensing_range: u32,
    /// Maximum distance, in tiles, a player projectile travels from its spawn.
    pub projectile_range_tiles: f32,
    /// Size of projectile colliders in world units.
    pub projectile_size: Vec2,
    /// Health the player starts with.
    pub player_max_health: i32,
    /// Health every monster starts with.
    pub monster_max_health: i32,
    /// Damage dealt to a monster by a player projectile.
    pub player_projectile_damage: i32,
    /// Damage dealt to the player by a monster projectile.
    pub monster_projectile_damage: i32,
    /// Paths longer than this many tiles are discarded.
    pub max_path_length: usize,
    /// Size of the camera viewport in world units.
    pub view_size: Vec2,
    /// Distance in world units under which a walking entity snaps to its target.
    pub arrival_epsilon: f32,
    /// Distance in tile units under which a monster snaps to its waypoint.
    pub waypoint_epsilon: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: 150.0,
            sensing_range: 15,
            projectile_range_tiles: 6.0,
            projectile_size: Vec2::new(16.0, 16.0),
            player_max_health: 100,
            monster_max_health: 100,
            player_projectile_damage: 50,
            monster_projectile_damage: 10,
            max_path_length: 250,
            view_size: Vec2::new(1024.0, 832.0),
            arrival_epsilon: 1.0,
            waypoint_epsilon: 0.1,
        }
    }
}

/// Tile placed by the external map loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Grid position of the tile.
    pub position: TileCoord,
    /// Opaque sprite-sheet offset carried through for the presentation layer.
    pub sheet_offset: [u32; 2],
}

/// Collider placed by the external map loader.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColliderSpec {
    /// Tag of the collider; only terrain and collectables are accepted.
    pub kind: ColliderKind,
    /// Upper-left corner in world units.
    pub position: Vec2,
    /// Extent in world units.
    pub size: Vec2,
    /// Tile the collider represents.
    pub tile: Option<TileId>,
}

/// Parsed map handed to the world: dimensions plus ordered tiles and colliders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Tiles in loader order (layer order, then row-major).
    pub tiles: Vec<TileSpec>,
    /// Colliders in loader order.
    pub colliders: Vec<ColliderSpec>,
}

impl MapLayout {
    /// Creates an empty layout with the provided dimensions.
    #[must_use]
    pub fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            columns,
            rows,
            tile_length,
            tiles: Vec::new(),
            colliders: Vec::new(),
        }
    }

    /// Grid described by the layout.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        Grid::new(self.columns, self.rows)
    }

    /// Appends a tile with no collider, such as floor decoration.
    pub fn push_decoration(&mut self, position: TileCoord) {
        self.tiles.push(TileSpec {
            position,
            sheet_offset: [0, 0],
        });
    }

    /// Appends a tile together with a terrain collider covering it.
    pub fn push_terrain(&mut self, position: TileCoord) {
        self.push_tile_with_collider(position, ColliderKind::Terrain);
    }

    /// Appends a tile together with a collectable collider covering it.
    pub fn push_collectable(&mut self, position: TileCoord) {
        self.push_tile_with_collider(position, ColliderKind::Collectable);
    }

    /// Builder form of [`MapLayout::push_terrain`].
    #[must_use]
    pub fn with_terrain(mut self, position: TileCoord) -> Self {
        self.push_terrain(position);
        self
    }

    /// Builder form of [`MapLayout::push_collectable`].
    #[must_use]
    pub fn with_collectable(mut self, position: TileCoord) -> Self {
        self.push_collectable(position);
        self
    }

    fn push_tile_with_collider(&mut self, position: TileCoord, kind: ColliderKind) {
        let tile = TileId::new(u32::try_from(self.tiles.len()).unwrap_or(u32::MAX));
        self.push_decoration(position);
        self.colliders.push(ColliderSpec {
            kind,
            position: position.to_world(self.tile_length),
            size: Vec2::splat(self.tile_length),
            tile: Some(tile),
        });
    }

    /// Checks the structural invariants the world relies on.
    pub fn validate(&self) -> Result<(), MapError> {
        let grid = self.grid();
        if grid.cell_count() == 0 {
            return Err(MapError::EmptyGrid);
        }

        if self.tile_length.is_nan() || self.tile_length <= 0.0 {
            return Err(MapError::InvalidTileLength {
                tile_length: self.tile_length,
            });
        }

        for (index, tile) in self.tiles.iter().enumerate() {
            if !grid.contains(tile.position) {
                return Err(MapError::TileOutOfBounds {
                    index,
                    column: tile.position.column(),
                    row: tile.position.row(),
                });
            }
        }

        let mut referenced = vec![false; self.tiles.len()];
        for (index, collider) in self.colliders.iter().enumerate() {
            if !collider.kind.is_map_kind() {
                return Err(MapError::UnsupportedKind {
                    collider: index,
                    kind: collider.kind,
                });
            }

            let Some(tile) = collider.tile else {
                return Err(MapError::MissingTileReference {
                    collider: index,
                    kind: collider.kind,
                });
            };

            let slot = usize::try_from(tile.get())
                .ok()
                .and_then(|slot| referenced.get_mut(slot));
            match slot {
                None => {
                    return Err(MapError::MissingTile {
                        collider: index,
                        tile: tile.get(),
                    })
                }
                Some(seen) if *seen => {
                    return Err(MapError::DuplicateTileReference { tile: tile.get() })
                }
                Some(seen) => *seen = true,
            }
        }

        Ok(())
    }
}

/// Reasons a map layout may be rejected by the world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum MapError {
    /// The layout declares zero columns or rows.
    #[error("map grid must contain at least one tile")]
    EmptyGrid,
    /// The tile length is zero, negative, or not a number.
    #[error("tile length must be positive, found {tile_length}")]
    InvalidTileLength {
        /// Offending tile length.
        tile_length: f32,
    },
    /// A tile lies outside the declared grid.
    #[error("tile {index} at ({column}, {row}) lies outside the grid")]
    TileOutOfBounds {
        /// Position of the tile in the layout.
        index: usize,
        /// Column of the tile.
        column: i32,
        /// Row of the tile.
        row: i32,
    },
    /// A collider names a tile index that does not exist.
    #[error("collider {collider} references missing tile {tile}")]
    MissingTile {
        /// Position of the collider in the layout.
        collider: usize,
        /// Tile index it referenced.
        tile: u32,
    },
    /// A terrain or collectable collider has no tile.
    #[error("collider {collider} of kind {kind:?} must reference a tile")]
    MissingTileReference {
        /// Position of the collider in the layout.
        collider: usize,
        /// Kind of the collider.
        kind: ColliderKind,
    },
    /// Two colliders claim the same tile.
    #[error("tile {tile} is referenced by more than one collider")]
    DuplicateTileReference {
        /// Tile index claimed twice.
        tile: u32,
    },
    /// The collider kind is owned by the simulation, not the map.
    #[error("collider {collider} has kind {kind:?}, which maps cannot declare")]
    UnsupportedKind {
        /// Position of the collider in the layout.
        collider: usize,
        /// Kind of the collider.
        kind: ColliderKind,
    },
}

/// Immutable representation of the player used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Continuous position of the upper-left corner in world units.
    pub position: Vec2,
    /// World position the player walks toward.
    pub target: Vec2,
    /// Tile containing [`PlayerSnapshot::target`].
    pub target_tile: TileCoord,
    /// Facing and walking state.
    pub facing: Facing,
    /// Whether the horizontal axis is in motion.
    pub walking_x: bool,
    /// Whether the vertical axis is in motion.
    pub walking_y: bool,
    /// Remaining health.
    pub health: i32,
    /// Whether the player was placed on the map.
    pub spawned: bool,
}

/// Immutable representation of a single monster used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct MonsterSnapshot {
    /// Unique identifier assigned to the monster.
    pub id: MonsterId,
    /// Continuous position in tile units.
    pub position: Vec2,
    /// Last tile the monster was aligned with.
    pub anchor: TileCoord,
    /// Remaining health.
    pub health: i32,
    /// Whether the monster is still active.
    pub alive: bool,
    /// Waypoints still to be consumed.
    pub path: Vec<TileCoord>,
    /// Goal of the current path, if any.
    pub goal: Option<TileCoord>,
    /// Whether the monster currently has a projectile in flight.
    pub projectile_live: bool,
    /// Collider owned by the monster.
    pub collider: ColliderId,
}

/// Read-only snapshot describing all monsters.
#[derive(Clone, Debug, Default)]
pub struct MonsterView {
    snapshots: Vec<MonsterSnapshot>,
}

impl MonsterView {
    /// Creates a new monster view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<MonsterSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured monster snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &MonsterSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a monster by identifier.
    #[must_use]
    pub fn get(&self, id: MonsterId) -> Option<&MonsterSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<MonsterSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a registered collider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColliderSnapshot {
    /// Identifier of the collider.
    pub id: ColliderId,
    /// Current tag.
    pub kind: ColliderKind,
    /// Upper-left corner in world units.
    pub position: Vec2,
    /// Extent in world units.
    pub size: Vec2,
}

impl ColliderSnapshot {
    /// Tile the collider sits on, when its position is exactly tile-aligned.
    #[must_use]
    pub fn aligned_tile(&self, tile_length: f32) -> Option<TileCoord> {
        let column = self.position.x / tile_length;
        let row = self.position.y / tile_length;
        if column.fract() != 0.0 || row.fract() != 0.0 {
            return None;
        }

        Some(TileCoord::new(column as i32, row as i32))
    }
}

/// Read-only snapshot of the collider registry in registry order.
#[derive(Clone, Debug, Default)]
pub struct ColliderView {
    snapshots: Vec<ColliderSnapshot>,
}

impl ColliderView {
    /// Creates a new collider view; snapshots must already be in registry order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<ColliderSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured collider snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &ColliderSnapshot> {
        self.snapshots.iter()
    }

    /// Tiles occupied by active colliders that obstruct movement.
    pub fn obstructed_tiles(&self, tile_length: f32) -> impl Iterator<Item = TileCoord> + '_ {
        self.snapshots
            .iter()
            .filter(|snapshot| snapshot.kind.obstructs_paths())
            .filter_map(move |snapshot| snapshot.aligned_tile(tile_length))
    }
}

/// Immutable representation of a live projectile.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSnapshot {
    /// Entity that fired the projectile.
    pub owner: ProjectileOwner,
    /// Spawn position in world units.
    pub start: Vec2,
    /// Current position in world units.
    pub position: Vec2,
    /// Extent in world units.
    pub size: Vec2,
    /// Velocity in world units per second.
    pub velocity: Vec2,
}

/// Counters exposed to the debug overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugCounters {
    /// Colliders within one tile of the player's target at the last check.
    pub possible_collidables: u32,
    /// Non-destroyed tiles intersecting the viewport.
    pub tiles_in_view: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_index_is_row_major() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.index(TileCoord::new(0, 0)), Some(0));
        assert_eq!(grid.index(TileCoord::new(3, 2)), Some(23));
        assert_eq!(grid.coord_of(23), Some(TileCoord::new(3, 2)));
    }

    #[test]
    fn grid_index_rejects_out_of_bounds() {
        let grid = Grid::new(10, 4);
        assert_eq!(grid.index(TileCoord::new(10, 0)), None);
        assert_eq!(grid.index(TileCoord::new(0, 4)), None);
        assert_eq!(grid.index(TileCoord::new(-1, 0)), None);
        assert_eq!(grid.coord_of(40), None);
    }

    #[test]
    fn window_is_clamped_to_grid() {
        let grid = Grid::new(8, 6);
        let window = TileRect::around(TileCoord::new(1, 5), 3, &grid).expect("window");

        assert_eq!(window.min(), TileCoord::new(0, 2));
        assert_eq!(window.max(), TileCoord::new(4, 5));
        assert_eq!(window.iter().count(), 5 * 4);
        assert!(TileRect::around(TileCoord::new(0, 0), 3, &Grid::new(0, 0)).is_none());
    }

    #[test]
    fn step_follows_direction() {
        let origin = TileCoord::new(3, 3);
        assert_eq!(origin.step(Direction::North), TileCoord::new(3, 2));
        assert_eq!(origin.step(Direction::East), TileCoord::new(4, 3));
        assert_eq!(origin.step(Direction::South), TileCoord::new(3, 4));
        assert_eq!(origin.step(Direction::West), TileCoord::new(2, 3));
    }

    #[test]
    fn layout_builder_links_colliders_to_tiles() {
        let layout = MapLayout::new(4, 4, 32.0)
            .with_terrain(TileCoord::new(1, 2))
            .with_collectable(TileCoord::new(3, 0));

        assert_eq!(layout.tiles.len(), 2);
        assert_eq!(layout.colliders[0].position, Vec2::new(32.0, 64.0));
        assert_eq!(layout.colliders[1].tile, Some(TileId::new(1)));
        assert_eq!(layout.validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_shared_tiles() {
        let mut layout = MapLayout::new(4, 4, 32.0).with_terrain(TileCoord::new(1, 1));
        let duplicate = layout.colliders[0];
        layout.colliders.push(duplicate);

        assert_eq!(
            layout.validate(),
            Err(MapError::DuplicateTileReference { tile: 0 })
        );
    }

    #[test]
    fn validation_rejects_simulation_owned_kinds() {
        let mut layout = MapLayout::new(4, 4, 32.0).with_terrain(TileCoord::new(1, 1));
        layout.colliders[0].kind = ColliderKind::Monster;

        assert_eq!(
            layout.validate(),
            Err(MapError::UnsupportedKind {
                collider: 0,
                kind: ColliderKind::Monster,
            })
        );
    }

    #[test]
    fn validation_rejects_tiles_outside_grid() {
        let layout = MapLayout::new(4, 4, 32.0).with_terrain(TileCoord::new(4, 0));

        assert!(matches!(
            layout.validate(),
            Err(MapError::TileOutOfBounds { index: 0, .. })
        ));
        assert_eq!(
            MapLayout::new(0, 4, 32.0).validate(),
            Err(MapError::EmptyGrid)
        );
    }

    #[test]
    fn aligned_tile_requires_exact_alignment() {
        let mut snapshot = ColliderSnapshot {
            id: ColliderId::new(0),
            kind: ColliderKind::Monster,
            position: Vec2::new(64.0, 96.0),
            size: Vec2::splat(32.0),
        };
        assert_eq!(snapshot.aligned_tile(32.0), Some(TileCoord::new(2, 3)));

        snapshot.position.x = 70.0;
        assert_eq!(snapshot.aligned_tile(32.0), None);
    }

    #[test]
    fn layout_round_trips_through_bincode() {
        let layout = MapLayout::new(6, 5, 32.0)
            .with_terrain(TileCoord::new(2, 2))
            .with_collectable(TileCoord::new(4, 1));

        let bytes = bincode::serialize(&layout).expect("serialize");
        let restored: MapLayout = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, layout);
    }
}

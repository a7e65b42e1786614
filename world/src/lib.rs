#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Jinri's Adventure.
//!
//! The world owns the collider registry, the player and monster movement
//! controllers, projectiles, and the camera. Every mutation goes through
//! [`apply`]; systems observe the outcome through [`query`].

mod collision;
mod movement;
mod projectiles;
mod registry;

use std::collections::VecDeque;

use glam::Vec2;
use jinri_core::{
    ColliderId, ColliderKind, Command, DebugCounters, DespawnReason, Event, GameStatus, Grid,
    MonsterId, ProjectileOwner, SimulationConfig, TileCoord, WELCOME_BANNER,
};
use tracing::{debug, info, trace, warn};

pub use collision::{rects_overlap, tiles_coincide, Aabb};
pub use projectiles::Viewport;
pub use registry::Tile;

use collision::check_collisions;
use movement::{Monster, PlayerBody};
use projectiles::Projectile;
use registry::ColliderRegistry;

const DEFAULT_TILE_LENGTH: f32 = 32.0;

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: SimulationConfig,
    grid: Grid,
    tile_length: f32,
    registry: ColliderRegistry,
    player: PlayerBody,
    player_projectile: Option<Projectile>,
    player_projectile_slot: ColliderId,
    monsters: Vec<Monster>,
    next_monster_id: u32,
    viewport: Viewport,
    status: GameStatus,
    debug_overlay: bool,
    counters: DebugCounters,
    tick_index: u64,
}

impl World {
    /// Creates an empty world with the default simulation constants.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates an empty world using the provided simulation constants.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        let mut registry = ColliderRegistry::default();
        let player_collider = registry.register(
            ColliderKind::Player,
            Vec2::ZERO,
            Vec2::splat(DEFAULT_TILE_LENGTH),
        );
        let player_projectile_slot = registry.register_slot(ColliderKind::Projectile);
        let player = PlayerBody::new(player_collider, config.player_max_health);

        Self {
            banner: WELCOME_BANNER,
            viewport: Viewport::follow(Vec2::ZERO, config.view_size, Vec2::ZERO),
            config,
            grid: Grid::default(),
            tile_length: DEFAULT_TILE_LENGTH,
            registry,
            player,
            player_projectile: None,
            player_projectile_slot,
            monsters: Vec::new(),
            next_monster_id: 0,
            status: GameStatus::Running,
            debug_overlay: false,
            counters: DebugCounters::default(),
            tick_index: 0,
        }
    }

    fn map_size(&self) -> Vec2 {
        Vec2::new(self.grid.columns() as f32, self.grid.rows() as f32) * self.tile_length
    }

    fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.iter_mut().find(|monster| monster.id == id)
    }

    fn is_alive(&self, monster: &Monster) -> bool {
        self.registry.kind(monster.collider) == Some(ColliderKind::Monster)
    }

    fn retire_player_projectile(&mut self) {
        if let Some(projectile) = self.player_projectile.take() {
            let _ = self.registry.mark_destroyed(projectile.collider);
        }
    }

    fn step_player_projectile(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let Some(projectile) = self.player_projectile.as_mut() else {
            return;
        };

        projectile.advance(seconds);
        self.registry
            .set_position(projectile.collider, projectile.position);

        let reason = if !self.viewport.contains(projectile.position) {
            Some(DespawnReason::LeftViewport)
        } else if projectile
            .exceeded_range(self.config.projectile_range_tiles * self.tile_length)
        {
            Some(DespawnReason::OutOfRange)
        } else {
            None
        };

        if let Some(reason) = reason {
            trace!(?reason, "player projectile despawned");
            self.retire_player_projectile();
            out_events.push(Event::ProjectileDespawned {
                owner: ProjectileOwner::Player,
                reason,
            });
        }
    }

    fn resolve_player_collisions(&mut self, out_events: &mut Vec<Event>) -> bool {
        let player_box = Aabb::new(self.player.target, Vec2::splat(self.tile_length));
        let projectile_box = self.player_projectile.as_ref().map(Projectile::bounds);
        let report = check_collisions(
            &mut self.registry,
            &player_box,
            projectile_box.as_ref(),
            self.tile_length,
            out_events,
        );

        self.counters.possible_collidables = report.possible_collidables;
        if report.projectile_consumed {
            self.retire_player_projectile();
        }
        report.blocked
    }

    fn step_player(&mut self, seconds: f32, blocked: bool, out_events: &mut Vec<Event>) {
        if self.player.walk.is_none() {
            return;
        }

        if blocked {
            let target = self.player.target_tile(self.tile_length);
            self.player.cancel();
            out_events.push(Event::PlayerStepBlocked { target });
        } else if self.player.advance(
            self.config.speed * seconds,
            self.config.arrival_epsilon,
            self.tile_length,
        ) {
            let tile = TileCoord::from_world(self.player.position, self.tile_length);
            out_events.push(Event::PlayerArrived { tile });
        }

        self.registry
            .set_position(self.player.collider, self.player.position);
    }

    fn resolve_projectile_hits(&mut self, out_events: &mut Vec<Event>) {
        let Some(shot) = self.player_projectile.as_ref().map(Projectile::bounds) else {
            return;
        };

        let damage = self.config.player_projectile_damage;
        let mut hit = false;
        for monster in &mut self.monsters {
            if self.registry.kind(monster.collider) != Some(ColliderKind::Monster) {
                continue;
            }
            let Some(bounds) = self.registry.get(monster.collider).map(|c| c.bounds()) else {
                continue;
            };
            if !rects_overlap(&shot, &bounds) {
                continue;
            }

            hit = true;
            monster.health -= damage;
            out_events.push(Event::MonsterDamaged {
                monster: monster.id,
                health: monster.health,
            });

            if monster.health <= 0 {
                let _ = self.registry.mark_destroyed(monster.collider);
                monster.clear_path();
                debug!(monster = monster.id.get(), "monster defeated");
                out_events.push(Event::MonsterDefeated {
                    monster: monster.id,
                });
                if let Some(projectile) = monster.projectile.take() {
                    let _ = self.registry.mark_destroyed(projectile.collider);
                    out_events.push(Event::ProjectileDespawned {
                        owner: projectile.owner,
                        reason: DespawnReason::OwnerDefeated,
                    });
                }
            }
            break;
        }

        if hit {
            self.retire_player_projectile();
            out_events.push(Event::ProjectileDespawned {
                owner: ProjectileOwner::Player,
                reason: DespawnReason::Hit,
            });
        }
    }

    fn step_monsters(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let step = self.config.speed / 2.0 * seconds / self.tile_length;
        let epsilon = self.config.waypoint_epsilon;
        let mut moved = Vec::new();

        for (index, monster) in self.monsters.iter_mut().enumerate() {
            monster.previous = monster.position;
            if self.registry.kind(monster.collider) != Some(ColliderKind::Monster) {
                continue;
            }
            if monster.path.is_empty() {
                continue;
            }

            if let Some(tile) = monster.advance_along_path(step, epsilon) {
                out_events.push(Event::MonsterWaypointReached {
                    monster: monster.id,
                    tile,
                    remaining: monster.path.len(),
                });
            }
            self.registry
                .set_position(monster.collider, monster.position * self.tile_length);
            moved.push(index);
        }

        for index in moved {
            self.separate_monster(index, out_events);
        }
    }

    fn monster_bounds(&self, monster: &Monster) -> Aabb {
        Aabb::new(
            monster.position * self.tile_length,
            Vec2::splat(self.tile_length),
        )
    }

    fn separate_monster(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let Some(mover) = self.monsters.get(index) else {
            return;
        };
        let bounds = self.monster_bounds(mover);

        let other = self.monsters.iter().enumerate().position(|(other, monster)| {
            other != index
                && self.is_alive(monster)
                && rects_overlap(&bounds, &self.monster_bounds(monster))
        });
        let Some(other) = other else {
            return;
        };

        let mut pair = [None, None];
        for (slot, position) in [index, other].into_iter().enumerate() {
            if let Some(monster) = self.monsters.get_mut(position) {
                monster.position = monster.previous;
                monster.clear_path();
                let collider = monster.collider;
                let world_position = monster.position * self.tile_length;
                pair[slot] = Some(monster.id);
                self.registry.set_position(collider, world_position);
            }
        }

        if let [Some(first), Some(second)] = pair {
            trace!(first = first.get(), second = second.get(), "monsters collided");
            out_events.push(Event::MonstersCollided { first, second });
        }
    }

    fn step_monster_projectiles(&mut self, seconds: f32, out_events: &mut Vec<Event>) {
        let player_box = Aabb::new(self.player.position, Vec2::splat(self.tile_length));
        let leash = self.config.sensing_range as f32 * self.tile_length / 2.0;
        let half_tile = Vec2::splat(self.tile_length / 2.0);

        for monster in &mut self.monsters {
            let Some(projectile) = monster.projectile.as_mut() else {
                continue;
            };

            projectile.advance(seconds);
            self.registry
                .set_position(projectile.collider, projectile.position);

            let owner_center = monster.position * self.tile_length + half_tile;
            let reason = if projectile.center().distance(owner_center) > leash {
                Some(DespawnReason::OutOfRange)
            } else if self.player.spawned && rects_overlap(&projectile.bounds(), &player_box) {
                Some(DespawnReason::Hit)
            } else {
                None
            };
            let Some(reason) = reason else {
                continue;
            };

            let owner = projectile.owner;
            let collider = projectile.collider;
            monster.projectile = None;
            let _ = self.registry.mark_destroyed(collider);
            out_events.push(Event::ProjectileDespawned { owner, reason });

            if reason != DespawnReason::Hit {
                continue;
            }

            self.player.health -= self.config.monster_projectile_damage;
            out_events.push(Event::PlayerDamaged {
                health: self.player.health,
            });
            if self.player.health <= 0 {
                self.status = GameStatus::Ended;
                info!("player defeated");
                out_events.push(Event::PlayerDefeated);
                return;
            }
        }
    }

    fn follow_camera(&mut self) {
        let focus = self.player.position + Vec2::splat(self.tile_length / 2.0);
        self.viewport = Viewport::follow(focus, self.config.view_size, self.map_size());

        let tile_size = Vec2::splat(self.tile_length);
        let visible = self
            .registry
            .tiles()
            .iter()
            .filter(|tile| !tile.destroyed())
            .filter(|tile| {
                self.viewport
                    .intersects(&Aabb::new(tile.position().to_world(self.tile_length), tile_size))
            })
            .count();
        self.counters.tiles_in_view = u32::try_from(visible).unwrap_or(u32::MAX);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadMap { layout } => {
            if let Err(reason) = layout.validate() {
                warn!(%reason, "map rejected");
                out_events.push(Event::MapRejected { reason });
                return;
            }

            world.grid = layout.grid();
            world.tile_length = layout.tile_length;

            let mut registry = ColliderRegistry::from_layout(&layout);
            let player_collider = registry.register(
                ColliderKind::Player,
                Vec2::ZERO,
                Vec2::splat(world.tile_length),
            );
            world.player_projectile_slot = registry.register_slot(ColliderKind::Projectile);
            world.registry = registry;
            world.player = PlayerBody::new(player_collider, world.config.player_max_health);
            world.player_projectile = None;
            world.monsters.clear();
            world.next_monster_id = 0;
            world.status = GameStatus::Running;
            world.counters = DebugCounters::default();
            world.follow_camera();

            debug!(
                columns = layout.columns,
                rows = layout.rows,
                colliders = layout.colliders.len(),
                "map loaded"
            );
            out_events.push(Event::MapLoaded {
                columns: layout.columns,
                rows: layout.rows,
            });
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            if world.status == GameStatus::Ended {
                return;
            }

            let seconds = dt.as_secs_f32();
            world.step_player_projectile(seconds, out_events);
            let blocked = world.resolve_player_collisions(out_events);
            world.step_player(seconds, blocked, out_events);
            world.resolve_projectile_hits(out_events);
            world.step_monsters(seconds, out_events);
            world.step_monster_projectiles(seconds, out_events);
            world.follow_camera();
        }
        Command::SpawnPlayer { tile } => {
            if !world.grid.contains(tile) {
                warn!(?tile, "player spawn outside the grid ignored");
                return;
            }

            world.player.place(tile, world.tile_length);
            world
                .registry
                .set_position(world.player.collider, world.player.position);
            world.follow_camera();
            out_events.push(Event::PlayerSpawned { tile });
        }
        Command::SpawnMonster { tile } => {
            if !world.grid.contains(tile) {
                warn!(?tile, "monster spawn outside the grid ignored");
                return;
            }

            let id = MonsterId::new(world.next_monster_id);
            world.next_monster_id = world.next_monster_id.saturating_add(1);
            let collider = world.registry.register(
                ColliderKind::Monster,
                tile.to_world(world.tile_length),
                Vec2::splat(world.tile_length),
            );
            let projectile_collider = world.registry.register_slot(ColliderKind::Projectile);
            world.monsters.push(Monster::new(
                id,
                tile,
                world.config.monster_max_health,
                collider,
                projectile_collider,
            ));
            out_events.push(Event::MonsterSpawned { monster: id, tile });
        }
        Command::MovePlayer { direction } => {
            if world.status == GameStatus::Ended || !world.player.spawned {
                return;
            }

            let destination = TileCoord::from_world(world.player.position, world.tile_length)
                .step(direction);
            if world.player.walk.is_none() && !world.grid.contains(destination) {
                out_events.push(Event::PlayerStepBlocked {
                    target: destination,
                });
                return;
            }

            if let Some((from, to)) = world.player.begin_step(direction, world.tile_length) {
                world
                    .registry
                    .set_position(world.player.collider, world.player.position);
                out_events.push(Event::PlayerStepStarted {
                    from,
                    to,
                    direction,
                });
            }
        }
        Command::FirePlayerProjectile => {
            if world.status == GameStatus::Ended
                || !world.player.spawned
                || world.player_projectile.is_some()
            {
                return;
            }

            let origin = world.player.position + Vec2::splat(world.tile_length / 2.0);
            let projectile = Projectile {
                owner: ProjectileOwner::Player,
                start: origin,
                position: origin,
                size: world.config.projectile_size,
                velocity: world.player.facing.direction.unit() * 2.0 * world.config.speed,
                collider: world.player_projectile_slot,
            };
            world
                .registry
                .activate(projectile.collider, projectile.bounds());
            world.player_projectile = Some(projectile);
            out_events.push(Event::ProjectileFired {
                owner: ProjectileOwner::Player,
                origin,
            });
        }
        Command::FireMonsterProjectile { monster, target } => {
            if world.status == GameStatus::Ended {
                return;
            }
            let alive = world
                .monsters
                .iter()
                .find(|candidate| candidate.id == monster)
                .is_some_and(|candidate| world.is_alive(candidate));
            if !alive {
                return;
            }

            let tile_length = world.tile_length;
            let size = world.config.projectile_size;
            let speed = world.config.speed;
            let Some(shooter) = world.monster_mut(monster) else {
                return;
            };
            if shooter.projectile.is_some() {
                return;
            }

            let origin = shooter.position * tile_length + Vec2::splat(tile_length / 2.0);
            let heading = (target - origin).normalize_or_zero();
            if heading == Vec2::ZERO {
                return;
            }

            let projectile = Projectile {
                owner: ProjectileOwner::Monster(monster),
                start: origin,
                position: origin,
                size,
                velocity: heading * 2.0 * speed,
                collider: shooter.projectile_collider,
            };
            shooter.projectile = Some(projectile);
            world
                .registry
                .activate(projectile.collider, projectile.bounds());
            out_events.push(Event::ProjectileFired {
                owner: projectile.owner,
                origin,
            });
        }
        Command::SetMonsterPath {
            monster,
            goal,
            path,
        } => {
            let grid = world.grid;
            if !path.iter().all(|tile| grid.contains(*tile)) {
                warn!(monster = monster.get(), "path leaving the grid ignored");
                return;
            }
            let alive = world
                .monsters
                .iter()
                .find(|candidate| candidate.id == monster)
                .is_some_and(|candidate| world.is_alive(candidate));
            if !alive {
                return;
            }
            let Some(target) = world.monster_mut(monster) else {
                return;
            };

            let length = path.len();
            target.path = VecDeque::from(path);
            target.goal = (length > 0).then_some(goal);
            out_events.push(Event::MonsterPathAssigned {
                monster,
                goal,
                length,
            });
        }
        Command::RequestPlayerRespawn => {
            out_events.push(Event::PlayerRespawnRequested);
        }
        Command::ResetDestruction => {
            let restored = world.registry.reset();
            let health = world.config.monster_max_health;
            for monster in &mut world.monsters {
                monster.health = health;
            }
            debug!(restored, "destruction reset");
            out_events.push(Event::DestructionReset { restored });
        }
        Command::SetDebugOverlay { enabled } => {
            world.debug_overlay = enabled;
            out_events.push(Event::DebugOverlayChanged { enabled });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use jinri_core::{
        ColliderView, DebugCounters, GameStatus, Grid, MonsterSnapshot, MonsterView,
        PlayerSnapshot, ProjectileSnapshot, SimulationConfig, TileCoord,
    };

    use super::{Projectile, Tile, Viewport, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Simulation constants the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Dimensions of the loaded map.
    #[must_use]
    pub fn grid(world: &World) -> Grid {
        world.grid
    }

    /// Side length of a tile in world units.
    #[must_use]
    pub fn tile_length(world: &World) -> f32 {
        world.tile_length
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures the player's position, facing and health.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        let player = &world.player;
        PlayerSnapshot {
            position: player.position,
            target: player.target,
            target_tile: player.target_tile(world.tile_length),
            facing: player.facing,
            walking_x: player.walking_x(),
            walking_y: player.walking_y(),
            health: player.health,
            spawned: player.spawned,
        }
    }

    /// Captures a read-only view of every monster, alive or not.
    #[must_use]
    pub fn monster_view(world: &World) -> MonsterView {
        let snapshots = world
            .monsters
            .iter()
            .map(|monster| MonsterSnapshot {
                id: monster.id,
                position: monster.position,
                anchor: monster.anchor,
                health: monster.health,
                alive: world.is_alive(monster),
                path: monster.path.iter().copied().collect(),
                goal: monster.goal,
                projectile_live: monster.projectile.is_some(),
                collider: monster.collider,
            })
            .collect();
        MonsterView::from_snapshots(snapshots)
    }

    /// Captures every collider in registry order.
    #[must_use]
    pub fn collider_view(world: &World) -> ColliderView {
        ColliderView::from_snapshots(world.registry.snapshots())
    }

    /// Live projectiles; the player's comes first when present.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .player_projectile
            .iter()
            .chain(world.monsters.iter().filter_map(|monster| monster.projectile.as_ref()))
            .map(Projectile::snapshot)
            .collect()
    }

    /// Tiles installed by the last map load, in layout order.
    #[must_use]
    pub fn tiles(world: &World) -> &[Tile] {
        world.registry.tiles()
    }

    /// Whether any tile stacked at the provided position is destroyed.
    ///
    /// Returns `None` when no tile was installed there.
    #[must_use]
    pub fn tile_destroyed_at(world: &World, tile: TileCoord) -> Option<bool> {
        world
            .registry
            .tiles()
            .iter()
            .filter(|candidate| candidate.position() == tile)
            .fold(None, |destroyed, candidate| {
                Some(destroyed.unwrap_or(false) || candidate.destroyed())
            })
    }

    /// Camera rectangle following the player.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.viewport
    }

    /// Whether the game is still running.
    #[must_use]
    pub fn status(world: &World) -> GameStatus {
        world.status
    }

    /// Whether the debug overlay is enabled.
    #[must_use]
    pub fn debug_overlay(world: &World) -> bool {
        world.debug_overlay
    }

    /// Counters shown by the debug overlay.
    #[must_use]
    pub fn debug_counters(world: &World) -> DebugCounters {
        world.counters
    }
}

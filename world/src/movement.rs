//! Tile-step movement controllers for the player and monsters.

use std::collections::VecDeque;

use glam::Vec2;
use jinri_core::{ColliderId, Direction, Facing, MonsterId, TileCoord};

use crate::projectiles::Projectile;

/// Player walking state machine.
///
/// `walk` names the single active axis, so both axes can never be in motion at
/// once.
#[derive(Clone, Debug)]
pub(crate) struct PlayerBody {
    pub(crate) position: Vec2,
    pub(crate) target: Vec2,
    pub(crate) walk: Option<Direction>,
    pub(crate) facing: Facing,
    pub(crate) health: i32,
    pub(crate) spawned: bool,
    pub(crate) collider: ColliderId,
}

impl PlayerBody {
    pub(crate) fn new(collider: ColliderId, health: i32) -> Self {
        Self {
            position: Vec2::ZERO,
            target: Vec2::ZERO,
            walk: None,
            facing: Facing::default(),
            health,
            spawned: false,
            collider,
        }
    }

    pub(crate) fn place(&mut self, tile: TileCoord, tile_length: f32) {
        self.position = tile.to_world(tile_length);
        self.target = self.position;
        self.walk = None;
        self.facing.walking = false;
        self.spawned = true;
    }

    pub(crate) fn walking_x(&self) -> bool {
        self.walk.is_some_and(Direction::is_horizontal)
    }

    pub(crate) fn walking_y(&self) -> bool {
        self.walk.is_some_and(|direction| !direction.is_horizontal())
    }

    pub(crate) fn target_tile(&self, tile_length: f32) -> TileCoord {
        TileCoord::from_world(self.target, tile_length)
    }

    /// Starts a one-tile walk unless an axis is already active.
    ///
    /// The idle axis snaps onto the nearest tile first, so a step cancelled
    /// halfway never leaves the next target between two tiles. Returns the
    /// tile left and the tile targeted.
    pub(crate) fn begin_step(
        &mut self,
        direction: Direction,
        tile_length: f32,
    ) -> Option<(TileCoord, TileCoord)> {
        if self.walk.is_some() {
            return None;
        }

        let from = TileCoord::from_world(self.position, tile_length);
        let to = from.step(direction);
        let origin = from.to_world(tile_length);
        let destination = to.to_world(tile_length);
        if direction.is_horizontal() {
            self.position.y = origin.y;
            self.target = Vec2::new(destination.x, origin.y);
        } else {
            self.position.x = origin.x;
            self.target = Vec2::new(origin.x, destination.y);
        }
        self.walk = Some(direction);
        self.facing = Facing::idle(direction);
        Some((from, to))
    }

    /// Abandons the current step; the target collapses onto the position.
    pub(crate) fn cancel(&mut self) {
        self.walk = None;
        self.target = self.position;
        self.facing.walking = false;
    }

    /// Moves along the active axis. Returns `true` when the step completed.
    pub(crate) fn advance(&mut self, distance: f32, arrival_epsilon: f32, tile_length: f32) -> bool {
        let Some(direction) = self.walk else {
            return false;
        };

        self.position += direction.unit() * distance;
        self.facing = Facing::walking(direction);

        let (position, target) = if direction.is_horizontal() {
            (self.position.x, self.target.x)
        } else {
            (self.position.y, self.target.y)
        };
        let remaining = target - position;
        let heading = if direction.is_horizontal() {
            direction.unit().x
        } else {
            direction.unit().y
        };
        let overshot = remaining * heading < 0.0;

        if remaining.abs() < arrival_epsilon || remaining.abs() > tile_length || overshot {
            if direction.is_horizontal() {
                self.position.x = self.target.x;
            } else {
                self.position.y = self.target.y;
            }
            self.walk = None;
            self.facing = Facing::idle(direction);
            return true;
        }

        false
    }
}

/// Path-driven monster. Positions are expressed in tile units.
#[derive(Clone, Debug)]
pub(crate) struct Monster {
    pub(crate) id: MonsterId,
    pub(crate) position: Vec2,
    pub(crate) previous: Vec2,
    pub(crate) anchor: TileCoord,
    pub(crate) health: i32,
    pub(crate) path: VecDeque<TileCoord>,
    pub(crate) goal: Option<TileCoord>,
    pub(crate) collider: ColliderId,
    pub(crate) projectile: Option<Projectile>,
    pub(crate) projectile_collider: ColliderId,
}

impl Monster {
    pub(crate) fn new(
        id: MonsterId,
        tile: TileCoord,
        health: i32,
        collider: ColliderId,
        projectile_collider: ColliderId,
    ) -> Self {
        let position = tile.to_tile_units();
        Self {
            id,
            position,
            previous: position,
            anchor: tile,
            health,
            path: VecDeque::new(),
            goal: None,
            collider,
            projectile: None,
            projectile_collider,
        }
    }

    pub(crate) fn clear_path(&mut self) {
        self.path.clear();
        self.goal = None;
    }

    /// Moves toward the head of the path, one axis at a time.
    ///
    /// X moves when only X differs, otherwise Y moves. A waypoint is popped
    /// once both axes sit on it; the returned tile is the waypoint consumed.
    pub(crate) fn advance_along_path(&mut self, step: f32, epsilon: f32) -> Option<TileCoord> {
        let next = self.path.front().copied()?;
        self.previous = self.position;

        let waypoint = next.to_tile_units();
        let delta = waypoint - self.position;
        if delta.x != 0.0 && delta.y == 0.0 {
            self.position.x = approach(self.position.x, waypoint.x, step, epsilon);
        } else if delta.y != 0.0 {
            self.position.y = approach(self.position.y, waypoint.y, step, epsilon);
        }

        if self.position != waypoint {
            return None;
        }

        let _ = self.path.pop_front();
        self.anchor = next;
        if self.path.is_empty() {
            self.goal = None;
        }
        Some(next)
    }
}

fn approach(current: f32, target: f32, step: f32, epsilon: f32) -> f32 {
    let remaining = target - current;
    if remaining.abs() <= step || (remaining.abs() - step).abs() < epsilon {
        return target;
    }

    current + step * remaining.signum()
}

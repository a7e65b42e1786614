//! Axis-aligned overlap tests and the player collision resolver.

use glam::Vec2;
use jinri_core::{ColliderId, ColliderKind, DespawnReason, Event, ProjectileOwner};
use tracing::debug;

use crate::registry::ColliderRegistry;

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Upper-left corner.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
}

impl Aabb {
    /// Creates a rectangle from its upper-left corner and extent.
    #[must_use]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }
}

/// Reports whether two colliders sit on exactly the same position.
#[must_use]
pub fn tiles_coincide(a: &Aabb, b: &Aabb) -> bool {
    a.position == b.position
}

/// Open-interval rectangle overlap; touching edges do not overlap.
#[must_use]
pub fn rects_overlap(a: &Aabb, b: &Aabb) -> bool {
    a.position.x + a.size.x > b.position.x
        && a.position.x < b.position.x + b.size.x
        && a.position.y + a.size.y > b.position.y
        && a.position.y < b.position.y + b.size.y
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CollisionReport {
    pub(crate) blocked: bool,
    pub(crate) possible_collidables: u32,
    pub(crate) projectile_consumed: bool,
}

/// Walks the registry once, destroying terrain hit by the player projectile
/// and deciding whether the player's target tile is blocked.
///
/// The walk stops at the first blocking collider, so terrain later in the
/// registry is only tested against the projectile on the next call.
pub(crate) fn check_collisions(
    registry: &mut ColliderRegistry,
    player: &Aabb,
    projectile: Option<&Aabb>,
    tile_length: f32,
    out_events: &mut Vec<Event>,
) -> CollisionReport {
    let mut report = CollisionReport::default();
    let mut projectile = projectile.copied();

    for index in 0..registry.len() {
        let id = ColliderId::new(u32::try_from(index).unwrap_or(u32::MAX));
        let Some(collider) = registry.get(id) else {
            continue;
        };
        let kind = collider.kind();
        let bounds = collider.bounds();

        if let Some(shot) = projectile {
            if kind == ColliderKind::Terrain && rects_overlap(&shot, &bounds) {
                if registry.mark_destroyed(id) {
                    if let Some(tile) = registry.tile_position(id) {
                        debug!(collider = id.get(), ?tile, "terrain destroyed");
                        out_events.push(Event::TerrainDestroyed { collider: id, tile });
                    }
                }
                projectile = None;
                report.projectile_consumed = true;
                out_events.push(Event::ProjectileDespawned {
                    owner: ProjectileOwner::Player,
                    reason: DespawnReason::Hit,
                });
                continue;
            }
        }

        if matches!(
            kind,
            ColliderKind::Inert | ColliderKind::Player | ColliderKind::Projectile
        ) {
            continue;
        }

        if (bounds.position.y - player.position.y).abs() > tile_length
            || (bounds.position.x - player.position.x).abs() > tile_length
        {
            continue;
        }

        match kind {
            ColliderKind::Terrain | ColliderKind::Collectable if tiles_coincide(player, &bounds) => {
                report.blocked = true;
                return report;
            }
            ColliderKind::Monster if rects_overlap(player, &bounds) => {
                report.blocked = true;
                return report;
            }
            _ => {}
        }

        report.possible_collidables += 1;
    }

    report
}

//! Straight-line projectiles and the camera viewport that bounds them.

use glam::Vec2;
use jinri_core::{ColliderId, ProjectileOwner, ProjectileSnapshot};

use crate::collision::{rects_overlap, Aabb};

/// Live projectile. At most one exists per owner.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) owner: ProjectileOwner,
    pub(crate) start: Vec2,
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) collider: ColliderId,
}

impl Projectile {
    pub(crate) fn advance(&mut self, seconds: f32) {
        self.position += self.velocity * seconds;
    }

    pub(crate) const fn bounds(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.position + self.size / 2.0
    }

    /// Whether the projectile travelled further than `range` on either axis.
    pub(crate) fn exceeded_range(&self, range: f32) -> bool {
        let travelled = (self.position - self.start).abs();
        travelled.x > range || travelled.y > range
    }

    pub(crate) const fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            owner: self.owner,
            start: self.start,
            position: self.position,
            size: self.size,
            velocity: self.velocity,
        }
    }
}

/// Camera rectangle in world units, clamped to the map.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    origin: Vec2,
    size: Vec2,
}

impl Viewport {
    /// Centres a viewport of `size` on `focus` without leaving the map.
    #[must_use]
    pub fn follow(focus: Vec2, size: Vec2, map_size: Vec2) -> Self {
        let limit = (map_size - size).max(Vec2::ZERO);
        let origin = (focus - size / 2.0).clamp(Vec2::ZERO, limit);
        Self { origin, size }
    }

    /// Upper-left corner of the viewport.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Extent of the viewport.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Whether a point lies inside the viewport, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let end = self.origin + self.size;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x <= end.x && point.y <= end.y
    }

    /// Whether a rectangle intersects the viewport.
    #[must_use]
    pub fn intersects(&self, bounds: &Aabb) -> bool {
        rects_overlap(&Aabb::new(self.origin, self.size), bounds)
    }
}

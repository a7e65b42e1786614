//! Arena that owns every collider and the tiles they represent.
//!
//! Colliders are never removed. Destruction is a tag transition to
//! [`ColliderKind::Inert`], which keeps every [`ColliderId`] stable for the
//! lifetime of the map.

use glam::Vec2;
use jinri_core::{ColliderId, ColliderKind, ColliderSnapshot, MapLayout, TileCoord, TileId};

use crate::collision::Aabb;

/// Tile installed from the map layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    position: TileCoord,
    sheet_offset: [u32; 2],
    destroyed: bool,
}

impl Tile {
    /// Grid position of the tile.
    #[must_use]
    pub const fn position(&self) -> TileCoord {
        self.position
    }

    /// Opaque sprite-sheet offset supplied by the loader.
    #[must_use]
    pub const fn sheet_offset(&self) -> [u32; 2] {
        self.sheet_offset
    }

    /// Whether a projectile destroyed the tile's collider.
    #[must_use]
    pub const fn destroyed(&self) -> bool {
        self.destroyed
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Collider {
    kind: ColliderKind,
    home_kind: ColliderKind,
    position: Vec2,
    size: Vec2,
    tile: Option<TileId>,
}

impl Collider {
    pub(crate) const fn kind(&self) -> ColliderKind {
        self.kind
    }

    pub(crate) const fn bounds(&self) -> Aabb {
        Aabb::new(self.position, self.size)
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct ColliderRegistry {
    colliders: Vec<Collider>,
    tiles: Vec<Tile>,
}

impl ColliderRegistry {
    /// Installs tiles and colliders in layout order. The layout must be valid.
    pub(crate) fn from_layout(layout: &MapLayout) -> Self {
        let tiles = layout
            .tiles
            .iter()
            .map(|spec| Tile {
                position: spec.position,
                sheet_offset: spec.sheet_offset,
                destroyed: false,
            })
            .collect();
        let colliders = layout
            .colliders
            .iter()
            .map(|spec| Collider {
                kind: spec.kind,
                home_kind: spec.kind,
                position: spec.position,
                size: spec.size,
                tile: spec.tile,
            })
            .collect();
        Self { colliders, tiles }
    }

    /// Appends an active collider and returns its identifier.
    pub(crate) fn register(&mut self, kind: ColliderKind, position: Vec2, size: Vec2) -> ColliderId {
        self.push(Collider {
            kind,
            home_kind: kind,
            position,
            size,
            tile: None,
        })
    }

    /// Appends a collider slot that starts inert and is activated on demand.
    pub(crate) fn register_slot(&mut self, home_kind: ColliderKind) -> ColliderId {
        self.push(Collider {
            kind: ColliderKind::Inert,
            home_kind,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            tile: None,
        })
    }

    fn push(&mut self, collider: Collider) -> ColliderId {
        let id = ColliderId::new(u32::try_from(self.colliders.len()).unwrap_or(u32::MAX));
        self.colliders.push(collider);
        id
    }

    pub(crate) fn len(&self) -> usize {
        self.colliders.len()
    }

    pub(crate) fn get(&self, id: ColliderId) -> Option<&Collider> {
        let index = usize::try_from(id.get()).ok()?;
        self.colliders.get(index)
    }

    fn get_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        let index = usize::try_from(id.get()).ok()?;
        self.colliders.get_mut(index)
    }

    pub(crate) fn kind(&self, id: ColliderId) -> Option<ColliderKind> {
        self.get(id).map(Collider::kind)
    }

    pub(crate) fn set_position(&mut self, id: ColliderId, position: Vec2) {
        if let Some(collider) = self.get_mut(id) {
            collider.position = position;
        }
    }

    /// Brings a slot back to its home kind at the provided bounds.
    pub(crate) fn activate(&mut self, id: ColliderId, bounds: Aabb) {
        if let Some(collider) = self.get_mut(id) {
            collider.kind = collider.home_kind;
            collider.position = bounds.position;
            collider.size = bounds.size;
        }
    }

    /// Tags the collider inert and marks its tile destroyed.
    ///
    /// Returns `true` only on the transition, so repeated calls are no-ops.
    pub(crate) fn mark_destroyed(&mut self, id: ColliderId) -> bool {
        let Some(collider) = self.get_mut(id) else {
            return false;
        };
        if collider.kind.is_inert() {
            return false;
        }

        collider.kind = ColliderKind::Inert;
        let tile = collider.tile;
        if let Some(tile) = tile.and_then(|tile| self.tile_mut(tile)) {
            tile.destroyed = true;
        }
        true
    }

    /// Grid position of the tile a collider represents.
    pub(crate) fn tile_position(&self, id: ColliderId) -> Option<TileCoord> {
        let tile = self.get(id)?.tile?;
        let index = usize::try_from(tile.get()).ok()?;
        self.tiles.get(index).map(Tile::position)
    }

    /// Restores inert terrain, collectables and monsters to their home kind.
    ///
    /// Projectile slots stay inert. Returns the number of restored colliders.
    pub(crate) fn reset(&mut self) -> u32 {
        let mut restored = 0;
        for collider in &mut self.colliders {
            let revivable = matches!(
                collider.home_kind,
                ColliderKind::Terrain | ColliderKind::Collectable | ColliderKind::Monster
            );
            if !revivable || !collider.kind.is_inert() {
                continue;
            }

            collider.kind = collider.home_kind;
            restored += 1;
        }

        for tile in &mut self.tiles {
            tile.destroyed = false;
        }

        restored
    }

    pub(crate) fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn tile_mut(&mut self, tile: TileId) -> Option<&mut Tile> {
        let index = usize::try_from(tile.get()).ok()?;
        self.tiles.get_mut(index)
    }

    pub(crate) fn snapshots(&self) -> Vec<ColliderSnapshot> {
        self.colliders
            .iter()
            .enumerate()
            .map(|(index, collider)| ColliderSnapshot {
                id: ColliderId::new(u32::try_from(index).unwrap_or(u32::MAX)),
                kind: collider.kind,
                position: collider.position,
                size: collider.size,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> MapLayout {
        MapLayout::new(6, 6, 32.0)
            .with_terrain(TileCoord::new(1, 1))
            .with_collectable(TileCoord::new(2, 1))
    }

    #[test]
    fn mark_destroyed_is_idempotent() {
        let mut registry = ColliderRegistry::from_layout(&layout());
        let id = ColliderId::new(0);

        assert!(registry.mark_destroyed(id));
        assert!(!registry.mark_destroyed(id));
        assert_eq!(registry.kind(id), Some(ColliderKind::Inert));
        assert!(registry.tiles()[0].destroyed());
        assert!(!registry.tiles()[1].destroyed());
    }

    #[test]
    fn reset_restores_home_kinds_but_not_projectile_slots() {
        let mut registry = ColliderRegistry::from_layout(&layout());
        let monster = registry.register(ColliderKind::Monster, Vec2::ZERO, Vec2::splat(32.0));
        let slot = registry.register_slot(ColliderKind::Projectile);
        assert!(registry.mark_destroyed(ColliderId::new(1)));
        assert!(registry.mark_destroyed(monster));

        assert_eq!(registry.reset(), 2);
        assert_eq!(registry.kind(ColliderId::new(1)), Some(ColliderKind::Collectable));
        assert_eq!(registry.kind(monster), Some(ColliderKind::Monster));
        assert_eq!(registry.kind(slot), Some(ColliderKind::Inert));
        assert!(registry.tiles().iter().all(|tile| !tile.destroyed()));
    }

    #[test]
    fn slots_activate_with_home_kind() {
        let mut registry = ColliderRegistry::default();
        let slot = registry.register_slot(ColliderKind::Projectile);

        registry.activate(slot, Aabb::new(Vec2::new(4.0, 5.0), Vec2::splat(16.0)));

        assert_eq!(registry.kind(slot), Some(ColliderKind::Projectile));
        assert_eq!(registry.tile_position(slot), None);
        assert_eq!(registry.len(), 1);
    }
}

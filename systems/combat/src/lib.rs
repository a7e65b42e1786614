#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that decides when monsters fire at the player.

use glam::Vec2;
use jinri_core::{Command, Event, MonsterView, PlayerSnapshot, TileCoord};

/// Configuration parameters required to construct the combat system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    sensing_range: u32,
}

impl Config {
    /// Monsters fire when the player is within `sensing_range` tiles on both
    /// axes.
    #[must_use]
    pub const fn new(sensing_range: u32) -> Self {
        Self { sensing_range }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(15)
    }
}

/// Combat system that queues monster fire commands.
#[derive(Debug)]
pub struct MonsterCombat {
    sensing_range: u32,
    scratch: Vec<Command>,
}

impl MonsterCombat {
    /// Creates a new combat system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            sensing_range: config.sensing_range,
            scratch: Vec::new(),
        }
    }

    /// Emits `Command::FireMonsterProjectile` for every live monster that
    /// senses the player and has no projectile in flight.
    ///
    /// Projectiles are aimed at the player's centre at the moment of firing.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        monsters: &MonsterView,
        tile_length: f32,
        out: &mut Vec<Command>,
    ) {
        let ticked = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !ticked || !player.spawned || player.health <= 0 {
            return;
        }

        let player_tile = TileCoord::from_world(player.position, tile_length);
        let target = player.position + Vec2::splat(tile_length / 2.0);

        self.scratch.clear();
        for monster in monsters.iter() {
            if !monster.alive || monster.projectile_live {
                continue;
            }

            let monster_tile = TileCoord::from_world(monster.position, 1.0);
            if monster_tile.column().abs_diff(player_tile.column()) > self.sensing_range
                || monster_tile.row().abs_diff(player_tile.row()) > self.sensing_range
            {
                continue;
            }

            self.scratch.push(Command::FireMonsterProjectile {
                monster: monster.id,
                target,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

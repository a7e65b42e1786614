use std::time::Duration;

use jinri_core::{Command, Event, MapLayout, MonsterId, ProjectileOwner, TileCoord};
use jinri_system_combat::{Config, MonsterCombat};
use jinri_world::{self as world, query, World};

#[test]
fn monster_fire_hits_the_player_through_the_world() {
    let mut world = World::new();
    let mut events = Vec::new();
    for command in [
        Command::LoadMap {
            layout: MapLayout::new(12, 6, 32.0),
        },
        Command::SpawnPlayer {
            tile: TileCoord::new(1, 2),
        },
        Command::SpawnMonster {
            tile: TileCoord::new(6, 2),
        },
    ] {
        world::apply(&mut world, command, &mut events);
    }

    let mut combat = MonsterCombat::new(Config::default());
    let mut log = Vec::new();
    for _ in 0..20 {
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(50),
            },
            &mut events,
        );

        let mut commands = Vec::new();
        combat.handle(
            &events,
            &query::player(&world),
            &query::monster_view(&world),
            query::tile_length(&world),
            &mut commands,
        );
        for command in commands {
            world::apply(&mut world, command, &mut events);
        }
        log.extend(events);
    }

    let fired = log
        .iter()
        .filter(|event| {
            matches!(
                event,
                Event::ProjectileFired {
                    owner: ProjectileOwner::Monster(id),
                    ..
                } if *id == MonsterId::new(0)
            )
        })
        .count();
    assert!(fired >= 2, "expected repeated fire, got {fired}");
    assert!(log.contains(&Event::PlayerDamaged { health: 90 }));
    assert!(query::player(&world).health < 100);
}

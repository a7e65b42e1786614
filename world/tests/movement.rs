use std::time::Duration;

use glam::Vec2;
use jinri_core::{Command, Direction, Event, Facing, MapLayout, MonsterId, TileCoord};
use jinri_world::{self as world, query, World};

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);
    events
}

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    run(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

fn open_world(columns: u32, rows: u32) -> World {
    let mut world = World::new();
    let _ = run(
        &mut world,
        Command::LoadMap {
            layout: MapLayout::new(columns, rows, 32.0),
        },
    );
    world
}

#[test]
fn player_walks_one_tile_and_arrives() {
    let mut world = open_world(6, 6);
    let _ = run(
        &mut world,
        Command::SpawnPlayer {
            tile: TileCoord::new(1, 1),
        },
    );
    let _ = run(
        &mut world,
        Command::MovePlayer {
            direction: Direction::East,
        },
    );

    let mut arrived = false;
    for _ in 0..40 {
        let events = tick(&mut world, 16);
        let player = query::player(&world);
        assert!(!(player.walking_x && player.walking_y));
        if events.contains(&Event::PlayerArrived {
            tile: TileCoord::new(2, 1),
        }) {
            arrived = true;
            break;
        }
        assert_eq!(player.facing, Facing::walking(Direction::East));
    }

    assert!(arrived);
    let player = query::player(&world);
    assert_eq!(player.position, Vec2::new(64.0, 32.0));
    assert_eq!(player.facing, Facing::idle(Direction::East));
}

#[test]
fn moves_are_ignored_while_an_axis_is_active() {
    let mut world = open_world(6, 6);
    let _ = run(
        &mut world,
        Command::SpawnPlayer {
            tile: TileCoord::new(2, 2),
        },
    );
    let _ = run(
        &mut world,
        Command::MovePlayer {
            direction: Direction::North,
        },
    );

    let ignored = run(
        &mut world,
        Command::MovePlayer {
            direction: Direction::West,
        },
    );

    assert!(ignored.is_empty());
    let player = query::player(&world);
    assert!(player.walking_y);
    assert!(!player.walking_x);
    assert_eq!(player.target_tile, TileCoord::new(2, 1));
}

#[test]
fn monster_consumes_its_path_one_axis_at_a_time() {
    let mut world = open_world(8, 8);
    let _ = run(
        &mut world,
        Command::SpawnMonster {
            tile: TileCoord::new(1, 1),
        },
    );
    let monster = MonsterId::new(0);
    let assigned = run(
        &mut world,
        Command::SetMonsterPath {
            monster,
            goal: TileCoord::new(3, 3),
            path: vec![TileCoord::new(2, 1), TileCoord::new(2, 2), TileCoord::new(2, 3)],
        },
    );
    assert_eq!(
        assigned,
        vec![Event::MonsterPathAssigned {
            monster,
            goal: TileCoord::new(3, 3),
            length: 3,
        }]
    );

    let mut reached = Vec::new();
    for _ in 0..60 {
        for event in tick(&mut world, 50) {
            if let Event::MonsterWaypointReached { tile, .. } = event {
                reached.push(tile);
            }
        }
        let view = query::monster_view(&world);
        let Some(snapshot) = view.get(monster) else {
            panic!("monster missing from view");
        };
        let aligned_x = snapshot.position.x.fract() == 0.0;
        let aligned_y = snapshot.position.y.fract() == 0.0;
        assert!(aligned_x || aligned_y, "diagonal drift at {:?}", snapshot.position);
    }

    assert_eq!(
        reached,
        vec![TileCoord::new(2, 1), TileCoord::new(2, 2), TileCoord::new(2, 3)]
    );
    let view = query::monster_view(&world);
    let Some(snapshot) = view.get(monster) else {
        panic!("monster missing from view");
    };
    assert_eq!(snapshot.position, Vec2::new(2.0, 3.0));
    assert_eq!(snapshot.anchor, TileCoord::new(2, 3));
    assert!(snapshot.path.is_empty());
    assert_eq!(snapshot.goal, None);
}

#[test]
fn overlapping_monsters_are_pushed_back() {
    let mut world = open_world(8, 8);
    for column in [1, 3] {
        let _ = run(
            &mut world,
            Command::SpawnMonster {
                tile: TileCoord::new(column, 1),
            },
        );
    }
    let _ = run(
        &mut world,
        Command::SetMonsterPath {
            monster: MonsterId::new(0),
            goal: TileCoord::new(4, 1),
            path: vec![TileCoord::new(2, 1), TileCoord::new(3, 1)],
        },
    );

    let mut collided = false;
    for _ in 0..30 {
        let events = tick(&mut world, 100);
        if events.contains(&Event::MonstersCollided {
            first: MonsterId::new(0),
            second: MonsterId::new(1),
        }) {
            collided = true;
            break;
        }
    }

    assert!(collided);
    let view = query::monster_view(&world);
    let Some(mover) = view.get(MonsterId::new(0)) else {
        panic!("monster missing from view");
    };
    assert!(mover.path.is_empty());
    assert!(mover.position.x <= 2.0);
}

#[test]
fn camera_follows_the_player_within_the_map() {
    let mut world = open_world(64, 64);
    let _ = run(
        &mut world,
        Command::SpawnPlayer {
            tile: TileCoord::new(32, 32),
        },
    );

    let viewport = query::viewport(&world);

    assert_eq!(viewport.origin(), Vec2::new(1024.0 + 16.0 - 512.0, 1024.0 + 16.0 - 416.0));
    assert_eq!(viewport.size(), Vec2::new(1024.0, 832.0));
}
